//! iCalendar input: free/busy documents and attendee lists (RFC 5545).

mod attendee;
mod freebusy;

pub use attendee::parse_attendees;
pub use freebusy::{FreeBusyComponent, parse_free_busy};
