//! Attendee list and free/busy aggregation for meeting editors.
//!
//! - `store` holds the attendee list and exposes it through the `table` seam
//! - `refresh` fetches free/busy data per attendee through the `client` traits
//! - `ics` parses VFREEBUSY documents and existing attendee lists

pub mod attendee;
pub mod busy;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ics;
pub mod refresh;
pub mod store;
pub mod table;
pub mod time;

pub use attendee::{Attendee, AttendeeId, CuType, EditLevel, PartStat, Role};
pub use busy::{BusyPeriod, FreeBusyExtra, FreeBusyType};
pub use config::MeetingConfig;
pub use error::{MeetingError, MeetingResult};
pub use refresh::{FreeBusyRefresher, RefreshCallback, RefresherDeps};
pub use store::{AttendeeRef, MeetingStore};
pub use table::{Column, RowEvents, TableModel};
pub use time::{MeetingTime, MeetingTimeRange};
