//! Collaborator seams used by the free/busy pipeline.
//!
//! Implementations are injected as `Arc<dyn Trait>`; the pipeline only ever
//! sees these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::MeetingResult;

/// A calendar service able to answer free/busy queries directly.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Free/busy objects (iCalendar text) for `users` between `start` and `end`.
    async fn get_free_busy(
        &self,
        users: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MeetingResult<Vec<String>>;
}

/// A contact record as far as free/busy lookup cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub emails: Vec<String>,
    pub fb_url: Option<String>,
}

impl Contact {
    pub fn has_email(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e.trim().eq_ignore_ascii_case(email.trim()))
    }
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Resolves once the book is open and queryable.
    async fn wait_loaded(&self) -> MeetingResult<()>;

    async fn query_email(&self, email: &str) -> MeetingResult<Vec<Contact>>;
}

/// Fetches the text behind a free/busy URL.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> MeetingResult<String>;
}
