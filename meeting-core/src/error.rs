//! Error types for the meeting engine.

use thiserror::Error;

/// Errors that can occur in meeting operations.
#[derive(Error, Debug)]
pub enum MeetingError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid busy period: {0}")]
    InvalidBusyPeriod(String),

    #[error("Row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("Attendee '{0}' is already in the meeting")]
    DuplicateAttendee(String),

    #[error("Column '{0}' is not editable for this attendee")]
    NotEditable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Fetch timed out after {0}s")]
    FetchTimeout(u64),

    #[error("Unsupported free/busy URL: {0}")]
    UnsupportedUrl(String),

    #[error("Free/busy parse error: {0}")]
    Parse(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for meeting operations.
pub type MeetingResult<T> = Result<T, MeetingError>;
