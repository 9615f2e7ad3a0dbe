//! Toolkit-independent table model seam.
//!
//! A view reads cells through [`TableModel`] and is told about structural
//! changes through [`RowEvents`]. Deletions are announced before the row is
//! dropped so a view can still read it; insertions after the row exists.

use crate::error::MeetingResult;
use crate::store::AttendeeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Address,
    Member,
    Type,
    Role,
    Rsvp,
    DelegatedTo,
    DelegatedFrom,
    Status,
    CommonName,
    Language,
    /// Display name: common name when set, otherwise the address
    Attendee,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Address,
        Column::Member,
        Column::Type,
        Column::Role,
        Column::Rsvp,
        Column::DelegatedTo,
        Column::DelegatedFrom,
        Column::Status,
        Column::CommonName,
        Column::Language,
        Column::Attendee,
    ];

    pub fn index(&self) -> usize {
        Column::ALL.iter().position(|c| c == self).unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<Column> {
        Column::ALL.get(index).copied()
    }

    /// Value a new-row editor starts with.
    pub fn init_value(&self) -> &'static str {
        match self {
            Column::Type => "Individual",
            Column::Role => "Required Participant",
            Column::Rsvp => "Yes",
            Column::Status => "Needs Action",
            Column::Language => "en",
            _ => "",
        }
    }

    /// Whether `value` counts as blank for this column. Enumerated columns
    /// always hold a value.
    pub fn value_is_empty(&self, value: &str) -> bool {
        match self {
            Column::Address
            | Column::Member
            | Column::DelegatedTo
            | Column::DelegatedFrom
            | Column::CommonName => value.is_empty(),
            _ => false,
        }
    }
}

/// Row-level change notifications pushed to a view.
pub trait RowEvents: Send + Sync {
    fn row_inserted(&self, row: usize);
    fn row_changed(&self, row: usize);
    /// Called while the attendee is still in the list.
    fn row_deleted(&self, row: usize, attendee: &AttendeeRef);
}

/// Cell access for a flat list model.
pub trait TableModel {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize {
        Column::ALL.len()
    }

    fn value_at(&self, row: usize, col: Column) -> Option<String>;

    fn set_value_at(&self, row: usize, col: Column, value: &str) -> MeetingResult<()>;

    fn is_editable(&self, row: usize, col: Column) -> bool;

    fn init_value(&self, col: Column) -> &'static str {
        col.init_value()
    }

    fn value_is_empty(&self, col: Column, value: &str) -> bool {
        col.value_is_empty(value)
    }
}
