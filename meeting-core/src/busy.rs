//! Busy periods reported by free/busy sources.

use serde::{Deserialize, Serialize};

use crate::time::MeetingTime;

/// Maximum byte length kept for extended free/busy text.
pub const XFB_MAX_LEN: usize = 32;

/// Kind of a busy period, in the order a time selector paints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FreeBusyType {
    Tentative,
    OutOfOffice,
    Busy,
    Free,
}

impl FreeBusyType {
    /// Map an iCalendar FBTYPE parameter value. Unknown types are ignored by callers.
    pub fn from_fbtype(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BUSY" => Some(FreeBusyType::Busy),
            "BUSY-UNAVAILABLE" => Some(FreeBusyType::OutOfOffice),
            "BUSY-TENTATIVE" => Some(FreeBusyType::Tentative),
            "FREE" => Some(FreeBusyType::Free),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FreeBusyType::Tentative => "Tentative",
            FreeBusyType::OutOfOffice => "Out of Office",
            FreeBusyType::Busy => "Busy",
            FreeBusyType::Free => "Free",
        }
    }
}

/// Extended free/busy text (X-SUMMARY / X-LOCATION) shown as a tooltip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyExtra {
    pub summary: Option<String>,
    pub location: Option<String>,
}

impl FreeBusyExtra {
    /// Build from raw server values. Returns None when neither field carries text.
    pub fn new(summary: Option<&str>, location: Option<&str>) -> Option<Self> {
        let extra = FreeBusyExtra {
            summary: summary.and_then(clean_xfb_text),
            location: location.and_then(clean_xfb_text),
        };
        if extra.summary.is_none() && extra.location.is_none() {
            return None;
        }
        Some(extra)
    }
}

fn clean_xfb_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() <= XFB_MAX_LEN {
        return Some(trimmed.to_string());
    }
    let mut cut = XFB_MAX_LEN;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    Some(trimmed[..cut].to_string())
}

/// A span during which an attendee is reported (un)available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyPeriod {
    pub start: MeetingTime,
    pub end: MeetingTime,
    pub busy_type: FreeBusyType,
    pub xfb: Option<FreeBusyExtra>,
}

impl BusyPeriod {
    /// Whole days between the start and end dates.
    pub fn length_in_days(&self) -> i64 {
        (self.end.date - self.start.date).num_days()
    }
}
