//! Minute-resolution meeting times and ranges.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{MeetingError, MeetingResult};

/// Days covered by a range built without an explicit end.
pub const DEFAULT_RANGE_DAYS: i64 = 14;

/// A wall-clock time with minute resolution, in the store's timezone.
///
/// Ordering is lexicographic on (date, hour, minute), which is what the
/// busy-period index relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeetingTime {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl MeetingTime {
    pub fn new(date: NaiveDate, hour: u32, minute: u32) -> MeetingResult<Self> {
        let time = MeetingTime { date, hour, minute };
        if !time.is_valid() {
            return Err(MeetingError::InvalidTime(format!(
                "{} {:02}:{:02}",
                date, hour, minute
            )));
        }
        Ok(time)
    }

    /// Build from raw components, validating the calendar date as well.
    pub fn from_ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> MeetingResult<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            MeetingError::InvalidTime(format!("{:04}-{:02}-{:02} is not a date", year, month, day))
        })?;
        Self::new(date, hour, minute)
    }

    pub fn start_of_day(date: NaiveDate) -> Self {
        MeetingTime {
            date,
            hour: 0,
            minute: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.hour <= 23 && self.minute <= 59
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        self.date.and_hms_opt(self.hour, self.minute, 0)
    }

    /// Interpret this wall-clock time in `tz` and convert it to UTC.
    ///
    /// Ambiguous times pick the earlier instant; times inside a DST gap are
    /// pushed forward by an hour.
    pub fn to_utc(&self, tz: Tz) -> Option<DateTime<Utc>> {
        let naive = self.to_naive()?;
        tz.from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn from_utc(dt: DateTime<Utc>, tz: Tz) -> Self {
        Self::from_naive(dt.with_timezone(&tz).naive_local())
    }

    pub fn from_naive(naive: NaiveDateTime) -> Self {
        MeetingTime {
            date: naive.date(),
            hour: naive.hour(),
            minute: naive.minute(),
        }
    }
}

impl fmt::Display for MeetingTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {:02}:{:02}", self.date, self.hour, self.minute)
    }
}

/// An inclusive range of meeting times, as requested from a free/busy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingTimeRange {
    pub start: MeetingTime,
    pub end: MeetingTime,
}

impl MeetingTimeRange {
    pub fn new(start: MeetingTime, end: MeetingTime) -> MeetingResult<Self> {
        if start > end {
            return Err(MeetingError::InvalidTime(format!(
                "range start {} is after end {}",
                start, end
            )));
        }
        Ok(MeetingTimeRange { start, end })
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &MeetingTimeRange) -> MeetingTimeRange {
        MeetingTimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Parse CLI-style date arguments.
    /// - `from`: YYYY-MM-DD, defaults to today
    /// - `to`: YYYY-MM-DD (inclusive), defaults to `from` + DEFAULT_RANGE_DAYS
    pub fn from_args(from: Option<&str>, to: Option<&str>) -> Result<Self, String> {
        let from_date = match from {
            Some(s) => parse_date(s)?,
            None => Local::now().date_naive(),
        };

        let to_time = match to {
            Some(s) => MeetingTime {
                date: parse_date(s)?,
                hour: 23,
                minute: 59,
            },
            None => MeetingTime::start_of_day(from_date + Duration::days(DEFAULT_RANGE_DAYS)),
        };

        MeetingTimeRange::new(MeetingTime::start_of_day(from_date), to_time).map_err(|e| e.to_string())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}
