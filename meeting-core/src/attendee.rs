//! Meeting attendee records.
//!
//! An attendee carries its iCalendar scheduling parameters plus the busy
//! periods fetched for it. Busy periods are appended unsorted by the
//! free/busy pipeline and sorted lazily on first read.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::busy::{BusyPeriod, FreeBusyExtra, FreeBusyType};
use crate::error::{MeetingError, MeetingResult};
use crate::time::MeetingTime;

/// Process-unique identity of an attendee record.
pub type AttendeeId = u64;

/// Handle returned by [`Attendee::on_changed`].
pub type ListenerId = u64;

type ChangeListener = Arc<dyn Fn(AttendeeId) + Send + Sync>;

static NEXT_ATTENDEE_ID: AtomicU64 = AtomicU64::new(1);

/// Calendar user type (CUTYPE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CuType {
    Individual,
    Group,
    Resource,
    Room,
    Unknown,
}

/// Participation role (ROLE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Chair,
    Required,
    Optional,
    NonParticipant,
    Unknown,
}

/// Participation status (PARTSTAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartStat {
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
    Completed,
    InProcess,
    Unknown,
}

/// Which fields an editor may change for this attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditLevel {
    #[default]
    Full,
    Status,
    None,
}

impl CuType {
    pub fn from_ics_str(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "INDIVIDUAL" => CuType::Individual,
            "GROUP" => CuType::Group,
            "RESOURCE" => CuType::Resource,
            "ROOM" => CuType::Room,
            _ => CuType::Unknown,
        }
    }

    pub fn as_ics_str(&self) -> &'static str {
        match self {
            CuType::Individual => "INDIVIDUAL",
            CuType::Group => "GROUP",
            CuType::Resource => "RESOURCE",
            CuType::Room => "ROOM",
            CuType::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CuType::Individual => "Individual",
            CuType::Group => "Group",
            CuType::Resource => "Resource",
            CuType::Room => "Room",
            CuType::Unknown => "Unknown",
        }
    }

    pub fn from_label(s: &str) -> Self {
        [CuType::Individual, CuType::Group, CuType::Resource, CuType::Room]
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(CuType::Unknown)
    }
}

impl Role {
    pub fn from_ics_str(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "CHAIR" => Role::Chair,
            "REQ-PARTICIPANT" => Role::Required,
            "OPT-PARTICIPANT" => Role::Optional,
            "NON-PARTICIPANT" => Role::NonParticipant,
            _ => Role::Unknown,
        }
    }

    pub fn as_ics_str(&self) -> &'static str {
        match self {
            Role::Chair => "CHAIR",
            Role::Required => "REQ-PARTICIPANT",
            Role::Optional => "OPT-PARTICIPANT",
            Role::NonParticipant => "NON-PARTICIPANT",
            Role::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Chair => "Chair",
            Role::Required => "Required Participant",
            Role::Optional => "Optional Participant",
            Role::NonParticipant => "Non-Participant",
            Role::Unknown => "Unknown",
        }
    }

    pub fn from_label(s: &str) -> Self {
        [Role::Chair, Role::Required, Role::Optional, Role::NonParticipant]
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(Role::Unknown)
    }
}

impl PartStat {
    const KNOWN: [PartStat; 7] = [
        PartStat::NeedsAction,
        PartStat::Accepted,
        PartStat::Declined,
        PartStat::Tentative,
        PartStat::Delegated,
        PartStat::Completed,
        PartStat::InProcess,
    ];

    pub fn from_ics_str(s: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|p| p.as_ics_str().eq_ignore_ascii_case(s))
            .unwrap_or(PartStat::Unknown)
    }

    pub fn as_ics_str(&self) -> &'static str {
        match self {
            PartStat::NeedsAction => "NEEDS-ACTION",
            PartStat::Accepted => "ACCEPTED",
            PartStat::Declined => "DECLINED",
            PartStat::Tentative => "TENTATIVE",
            PartStat::Delegated => "DELEGATED",
            PartStat::Completed => "COMPLETED",
            PartStat::InProcess => "IN-PROCESS",
            PartStat::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PartStat::NeedsAction => "Needs Action",
            PartStat::Accepted => "Accepted",
            PartStat::Declined => "Declined",
            PartStat::Tentative => "Tentative",
            PartStat::Delegated => "Delegated",
            PartStat::Completed => "Completed",
            PartStat::InProcess => "In Process",
            PartStat::Unknown => "Unknown",
        }
    }

    pub fn from_label(s: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(PartStat::Unknown)
    }
}

/// Strip a leading `mailto:` (any case) from a calendar address.
pub fn strip_mailto(address: &str) -> &str {
    match address.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &address[7..],
        _ => address,
    }
}

/// Key used to compare and index attendee addresses.
pub fn normalize_address(address: &str) -> String {
    strip_mailto(address.trim()).to_lowercase()
}

/// A meeting participant or resource.
pub struct Attendee {
    id: AttendeeId,

    // Identity
    address: String,
    member: String,
    cn: String,
    language: String,
    sent_by: String,
    delegated_to: String,
    delegated_from: String,
    fburi: String,

    // Scheduling
    cutype: CuType,
    role: Role,
    status: PartStat,
    rsvp: bool,
    edit_level: EditLevel,

    // Free/busy
    has_calendar_info: bool,
    busy_periods: Vec<BusyPeriod>,
    busy_periods_sorted: bool,
    periods_start: Option<MeetingTime>,
    periods_end: Option<MeetingTime>,
    longest_period_days: i64,
    start_busy_range: Option<MeetingTime>,
    end_busy_range: Option<MeetingTime>,

    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener_id: ListenerId,
}

macro_rules! string_field {
    ($get:ident, $set:ident, $field:ident) => {
        pub fn $get(&self) -> &str {
            &self.$field
        }

        pub fn $set(&mut self, value: impl Into<String>) {
            let value = value.into();
            if self.$field != value {
                self.$field = value;
                self.notify_changed();
            }
        }
    };
}

macro_rules! copy_field {
    ($get:ident, $set:ident, $field:ident, $ty:ty) => {
        pub fn $get(&self) -> $ty {
            self.$field
        }

        pub fn $set(&mut self, value: $ty) {
            if self.$field != value {
                self.$field = value;
                self.notify_changed();
            }
        }
    };
}

impl Attendee {
    /// A blank attendee: unset address, unknown type/role/status.
    pub fn new() -> Self {
        Attendee {
            id: NEXT_ATTENDEE_ID.fetch_add(1, Ordering::Relaxed),
            address: String::new(),
            member: String::new(),
            cn: String::new(),
            language: String::new(),
            sent_by: String::new(),
            delegated_to: String::new(),
            delegated_from: String::new(),
            fburi: String::new(),
            cutype: CuType::Unknown,
            role: Role::Unknown,
            status: PartStat::Unknown,
            rsvp: false,
            edit_level: EditLevel::Full,
            has_calendar_info: false,
            busy_periods: Vec::new(),
            busy_periods_sorted: true,
            periods_start: None,
            periods_end: None,
            longest_period_days: 0,
            start_busy_range: None,
            end_busy_range: None,
            listeners: Vec::new(),
            next_listener_id: 1,
        }
    }

    pub fn with_address(address: impl Into<String>) -> Self {
        let mut attendee = Attendee::new();
        attendee.address = address.into();
        attendee
    }

    /// The defaults an editor uses for a freshly added row.
    pub fn with_defaults() -> Self {
        let mut attendee = Attendee::new();
        attendee.cutype = CuType::Individual;
        attendee.role = Role::Required;
        attendee.rsvp = true;
        attendee.status = PartStat::NeedsAction;
        attendee.language = "en".to_string();
        attendee
    }

    pub fn id(&self) -> AttendeeId {
        self.id
    }

    // CHANGE NOTIFICATION:

    /// Register a listener invoked with this attendee's id after every change.
    pub fn on_changed(&mut self, listener: impl Fn(AttendeeId) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify_changed(&self) {
        for (_, listener) in &self.listeners {
            listener(self.id);
        }
    }

    // IDENTITY + SCHEDULING FIELDS:

    string_field!(address, set_address, address);
    string_field!(member, set_member, member);
    string_field!(cn, set_cn, cn);
    string_field!(language, set_language, language);
    string_field!(sent_by, set_sent_by, sent_by);
    string_field!(delegated_to, set_delegated_to, delegated_to);
    string_field!(delegated_from, set_delegated_from, delegated_from);
    string_field!(fburi, set_fburi, fburi);

    copy_field!(cutype, set_cutype, cutype, CuType);
    copy_field!(role, set_role, role, Role);
    copy_field!(status, set_status, status, PartStat);
    copy_field!(rsvp, set_rsvp, rsvp, bool);
    copy_field!(edit_level, set_edit_level, edit_level, EditLevel);
    copy_field!(has_calendar_info, set_has_calendar_info, has_calendar_info, bool);

    pub fn is_set_address(&self) -> bool {
        !strip_mailto(&self.address).trim().is_empty()
    }

    pub fn address_without_mailto(&self) -> &str {
        strip_mailto(&self.address)
    }

    /// Common name if set, otherwise the bare address.
    pub fn display_name(&self) -> &str {
        if self.cn.is_empty() {
            self.address_without_mailto()
        } else {
            &self.cn
        }
    }

    // BUSY PERIODS:

    /// Append a busy period. Fails without modifying the attendee when either
    /// time is out of range or `start > end`.
    pub fn add_busy_period(
        &mut self,
        start: MeetingTime,
        end: MeetingTime,
        busy_type: FreeBusyType,
        xfb: Option<FreeBusyExtra>,
    ) -> MeetingResult<()> {
        if !start.is_valid() {
            return Err(MeetingError::InvalidBusyPeriod(format!("invalid start {}", start)));
        }
        if !end.is_valid() {
            return Err(MeetingError::InvalidBusyPeriod(format!("invalid end {}", end)));
        }
        if start > end {
            return Err(MeetingError::InvalidBusyPeriod(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        let period = BusyPeriod {
            start,
            end,
            busy_type,
            xfb,
        };

        self.longest_period_days = self.longest_period_days.max(period.length_in_days());
        self.periods_start = Some(self.periods_start.map_or(start, |s| s.min(start)));
        self.periods_end = Some(self.periods_end.map_or(end, |e| e.max(end)));

        if self.busy_periods.last().is_some_and(|last| last.start > start) {
            self.busy_periods_sorted = false;
        }
        self.busy_periods.push(period);

        self.notify_changed();
        Ok(())
    }

    /// Busy periods ordered by start time.
    pub fn busy_periods(&mut self) -> &[BusyPeriod] {
        self.ensure_sorted();
        &self.busy_periods
    }

    pub fn busy_period_count(&self) -> usize {
        self.busy_periods.len()
    }

    fn ensure_sorted(&mut self) {
        if !self.busy_periods_sorted {
            self.busy_periods.sort_by(|a, b| a.start.cmp(&b.start));
            self.busy_periods_sorted = true;
        }
    }

    /// Index of the first period that could overlap `date`.
    ///
    /// Periods are sorted by start, but one starting up to
    /// `longest_period_days` earlier may still reach `date`, so the search
    /// starts from that lower bound.
    pub fn find_first_busy_period(&mut self, date: NaiveDate) -> Option<usize> {
        self.ensure_sorted();

        let periods = &self.busy_periods;
        if periods.is_empty() {
            return None;
        }

        let lower_bound = date
            .checked_sub_signed(Duration::days(self.longest_period_days))
            .unwrap_or(NaiveDate::MIN);

        let mut lower = 0;
        let mut upper = periods.len();
        let mut found = None;
        while lower < upper {
            let middle = (lower + upper) / 2;
            let start_date = periods[middle].start.date;
            if start_date == lower_bound {
                found = Some(middle);
                break;
            } else if lower_bound < start_date {
                upper = middle;
            } else {
                lower = middle + 1;
            }
        }

        match found {
            // Several periods may start that day; step back to the first.
            Some(mut middle) => {
                while middle > 0 && periods[middle - 1].start.date == lower_bound {
                    middle -= 1;
                }
                Some(middle)
            }
            None if lower < periods.len() => Some(lower),
            None => None,
        }
    }

    pub fn longest_period_days(&self) -> i64 {
        self.longest_period_days
    }

    /// Earliest start and latest end across all added periods.
    pub fn busy_periods_bounds(&self) -> Option<(MeetingTime, MeetingTime)> {
        Some((self.periods_start?, self.periods_end?))
    }

    pub fn clear_busy_periods(&mut self) {
        self.busy_periods.clear();
        self.busy_periods_sorted = true;
        self.periods_start = None;
        self.periods_end = None;
        self.longest_period_days = 0;
        self.start_busy_range = None;
        self.end_busy_range = None;
        self.notify_changed();
    }

    // QUERIED RANGE:

    /// Start of the range a free/busy source actually reported on.
    pub fn set_start_busy_range(&mut self, start: MeetingTime) -> MeetingResult<()> {
        if !start.is_valid() {
            return Err(MeetingError::InvalidTime(start.to_string()));
        }
        self.start_busy_range = Some(start);
        self.notify_changed();
        Ok(())
    }

    pub fn set_end_busy_range(&mut self, end: MeetingTime) -> MeetingResult<()> {
        if !end.is_valid() {
            return Err(MeetingError::InvalidTime(end.to_string()));
        }
        self.end_busy_range = Some(end);
        self.notify_changed();
        Ok(())
    }

    pub fn busy_range(&self) -> (Option<MeetingTime>, Option<MeetingTime>) {
        (self.start_busy_range, self.end_busy_range)
    }
}

impl Default for Attendee {
    fn default() -> Self {
        Attendee::new()
    }
}

impl fmt::Debug for Attendee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Attendee")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("cn", &self.cn)
            .field("cutype", &self.cutype)
            .field("role", &self.role)
            .field("status", &self.status)
            .field("busy_periods", &self.busy_periods.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn t(y: i32, m: u32, d: u32, h: u32, min: u32) -> MeetingTime {
        MeetingTime::from_ymd_hm(y, m, d, h, min).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_busy_period_accepts_valid_and_rejects_reversed() {
        let mut attendee = Attendee::with_address("mailto:a@example.com");

        attendee
            .add_busy_period(t(2024, 1, 10, 9, 0), t(2024, 1, 10, 10, 0), FreeBusyType::Busy, None)
            .unwrap();
        // Zero-length periods are allowed
        attendee
            .add_busy_period(t(2024, 1, 11, 9, 0), t(2024, 1, 11, 9, 0), FreeBusyType::Free, None)
            .unwrap();

        let result = attendee.add_busy_period(
            t(2024, 1, 12, 10, 0),
            t(2024, 1, 12, 9, 59),
            FreeBusyType::Busy,
            None,
        );
        assert!(matches!(result, Err(MeetingError::InvalidBusyPeriod(_))));
        assert_eq!(attendee.busy_periods().len(), 2);
        assert_eq!(
            attendee.busy_periods_bounds(),
            Some((t(2024, 1, 10, 9, 0), t(2024, 1, 11, 9, 0)))
        );
    }

    #[test]
    fn test_add_busy_period_rejects_invalid_components() {
        let mut attendee = Attendee::new();
        let bad_hour = MeetingTime {
            date: date(2024, 1, 10),
            hour: 24,
            minute: 0,
        };
        let bad_minute = MeetingTime {
            date: date(2024, 1, 10),
            hour: 9,
            minute: 60,
        };

        assert!(attendee
            .add_busy_period(bad_hour, t(2024, 1, 11, 0, 0), FreeBusyType::Busy, None)
            .is_err());
        assert!(attendee
            .add_busy_period(t(2024, 1, 9, 0, 0), bad_minute, FreeBusyType::Busy, None)
            .is_err());
        assert!(attendee.busy_periods().is_empty());
        assert_eq!(attendee.busy_periods_bounds(), None);
        assert_eq!(attendee.longest_period_days(), 0);
    }

    #[test]
    fn test_busy_periods_are_sorted_regardless_of_insertion_order() {
        let mut attendee = Attendee::new();
        for day in [20, 5, 12] {
            attendee
                .add_busy_period(
                    t(2024, 3, day, 8, 0),
                    t(2024, 3, day, 9, 0),
                    FreeBusyType::Busy,
                    None,
                )
                .unwrap();
        }

        let starts: Vec<u32> = attendee
            .busy_periods()
            .iter()
            .map(|p| chrono::Datelike::day(&p.start.date))
            .collect();
        assert_eq!(starts, vec![5, 12, 20]);
    }

    #[test]
    fn test_find_first_busy_period_single_day() {
        let mut attendee = Attendee::with_address("mailto:a@example.com");
        attendee
            .add_busy_period(t(2024, 1, 10, 9, 0), t(2024, 1, 10, 10, 0), FreeBusyType::Busy, None)
            .unwrap();

        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 10)), Some(0));
        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 1)), Some(0));
        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 11)), None);
    }

    #[test]
    fn test_find_first_busy_period_backtracks_to_first_on_same_day() {
        let mut attendee = Attendee::new();
        attendee
            .add_busy_period(t(2024, 1, 8, 9, 0), t(2024, 1, 8, 10, 0), FreeBusyType::Busy, None)
            .unwrap();
        for hour in [15, 9, 12, 11] {
            attendee
                .add_busy_period(
                    t(2024, 1, 10, hour, 0),
                    t(2024, 1, 10, hour, 30),
                    FreeBusyType::Tentative,
                    None,
                )
                .unwrap();
        }
        attendee
            .add_busy_period(t(2024, 1, 12, 9, 0), t(2024, 1, 12, 10, 0), FreeBusyType::Busy, None)
            .unwrap();

        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 10)), Some(1));
        assert_eq!(attendee.busy_periods()[1].start, t(2024, 1, 10, 9, 0));
        // No period starts on the 9th: next one is the first on the 10th
        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 9)), Some(1));
        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 12)), Some(5));
    }

    #[test]
    fn test_find_first_busy_period_accounts_for_long_periods() {
        let mut attendee = Attendee::new();
        // Three-day out-of-office block starting on the 1st
        attendee
            .add_busy_period(t(2024, 2, 1, 0, 0), t(2024, 2, 4, 0, 0), FreeBusyType::OutOfOffice, None)
            .unwrap();
        attendee
            .add_busy_period(t(2024, 2, 3, 9, 0), t(2024, 2, 3, 10, 0), FreeBusyType::Busy, None)
            .unwrap();

        assert_eq!(attendee.longest_period_days(), 3);
        // The block started before the 3rd but still overlaps it
        assert_eq!(attendee.find_first_busy_period(date(2024, 2, 3)), Some(0));
        assert_eq!(attendee.find_first_busy_period(date(2024, 2, 4)), Some(0));
        assert_eq!(attendee.find_first_busy_period(date(2024, 2, 5)), Some(1));
        assert_eq!(attendee.find_first_busy_period(date(2024, 2, 7)), None);
    }

    #[test]
    fn test_find_first_busy_period_at_earliest_date() {
        let mut attendee = Attendee::new();
        attendee
            .add_busy_period(t(2024, 1, 1, 9, 0), t(2024, 1, 10, 9, 0), FreeBusyType::Busy, None)
            .unwrap();

        assert_eq!(attendee.longest_period_days(), 9);
        assert_eq!(attendee.find_first_busy_period(NaiveDate::MIN), Some(0));
    }

    #[test]
    fn test_find_first_busy_period_empty() {
        let mut attendee = Attendee::new();
        assert_eq!(attendee.find_first_busy_period(date(2024, 1, 1)), None);
    }

    #[test]
    fn test_clear_busy_periods_resets_everything() {
        let mut attendee = Attendee::new();
        attendee
            .add_busy_period(t(2024, 1, 1, 0, 0), t(2024, 1, 5, 0, 0), FreeBusyType::Busy, None)
            .unwrap();
        attendee.set_start_busy_range(t(2024, 1, 1, 0, 0)).unwrap();
        attendee.set_end_busy_range(t(2024, 2, 1, 0, 0)).unwrap();

        attendee.clear_busy_periods();

        assert!(attendee.busy_periods().is_empty());
        assert_eq!(attendee.busy_periods_bounds(), None);
        assert_eq!(attendee.busy_range(), (None, None));
        assert_eq!(attendee.longest_period_days(), 0);
    }

    #[test]
    fn test_setters_notify_only_on_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut attendee = Attendee::new();
        let sink = seen.clone();
        let listener = attendee.on_changed(move |id| sink.lock().unwrap().push(id));

        attendee.set_cn("Alice");
        attendee.set_cn("Alice");
        attendee.set_role(Role::Chair);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(seen.lock().unwrap().iter().all(|id| *id == attendee.id()));

        assert!(attendee.remove_listener(listener));
        attendee.set_cn("Bob");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_label_and_ics_conversions() {
        assert_eq!(Role::from_label("required participant"), Role::Required);
        assert_eq!(Role::from_ics_str("OPT-PARTICIPANT"), Role::Optional);
        assert_eq!(CuType::from_label("Room"), CuType::Room);
        assert_eq!(CuType::from_label("Spaceship"), CuType::Unknown);
        assert_eq!(PartStat::from_ics_str("in-process"), PartStat::InProcess);
        assert_eq!(PartStat::from_label("Needs Action"), PartStat::NeedsAction);
        assert_eq!(PartStat::Declined.as_ics_str(), "DECLINED");
    }

    #[test]
    fn test_strip_mailto_and_normalize() {
        assert_eq!(strip_mailto("MAILTO:Foo@Bar.com"), "Foo@Bar.com");
        assert_eq!(strip_mailto("mailto:x@y"), "x@y");
        assert_eq!(strip_mailto("x@y"), "x@y");
        assert_eq!(normalize_address(" MailTo:Foo@Bar.COM"), "foo@bar.com");
        assert!(!Attendee::with_address("mailto:").is_set_address());
        assert!(!Attendee::new().is_set_address());
    }
}
