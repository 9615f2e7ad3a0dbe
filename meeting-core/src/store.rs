//! The meeting's attendee list, exposed to a view as a [`TableModel`].
//!
//! Attendees are shared with the free/busy pipeline through [`AttendeeRef`].
//! The store watches each attendee's change signal; changed ids are queued
//! and turned into `row_changed` events by [`MeetingStore::flush_changes`],
//! which looks the row up afresh every time.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono_tz::Tz;
use tracing::debug;

use crate::attendee::{
    Attendee, AttendeeId, CuType, EditLevel, ListenerId, PartStat, Role, normalize_address, strip_mailto,
};
use crate::client::CalendarClient;
use crate::config::{MeetingConfig, ReminderUnits};
use crate::error::{MeetingError, MeetingResult};
use crate::ics::parse_attendees;
use crate::table::{Column, RowEvents, TableModel};

/// Shared handle to an attendee.
#[derive(Clone)]
pub struct AttendeeRef {
    id: AttendeeId,
    inner: Arc<Mutex<Attendee>>,
}

impl AttendeeRef {
    pub fn new(attendee: Attendee) -> Self {
        AttendeeRef {
            id: attendee.id(),
            inner: Arc::new(Mutex::new(attendee)),
        }
    }

    pub fn id(&self) -> AttendeeId {
        self.id
    }

    /// Lock the attendee. A poisoned lock still yields the data.
    pub fn lock(&self) -> MutexGuard<'_, Attendee> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn same(&self, other: &AttendeeRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AttendeeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&*self.lock(), f)
    }
}

struct Entry {
    attendee: AttendeeRef,
    listener: ListenerId,
}

pub struct MeetingStore {
    entries: Vec<Entry>,
    changed: Arc<Mutex<Vec<AttendeeId>>>,
    sinks: Vec<Arc<dyn RowEvents>>,

    client: Option<Arc<dyn CalendarClient>>,
    timezone: Tz,
    free_busy_template: Option<String>,
    default_reminder_interval: i32,
    default_reminder_units: ReminderUnits,
}

impl MeetingStore {
    pub fn new(timezone: Tz) -> Self {
        let defaults = MeetingConfig::default();
        MeetingStore {
            entries: Vec::new(),
            changed: Arc::new(Mutex::new(Vec::new())),
            sinks: Vec::new(),
            client: None,
            timezone,
            free_busy_template: defaults.free_busy_template,
            default_reminder_interval: defaults.default_reminder_interval,
            default_reminder_units: defaults.default_reminder_units,
        }
    }

    pub fn from_config(config: &MeetingConfig) -> MeetingResult<Self> {
        let mut store = MeetingStore::new(config.timezone()?);
        store.free_busy_template = config.free_busy_template.clone();
        store.default_reminder_interval = config.default_reminder_interval;
        store.default_reminder_units = config.default_reminder_units;
        Ok(store)
    }

    /// Register a view to receive row events.
    pub fn connect(&mut self, sink: Arc<dyn RowEvents>) {
        self.sinks.push(sink);
    }

    // PROPERTIES:

    pub fn client(&self) -> Option<Arc<dyn CalendarClient>> {
        self.client.clone()
    }

    pub fn set_client(&mut self, client: Option<Arc<dyn CalendarClient>>) {
        self.client = client;
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }

    pub fn free_busy_template(&self) -> Option<&str> {
        self.free_busy_template.as_deref()
    }

    pub fn set_free_busy_template(&mut self, template: Option<String>) {
        self.free_busy_template = template.filter(|t| !t.is_empty());
    }

    pub fn default_reminder_interval(&self) -> i32 {
        self.default_reminder_interval
    }

    pub fn set_default_reminder_interval(&mut self, interval: i32) {
        self.default_reminder_interval = interval;
    }

    pub fn default_reminder_units(&self) -> ReminderUnits {
        self.default_reminder_units
    }

    pub fn set_default_reminder_units(&mut self, units: ReminderUnits) {
        self.default_reminder_units = units;
    }

    // LIST OPERATIONS:

    /// Append an attendee. An attendee whose address is already present is
    /// rejected; attendees without an address are always accepted.
    pub fn add_attendee(&mut self, attendee: Attendee) -> MeetingResult<AttendeeRef> {
        if attendee.is_set_address() && self.find_attendee(attendee.address()).is_some() {
            return Err(MeetingError::DuplicateAttendee(
                attendee.address_without_mailto().to_string(),
            ));
        }

        Ok(self.insert(AttendeeRef::new(attendee)))
    }

    /// Append a blank attendee carrying the new-row defaults.
    pub fn add_with_defaults(&mut self) -> AttendeeRef {
        let attendee = AttendeeRef::new(Attendee::with_defaults());
        self.insert(attendee)
    }

    fn insert(&mut self, attendee: AttendeeRef) -> AttendeeRef {
        let changed = Arc::clone(&self.changed);
        let listener = attendee.lock().on_changed(move |id| {
            changed.lock().unwrap_or_else(PoisonError::into_inner).push(id);
        });
        self.entries.push(Entry {
            attendee: attendee.clone(),
            listener,
        });

        let row = self.entries.len() - 1;
        for sink in &self.sinks {
            sink.row_inserted(row);
        }
        attendee
    }

    /// Add the attendees of an existing event or task. Duplicates are skipped.
    /// Returns how many were added.
    pub fn add_from_ics(&mut self, content: &str) -> MeetingResult<usize> {
        let mut added = 0;
        for attendee in parse_attendees(content)? {
            match self.add_attendee(attendee) {
                Ok(_) => added += 1,
                Err(MeetingError::DuplicateAttendee(address)) => {
                    debug!(address, "Skipping duplicate attendee");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Remove an attendee. Views are told before the row disappears.
    pub fn remove_attendee(&mut self, attendee: &AttendeeRef) -> bool {
        let Some(row) = self.row_of(attendee.id()) else {
            return false;
        };

        for sink in &self.sinks {
            sink.row_deleted(row, &self.entries[row].attendee);
        }

        let entry = self.entries.remove(row);
        self.detach(&entry);
        true
    }

    pub fn remove_all(&mut self) {
        while let Some(row) = self.entries.len().checked_sub(1) {
            for sink in &self.sinks {
                sink.row_deleted(row, &self.entries[row].attendee);
            }
            let entry = self.entries.remove(row);
            self.detach(&entry);
        }
    }

    fn detach(&self, entry: &Entry) {
        entry.attendee.lock().remove_listener(entry.listener);
        let id = entry.attendee.id();
        self.pending_changes().retain(|changed| *changed != id);
    }

    /// Find an attendee by address, ignoring case and any `mailto:` prefix.
    pub fn find_attendee(&self, address: &str) -> Option<(usize, AttendeeRef)> {
        let wanted = normalize_address(address);
        if wanted.is_empty() {
            return None;
        }

        self.entries.iter().enumerate().find_map(|(row, entry)| {
            (normalize_address(entry.attendee.lock().address()) == wanted)
                .then(|| (row, entry.attendee.clone()))
        })
    }

    /// The first attendee matching one of the user's own addresses.
    pub fn find_self(&self, identities: &[String]) -> Option<(usize, AttendeeRef)> {
        identities.iter().find_map(|identity| self.find_attendee(identity))
    }

    pub fn attendee_at(&self, row: usize) -> Option<AttendeeRef> {
        self.entries.get(row).map(|e| e.attendee.clone())
    }

    pub fn attendees(&self) -> Vec<AttendeeRef> {
        self.entries.iter().map(|e| e.attendee.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn row_of(&self, id: AttendeeId) -> Option<usize> {
        self.entries.iter().position(|e| e.attendee.id() == id)
    }

    /// Mutate the attendee at `row` and report the change to views.
    pub fn update_attendee<R>(&self, row: usize, f: impl FnOnce(&mut Attendee) -> R) -> MeetingResult<R> {
        let attendee = self.attendee_at(row).ok_or(MeetingError::RowOutOfRange(row))?;
        let result = f(&mut *attendee.lock());
        self.flush_changes();
        Ok(result)
    }

    // CHANGE PROPAGATION:

    fn pending_changes(&self) -> MutexGuard<'_, Vec<AttendeeId>> {
        self.changed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit one `row_changed` per attendee changed since the last flush.
    /// Returns the number of rows reported.
    pub fn flush_changes(&self) -> usize {
        let ids = std::mem::take(&mut *self.pending_changes());

        let mut seen = Vec::with_capacity(ids.len());
        let mut reported = 0;
        for id in ids {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);

            // Attendees removed since the change are no longer rows.
            let Some(row) = self.row_of(id) else {
                continue;
            };
            for sink in &self.sinks {
                sink.row_changed(row);
            }
            reported += 1;
        }
        reported
    }
}

fn with_mailto(value: &str) -> String {
    format!("MAILTO:{}", strip_mailto(value.trim()))
}

fn rsvp_label(rsvp: bool) -> &'static str {
    if rsvp { "Yes" } else { "No" }
}

impl TableModel for MeetingStore {
    fn row_count(&self) -> usize {
        self.entries.len()
    }

    fn value_at(&self, row: usize, col: Column) -> Option<String> {
        let attendee = self.entries.get(row)?.attendee.lock();

        let value = match col {
            Column::Address => attendee.address_without_mailto().to_string(),
            Column::Member => strip_mailto(attendee.member()).to_string(),
            Column::Type => attendee.cutype().label().to_string(),
            Column::Role => attendee.role().label().to_string(),
            Column::Rsvp => rsvp_label(attendee.rsvp()).to_string(),
            Column::DelegatedTo => strip_mailto(attendee.delegated_to()).to_string(),
            Column::DelegatedFrom => strip_mailto(attendee.delegated_from()).to_string(),
            Column::Status => attendee.status().label().to_string(),
            Column::CommonName => attendee.cn().to_string(),
            Column::Language => attendee.language().to_string(),
            Column::Attendee => attendee.display_name().to_string(),
        };
        Some(value)
    }

    fn set_value_at(&self, row: usize, col: Column, value: &str) -> MeetingResult<()> {
        let attendee = self.attendee_at(row).ok_or(MeetingError::RowOutOfRange(row))?;
        if !self.is_editable(row, col) {
            return Err(MeetingError::NotEditable(format!("{:?}", col)));
        }

        if matches!(col, Column::Address | Column::Attendee) {
            if let Some((other, _)) = self.find_attendee(value) {
                if other != row {
                    return Err(MeetingError::DuplicateAttendee(
                        strip_mailto(value.trim()).to_string(),
                    ));
                }
            }
        }

        {
            let mut attendee = attendee.lock();
            match col {
                Column::Address | Column::Attendee => {
                    if strip_mailto(value.trim()).is_empty() {
                        debug!(row, "Ignoring empty address");
                    } else {
                        attendee.set_address(with_mailto(value));
                    }
                }
                Column::Member => attendee.set_member(value),
                Column::Type => {
                    let cutype = CuType::from_label(value);
                    attendee.set_cutype(cutype);
                    if cutype == CuType::Resource {
                        attendee.set_role(Role::NonParticipant);
                    }
                }
                Column::Role => attendee.set_role(Role::from_label(value)),
                Column::Rsvp => attendee.set_rsvp(value.trim().eq_ignore_ascii_case("yes")),
                Column::DelegatedTo => attendee.set_delegated_to(value),
                Column::DelegatedFrom => attendee.set_delegated_from(value),
                Column::Status => attendee.set_status(PartStat::from_label(value)),
                Column::CommonName => attendee.set_cn(value),
                Column::Language => attendee.set_language(value),
            }
        }

        self.flush_changes();
        Ok(())
    }

    fn is_editable(&self, row: usize, col: Column) -> bool {
        if matches!(col, Column::DelegatedTo | Column::DelegatedFrom) {
            return false;
        }

        // Rows past the end belong to the new-row editor.
        let Some(attendee) = self.attendee_at(row) else {
            return true;
        };

        match attendee.lock().edit_level() {
            EditLevel::Full => true,
            EditLevel::Status => col == Column::Status,
            EditLevel::None => false,
        }
    }
}

impl Drop for MeetingStore {
    fn drop(&mut self) {
        for entry in &self.entries {
            entry.attendee.lock().remove_listener(entry.listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Inserted(usize),
        Changed(usize),
        Deleted(usize, String),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl RowEvents for Recorder {
        fn row_inserted(&self, row: usize) {
            self.events.lock().unwrap().push(Event::Inserted(row));
        }

        fn row_changed(&self, row: usize) {
            self.events.lock().unwrap().push(Event::Changed(row));
        }

        fn row_deleted(&self, row: usize, attendee: &AttendeeRef) {
            let address = attendee.lock().address_without_mailto().to_string();
            self.events.lock().unwrap().push(Event::Deleted(row, address));
        }
    }

    fn store_with_recorder() -> (MeetingStore, Arc<Recorder>) {
        let mut store = MeetingStore::new(Tz::UTC);
        let recorder = Arc::new(Recorder::default());
        store.connect(recorder.clone());
        (store, recorder)
    }

    #[test]
    fn test_find_attendee_ignores_case_and_mailto() {
        let (mut store, _) = store_with_recorder();
        store.add_attendee(Attendee::with_address("mailto:other@bar.com")).unwrap();
        store.add_attendee(Attendee::with_address("MAILTO:Foo@Bar.com")).unwrap();

        let (row, attendee) = store.find_attendee("foo@bar.com").expect("Should find");
        assert_eq!(row, 1);
        assert_eq!(attendee.lock().address(), "MAILTO:Foo@Bar.com");

        assert!(store.find_attendee("mailto:FOO@bar.com").is_some());
        assert!(store.find_attendee("nobody@bar.com").is_none());
        assert!(store.find_attendee("").is_none());
    }

    #[test]
    fn test_add_emits_inserted_and_rejects_duplicates() {
        let (mut store, recorder) = store_with_recorder();
        store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        store.add_attendee(Attendee::new()).unwrap();
        store.add_attendee(Attendee::new()).unwrap();

        let dup = store.add_attendee(Attendee::with_address("A@Example.com"));
        assert!(matches!(dup, Err(MeetingError::DuplicateAttendee(_))));

        assert_eq!(store.count(), 3);
        assert_eq!(
            recorder.events(),
            vec![Event::Inserted(0), Event::Inserted(1), Event::Inserted(2)]
        );
    }

    #[test]
    fn test_add_with_defaults() {
        let (mut store, _) = store_with_recorder();
        store.add_with_defaults();

        assert_eq!(store.value_at(0, Column::Type).as_deref(), Some("Individual"));
        assert_eq!(store.value_at(0, Column::Role).as_deref(), Some("Required Participant"));
        assert_eq!(store.value_at(0, Column::Rsvp).as_deref(), Some("Yes"));
        assert_eq!(store.value_at(0, Column::Status).as_deref(), Some("Needs Action"));
        assert_eq!(store.value_at(0, Column::Language).as_deref(), Some("en"));
        for col in Column::ALL {
            assert_eq!(store.value_at(0, col).as_deref(), Some(col.init_value()), "{:?}", col);
        }
    }

    #[test]
    fn test_row_deleted_is_emitted_before_removal() {
        let (mut store, recorder) = store_with_recorder();
        let a = store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        let b = store.add_attendee(Attendee::with_address("mailto:b@example.com")).unwrap();
        store.add_attendee(Attendee::with_address("mailto:c@example.com")).unwrap();
        recorder.clear();

        assert!(store.remove_attendee(&b));
        assert!(!store.remove_attendee(&b));
        assert_eq!(recorder.events(), vec![Event::Deleted(1, "b@example.com".to_string())]);
        assert_eq!(store.row_of(a.id()), Some(0));
        assert_eq!(store.value_at(1, Column::Address).as_deref(), Some("c@example.com"));

        recorder.clear();
        store.remove_all();
        assert_eq!(
            recorder.events(),
            vec![
                Event::Deleted(1, "c@example.com".to_string()),
                Event::Deleted(0, "a@example.com".to_string()),
            ]
        );
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_attendee_changes_become_row_changed_at_current_row() {
        let (mut store, recorder) = store_with_recorder();
        let a = store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        let b = store.add_attendee(Attendee::with_address("mailto:b@example.com")).unwrap();
        recorder.clear();

        // Changes made directly on the shared handle, e.g. by the refresher
        b.lock().set_cn("Bob");
        b.lock().set_cn("Bobby");
        store.remove_attendee(&a);
        recorder.clear();

        assert_eq!(store.flush_changes(), 1);
        assert_eq!(recorder.events(), vec![Event::Changed(0)]);

        // Setting an equal value is not a change.
        b.lock().set_cn("Bobby");
        assert_eq!(store.flush_changes(), 0);
    }

    #[test]
    fn test_removed_attendee_no_longer_reports() {
        let (mut store, recorder) = store_with_recorder();
        let a = store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        store.remove_attendee(&a);
        recorder.clear();

        a.lock().set_cn("Still alive");
        assert_eq!(store.flush_changes(), 0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_update_attendee_flushes() {
        let (mut store, recorder) = store_with_recorder();
        store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        recorder.clear();

        store.update_attendee(0, |a| a.set_status(PartStat::Accepted)).unwrap();
        assert_eq!(recorder.events(), vec![Event::Changed(0)]);
        assert!(matches!(
            store.update_attendee(5, |_| ()),
            Err(MeetingError::RowOutOfRange(5))
        ));
    }

    #[test]
    fn test_set_value_at_address_and_type() {
        let (mut store, recorder) = store_with_recorder();
        store.add_with_defaults();
        recorder.clear();

        store.set_value_at(0, Column::Address, "carol@example.com").unwrap();
        let carol = store.attendee_at(0).unwrap();
        assert_eq!(carol.lock().address(), "MAILTO:carol@example.com");
        assert_eq!(store.value_at(0, Column::Address).as_deref(), Some("carol@example.com"));

        // Empty input leaves the address alone
        store.set_value_at(0, Column::Address, "  ").unwrap();
        assert_eq!(carol.lock().address(), "MAILTO:carol@example.com");

        store.set_value_at(0, Column::Type, "Resource").unwrap();
        assert_eq!(carol.lock().cutype(), CuType::Resource);
        assert_eq!(carol.lock().role(), Role::NonParticipant);

        store.set_value_at(0, Column::Status, "Accepted").unwrap();
        store.set_value_at(0, Column::Rsvp, "No").unwrap();
        store.set_value_at(0, Column::Role, "Something else").unwrap();
        assert_eq!(carol.lock().status(), PartStat::Accepted);
        assert!(!carol.lock().rsvp());
        assert_eq!(carol.lock().role(), Role::Unknown);

        assert!(recorder.events().iter().all(|e| *e == Event::Changed(0)));
        assert!(!recorder.events().is_empty());
    }

    #[test]
    fn test_set_value_at_rejects_address_of_another_row() {
        let (mut store, recorder) = store_with_recorder();
        store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        let b = store.add_attendee(Attendee::with_address("mailto:b@example.com")).unwrap();
        recorder.clear();

        assert!(matches!(
            store.set_value_at(1, Column::Address, "A@example.com"),
            Err(MeetingError::DuplicateAttendee(_))
        ));
        assert!(matches!(
            store.set_value_at(1, Column::Attendee, "mailto:a@EXAMPLE.com"),
            Err(MeetingError::DuplicateAttendee(_))
        ));
        assert_eq!(b.lock().address(), "mailto:b@example.com");
        assert!(recorder.events().is_empty());

        // Re-entering the row's own address in another case is allowed
        store.set_value_at(1, Column::Address, "B@example.com").unwrap();
        assert_eq!(b.lock().address(), "MAILTO:B@example.com");
    }

    #[test]
    fn test_editability() {
        let (mut store, _) = store_with_recorder();
        let a = store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();

        assert!(store.is_editable(0, Column::CommonName));
        assert!(!store.is_editable(0, Column::DelegatedTo));
        assert!(!store.is_editable(0, Column::DelegatedFrom));
        assert!(store.is_editable(7, Column::Address));
        assert!(!store.is_editable(7, Column::DelegatedFrom));

        a.lock().set_edit_level(EditLevel::Status);
        assert!(store.is_editable(0, Column::Status));
        assert!(!store.is_editable(0, Column::Role));
        assert!(matches!(
            store.set_value_at(0, Column::Role, "Chair"),
            Err(MeetingError::NotEditable(_))
        ));

        a.lock().set_edit_level(EditLevel::None);
        assert!(!store.is_editable(0, Column::Status));
        assert!(matches!(
            store.set_value_at(3, Column::Status, "Accepted"),
            Err(MeetingError::RowOutOfRange(3))
        ));
    }

    #[test]
    fn test_find_self() {
        let (mut store, _) = store_with_recorder();
        store.add_attendee(Attendee::with_address("mailto:a@example.com")).unwrap();
        store.add_attendee(Attendee::with_address("mailto:Me@Example.com")).unwrap();

        let identities = vec!["work@example.com".to_string(), "me@example.com".to_string()];
        let (row, _) = store.find_self(&identities).expect("Should find self");
        assert_eq!(row, 1);
        assert!(store.find_self(&[]).is_none());
    }

    #[test]
    fn test_add_from_ics_skips_duplicates() {
        let ics = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
UID:1\r\n\
ATTENDEE;CN=Alice:mailto:alice@example.com\r\n\
ATTENDEE;CN=Bob:mailto:bob@example.com\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let (mut store, _) = store_with_recorder();
        store.add_attendee(Attendee::with_address("MAILTO:ALICE@example.com")).unwrap();

        assert_eq!(store.add_from_ics(ics).unwrap(), 1);
        assert_eq!(store.count(), 2);
        assert_eq!(store.value_at(1, Column::Attendee).as_deref(), Some("Bob"));
    }

    #[test]
    fn test_from_config() {
        let config = MeetingConfig {
            free_busy_template: Some("https://%d/%u.ifb".to_string()),
            timezone: "Europe/Paris".to_string(),
            default_reminder_units: ReminderUnits::Days,
            ..MeetingConfig::default()
        };
        let store = MeetingStore::from_config(&config).unwrap();
        assert_eq!(store.timezone(), chrono_tz::Europe::Paris);
        assert_eq!(store.free_busy_template(), Some("https://%d/%u.ifb"));
        assert_eq!(store.default_reminder_units(), ReminderUnits::Days);
        assert!(store.client().is_none());
    }
}
