//! Free/busy refresh queue.
//!
//! Each attendee has at most one pending refresh, keyed by its normalised
//! address. A second request while one is queued or in flight widens the
//! requested range and appends its callback instead of fetching again.
//!
//! Two ways to run the queue:
//! - [`FreeBusyRefresher::drain`] fetches one attendee at a time.
//! - [`FreeBusyRefresher::spawn_pending`] starts one task per attendee; the
//!   owner then applies results with [`FreeBusyRefresher::dispatch_completed`]
//!   or [`FreeBusyRefresher::wait_idle`]. Attendees and callbacks are only
//!   touched on the owner's side.
//!
//! Fetch or parse failures are logged and leave the attendee without busy
//! data; callbacks run either way. Nothing is retried.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono_tz::Tz;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::attendee::normalize_address;
use crate::client::{AddressBook, CalendarClient, ResourceFetcher};
use crate::error::{MeetingError, MeetingResult};
use crate::fetch::expand_template;
use crate::ics::{FreeBusyComponent, parse_free_busy};
use crate::store::{AttendeeRef, MeetingStore};
use crate::time::MeetingTimeRange;

/// Runs once against the attendee after its refresh finished.
pub type RefreshCallback = Box<dyn FnOnce(&AttendeeRef) + Send>;

/// Collaborators the refresher fetches through.
pub struct RefresherDeps {
    pub client: Option<Arc<dyn CalendarClient>>,
    pub address_book: Option<Arc<dyn AddressBook>>,
    pub fetcher: Arc<dyn ResourceFetcher>,
    pub timezone: Tz,
    pub free_busy_template: Option<String>,
}

impl RefresherDeps {
    /// Take the calendar client, zone and template from `store`.
    pub fn from_store(store: &MeetingStore, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        RefresherDeps {
            client: store.client(),
            address_book: None,
            fetcher,
            timezone: store.timezone(),
            free_busy_template: store.free_busy_template().map(str::to_string),
        }
    }
}

struct QueueEntry {
    attendee: AttendeeRef,
    range: MeetingTimeRange,
    callbacks: Vec<RefreshCallback>,
    in_flight: bool,
}

#[derive(Default)]
struct Queue {
    entries: HashMap<String, QueueEntry>,
    order: VecDeque<String>,
}

/// What a fetch needs to know about the attendee, copied out of it.
#[derive(Debug, Clone)]
struct FetchRequest {
    email: String,
    fburi: String,
    has_address: bool,
    range: MeetingTimeRange,
}

struct Job {
    key: String,
    request: FetchRequest,
}

struct Completion {
    key: String,
    result: MeetingResult<Vec<FreeBusyComponent>>,
}

pub struct FreeBusyRefresher {
    deps: Arc<RefresherDeps>,
    queue: Mutex<Queue>,
    completed_tx: mpsc::UnboundedSender<Completion>,
    completed_rx: mpsc::UnboundedReceiver<Completion>,
}

impl FreeBusyRefresher {
    pub fn new(deps: RefresherDeps) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        FreeBusyRefresher {
            deps: Arc::new(deps),
            queue: Mutex::new(Queue::default()),
            completed_tx,
            completed_rx,
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a refresh of `attendee` over `range`.
    ///
    /// Returns true when a new fetch was queued. Attendees without an
    /// address are ignored and their callback is dropped.
    pub fn request_refresh(
        &self,
        attendee: &AttendeeRef,
        range: MeetingTimeRange,
        callback: RefreshCallback,
    ) -> bool {
        let key = {
            let attendee = attendee.lock();
            if !attendee.is_set_address() {
                debug!("Not refreshing attendee without address");
                return false;
            }
            normalize_address(attendee.address())
        };

        let mut queue = self.lock_queue();
        if let Some(entry) = queue.entries.get_mut(&key) {
            entry.range = entry.range.union(&range);
            entry.callbacks.push(callback);
            debug!(key, start = %entry.range.start, end = %entry.range.end, "Merged refresh request");
            return false;
        }

        {
            let mut attendee = attendee.lock();
            attendee.clear_busy_periods();
            attendee.set_has_calendar_info(false);
        }

        queue.entries.insert(
            key.clone(),
            QueueEntry {
                attendee: attendee.clone(),
                range,
                callbacks: vec![callback],
                in_flight: false,
            },
        );
        queue.order.push_back(key);
        true
    }

    /// Request a refresh of every attendee in `store`. Returns how many new
    /// fetches were queued.
    pub fn refresh_all(
        &self,
        store: &MeetingStore,
        range: MeetingTimeRange,
        callback: Arc<dyn Fn(&AttendeeRef) + Send + Sync>,
    ) -> usize {
        let mut queued = 0;
        for attendee in store.attendees() {
            let callback = Arc::clone(&callback);
            if self.request_refresh(&attendee, range, Box::new(move |a: &AttendeeRef| callback(a))) {
                queued += 1;
            }
        }
        queued
    }

    /// Queued entries not yet being fetched.
    pub fn pending_count(&self) -> usize {
        self.lock_queue().entries.values().filter(|e| !e.in_flight).count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock_queue().entries.values().filter(|e| e.in_flight).count()
    }

    /// Mark the first queued entry in flight and describe its fetch.
    fn take_next(&self) -> Option<Job> {
        let mut queue = self.lock_queue();
        let Queue { entries, order } = &mut *queue;

        let key = order.iter().find(|k| entries.get(*k).is_some_and(|e| !e.in_flight))?;
        let entry = entries.get_mut(key)?;
        entry.in_flight = true;

        let attendee = entry.attendee.lock();
        let request = FetchRequest {
            email: attendee.address_without_mailto().trim().to_string(),
            fburi: attendee.fburi().trim().to_string(),
            has_address: attendee.is_set_address(),
            range: entry.range,
        };

        Some(Job {
            key: key.clone(),
            request,
        })
    }

    /// Fetch queued attendees one at a time until the queue is empty.
    /// Returns the number of refreshes completed.
    pub async fn drain(&self) -> usize {
        let mut processed = 0;
        while let Some(job) = self.take_next() {
            let result = fetch_free_busy(&self.deps, &job.request).await;
            self.complete(Completion { key: job.key, result });
            processed += 1;
        }
        processed
    }

    /// Start a task for every queued entry. Returns the number started.
    pub fn spawn_pending(&self) -> usize {
        let mut spawned = 0;
        while let Some(job) = self.take_next() {
            let deps = Arc::clone(&self.deps);
            let completed_tx = self.completed_tx.clone();
            tokio::spawn(async move {
                let result = fetch_free_busy(&deps, &job.request).await;
                if completed_tx.send(Completion { key: job.key, result }).is_err() {
                    debug!("Refresher dropped before fetch completed");
                }
            });
            spawned += 1;
        }
        spawned
    }

    /// Apply every finished fetch without waiting. Returns the number applied.
    pub fn dispatch_completed(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(completion) = self.completed_rx.try_recv() {
            self.complete(completion);
            dispatched += 1;
        }
        dispatched
    }

    /// Apply finished fetches until nothing is in flight. Entries queued in
    /// the meantime are left for the next `spawn_pending`.
    pub async fn wait_idle(&mut self) -> usize {
        let mut dispatched = self.dispatch_completed();
        while self.in_flight_count() > 0 {
            match self.completed_rx.recv().await {
                Some(completion) => {
                    self.complete(completion);
                    dispatched += 1;
                }
                None => break,
            }
        }
        dispatched
    }

    fn complete(&self, completion: Completion) {
        let Completion { key, result } = completion;

        let entry = {
            let mut queue = self.lock_queue();
            queue.order.retain(|k| *k != key);
            queue.entries.remove(&key)
        };
        let Some(entry) = entry else {
            warn!(key, "Completed refresh has no queue entry");
            return;
        };

        match result {
            Ok(components) => apply_free_busy(&entry.attendee, components),
            Err(e) => warn!(key, error = %e, "Free/busy refresh failed"),
        }

        for callback in entry.callbacks {
            callback(&entry.attendee);
        }
    }
}

/// Write fetched busy data into the attendee.
fn apply_free_busy(attendee: &AttendeeRef, components: Vec<FreeBusyComponent>) {
    let mut attendee = attendee.lock();
    if components.is_empty() {
        return;
    }

    for component in components {
        if let Some(start) = component.start {
            if let Err(e) = attendee.set_start_busy_range(start) {
                debug!(error = %e, "Ignoring free/busy range start");
            }
        }
        if let Some(end) = component.end {
            if let Err(e) = attendee.set_end_busy_range(end) {
                debug!(error = %e, "Ignoring free/busy range end");
            }
        }

        for period in component.periods {
            if let Err(e) = attendee.add_busy_period(period.start, period.end, period.busy_type, period.xfb) {
                debug!(error = %e, "Skipping busy period");
            }
        }
    }

    attendee.set_has_calendar_info(true);
}

/// Find free/busy data for one attendee.
///
/// Tries, in order: the calendar client, the attendee's own free/busy URL,
/// an address-book contact's free/busy URL, then the configured template.
/// An empty result means no source had anything.
#[instrument(skip(deps, request), fields(email = %request.email))]
async fn fetch_free_busy(deps: &RefresherDeps, request: &FetchRequest) -> MeetingResult<Vec<FreeBusyComponent>> {
    if let Some(client) = &deps.client {
        match query_client(client.as_ref(), deps.timezone, request).await {
            Ok(Some(text)) => return parse_free_busy(&text, deps.timezone),
            Ok(None) => debug!("Calendar client has no free/busy data"),
            Err(e) => warn!(error = %e, "Calendar client free/busy query failed"),
        }
    }

    if !request.has_address {
        return Ok(Vec::new());
    }

    let url = match lookup_url(deps, request).await? {
        Some(url) => url,
        None => {
            debug!("No free/busy source");
            return Ok(Vec::new());
        }
    };

    debug!(url, "Fetching free/busy document");
    let text = deps.fetcher.fetch(&url).await?;
    parse_free_busy(&text, deps.timezone)
}

async fn query_client(
    client: &dyn CalendarClient,
    zone: Tz,
    request: &FetchRequest,
) -> MeetingResult<Option<String>> {
    let start = request
        .range
        .start
        .to_utc(zone)
        .ok_or_else(|| MeetingError::InvalidTime(request.range.start.to_string()))?;
    let end = request
        .range
        .end
        .to_utc(zone)
        .ok_or_else(|| MeetingError::InvalidTime(request.range.end.to_string()))?;

    let objects = client
        .get_free_busy(std::slice::from_ref(&request.email), start, end)
        .await?;
    Ok(objects.into_iter().next())
}

async fn lookup_url(deps: &RefresherDeps, request: &FetchRequest) -> MeetingResult<Option<String>> {
    if !request.fburi.is_empty() {
        return Ok(Some(request.fburi.clone()));
    }

    if let Some(book) = &deps.address_book {
        book.wait_loaded().await?;
        let contacts = book.query_email(&request.email).await?;
        let contact_url = contacts
            .into_iter()
            .filter(|c| c.has_email(&request.email))
            .find_map(|c| c.fb_url.filter(|url| !url.trim().is_empty()));
        if contact_url.is_some() {
            return Ok(contact_url);
        }
    }

    Ok(deps
        .free_busy_template
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|template| expand_template(template, &request.email)))
}
