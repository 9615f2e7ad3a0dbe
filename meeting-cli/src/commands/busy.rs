use std::sync::Arc;

use anyhow::Result;
use meeting_core::attendee::{Attendee, normalize_address, strip_mailto};
use meeting_core::config::MeetingConfig;
use meeting_core::error::MeetingError;
use meeting_core::fetch::HttpFetcher;
use meeting_core::refresh::{FreeBusyRefresher, RefresherDeps};
use meeting_core::store::{AttendeeRef, MeetingStore};
use meeting_core::time::MeetingTimeRange;
use owo_colors::OwoColorize;
use tracing::debug;

use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run(
    addresses: Vec<String>,
    range: MeetingTimeRange,
    urls: Vec<(String, String)>,
) -> Result<()> {
    let config = MeetingConfig::load()?;
    let mut store = MeetingStore::from_config(&config)?;

    for address in &addresses {
        let mut attendee = Attendee::with_defaults();
        attendee.set_address(format!("MAILTO:{}", strip_mailto(address.trim())));

        let key = normalize_address(address);
        if let Some((_, url)) = urls.iter().find(|(a, _)| normalize_address(a) == key) {
            attendee.set_fburi(url.as_str());
        }

        match store.add_attendee(attendee) {
            Ok(_) => {}
            Err(MeetingError::DuplicateAttendee(a)) => {
                eprintln!("{}", format!("Skipping duplicate attendee {}", a).yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout())?);
    let mut refresher = FreeBusyRefresher::new(RefresherDeps::from_store(&store, fetcher));

    let spinner = create_spinner(format!(
        "Fetching free/busy for {} attendee(s)",
        store.count()
    ));
    let queued = refresher.refresh_all(&store, range, Arc::new(|_: &AttendeeRef| {}));
    let spawned = refresher.spawn_pending();
    let completed = refresher.wait_idle().await;
    debug!(queued, spawned, completed, "Free/busy refresh finished");
    spinner.finish_and_clear();

    println!(
        "{}",
        format!("Busy time from {} to {} ({})", range.start, range.end, store.timezone()).dimmed()
    );

    let attendees = store.attendees();
    for (i, attendee) in attendees.iter().enumerate() {
        print_attendee(attendee, &range);

        if i < attendees.len() - 1 {
            println!();
        }
    }

    Ok(())
}

fn print_attendee(attendee: &AttendeeRef, range: &MeetingTimeRange) {
    let mut attendee = attendee.lock();
    println!("{}", attendee.render());

    if !attendee.has_calendar_info() {
        println!("   {}", "No free/busy information".red());
        return;
    }

    let first = attendee.find_first_busy_period(range.start.date);
    let periods: Vec<_> = match first {
        Some(first) => attendee.busy_periods()[first..]
            .iter()
            .filter(|p| p.end >= range.start && p.start <= range.end)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    if periods.is_empty() {
        println!("   {}", "Free".green());
        return;
    }

    for period in &periods {
        println!("   {}", period.render());
    }
}
