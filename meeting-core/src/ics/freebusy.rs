//! VFREEBUSY parsing using the icalendar crate's parser.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::debug;

use crate::busy::{BusyPeriod, FreeBusyExtra, FreeBusyType};
use crate::error::{MeetingError, MeetingResult};
use crate::time::MeetingTime;

/// One VFREEBUSY component, converted into the store's timezone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeBusyComponent {
    /// DTSTART: start of the range the source reported on
    pub start: Option<MeetingTime>,
    /// DTEND: end of the range the source reported on
    pub end: Option<MeetingTime>,
    pub periods: Vec<BusyPeriod>,
}

/// Parse a free/busy document.
///
/// Accepts either a VCALENDAR wrapping VFREEBUSY components or a bare
/// VFREEBUSY. A well-formed document without any VFREEBUSY yields an empty list.
pub fn parse_free_busy(content: &str, zone: Tz) -> MeetingResult<Vec<FreeBusyComponent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| MeetingError::Parse(e.to_string()))?;

    let components = calendar
        .components
        .iter()
        .flat_map(|c| {
            if c.name == "VFREEBUSY" {
                vec![c]
            } else {
                c.components.iter().filter(|s| s.name == "VFREEBUSY").collect()
            }
        })
        .map(|c| parse_component(c, zone))
        .collect();

    Ok(components)
}

fn parse_component(vfreebusy: &Component, zone: Tz) -> FreeBusyComponent {
    let start = vfreebusy
        .find_prop("DTSTART")
        .and_then(|p| parse_datetime_property(p, zone));
    let end = vfreebusy
        .find_prop("DTEND")
        .and_then(|p| parse_datetime_property(p, zone));

    let periods = vfreebusy
        .properties
        .iter()
        .filter(|p| p.name == "FREEBUSY")
        .flat_map(|p| parse_freebusy_property(p, zone))
        .collect();

    FreeBusyComponent { start, end, periods }
}

pub(crate) fn param_value<'a>(prop: &'a Property, key: &str) -> Option<&'a str> {
    prop.params
        .iter()
        .find(|p| {
            let name: &str = p.key.as_ref();
            name.eq_ignore_ascii_case(key)
        })
        .and_then(|p| {
            let val: &str = p.val.as_ref()?.as_ref();
            Some(val.trim_matches('"'))
        })
}

/// Parse a FREEBUSY property into busy periods.
///
/// Handles:
/// - FBTYPE parameter, BUSY when absent; unknown types are skipped
/// - Comma-separated values: `FREEBUSY:20240110T090000Z/20240110T100000Z,...`
/// - Explicit end or duration: `20240110T090000Z/PT1H`
/// - X-SUMMARY / X-LOCATION extended free/busy parameters
fn parse_freebusy_property(prop: &Property, zone: Tz) -> Vec<BusyPeriod> {
    let busy_type = match param_value(prop, "FBTYPE") {
        Some(fbtype) => match FreeBusyType::from_fbtype(fbtype) {
            Some(t) => t,
            None => {
                debug!(fbtype, "Skipping FREEBUSY with unsupported type");
                return Vec::new();
            }
        },
        None => FreeBusyType::Busy,
    };

    let xfb = FreeBusyExtra::new(param_value(prop, "X-SUMMARY"), param_value(prop, "X-LOCATION"));

    let val: &str = prop.val.as_ref();
    val.split(',')
        .filter_map(|value| {
            let (start_str, end_str) = value.trim().split_once('/')?;
            let start = parse_utc_or_floating(start_str, zone)?;
            let end = if end_str.starts_with('P') || end_str.starts_with("+P") {
                let duration = parse_duration(end_str.trim_start_matches('+'))?;
                start.checked_add_signed(duration)?
            } else {
                parse_utc_or_floating(end_str, zone)?
            };

            Some(BusyPeriod {
                start: MeetingTime::from_utc(start, zone),
                end: MeetingTime::from_utc(end, zone),
                busy_type,
                xfb: xfb.clone(),
            })
        })
        .collect()
}

fn parse_duration(s: &str) -> Option<chrono::Duration> {
    let duration = iso8601::duration(s).ok()?;
    let std_duration: std::time::Duration = duration.into();
    chrono::Duration::from_std(std_duration).ok()
}

/// FREEBUSY values are UTC; floating values are read in the store zone.
fn parse_utc_or_floating(s: &str, zone: Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Some(utc) = s.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc());
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
    MeetingTime::from_naive(naive).to_utc(zone)
}

/// Parse DTSTART/DTEND, honouring a TZID parameter or VALUE=DATE.
fn parse_datetime_property(prop: &Property, zone: Tz) -> Option<MeetingTime> {
    let val_str: &str = prop.val.as_ref();
    let val = val_str.trim();

    let is_date = param_value(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    if is_date || val.len() == 8 {
        return NaiveDate::parse_from_str(val, "%Y%m%d")
            .ok()
            .map(MeetingTime::start_of_day);
    }

    if val.ends_with('Z') {
        return parse_utc_or_floating(val, zone).map(|dt| MeetingTime::from_utc(dt, zone));
    }

    let naive = NaiveDateTime::parse_from_str(val, "%Y%m%dT%H%M%S").ok()?;
    match param_value(prop, "TZID").map(|tzid| (tzid, tzid.parse::<Tz>())) {
        Some((_, Ok(source_zone))) => MeetingTime::from_naive(naive)
            .to_utc(source_zone)
            .map(|dt| MeetingTime::from_utc(dt, zone)),
        Some((tzid, Err(_))) => {
            debug!(tzid, "Unknown TZID, reading time as floating");
            Some(MeetingTime::from_naive(naive))
        }
        None => Some(MeetingTime::from_naive(naive)),
    }
}
