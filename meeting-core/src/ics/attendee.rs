//! Importing attendees from an existing calendar object.

use icalendar::parser::{Property, read_calendar, unfold};

use crate::attendee::{Attendee, CuType, PartStat, Role};
use crate::error::{MeetingError, MeetingResult};
use crate::ics::freebusy::param_value;

/// Parse the ATTENDEE properties of the first VEVENT or VTODO in `content`.
pub fn parse_attendees(content: &str) -> MeetingResult<Vec<Attendee>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| MeetingError::Parse(e.to_string()))?;

    let component = calendar
        .components
        .iter()
        .flat_map(|c| std::iter::once(c).chain(c.components.iter()))
        .find(|c| c.name == "VEVENT" || c.name == "VTODO")
        .ok_or_else(|| MeetingError::Parse("No VEVENT or VTODO found".into()))?;

    Ok(component
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(parse_attendee)
        .collect())
}

/// Parse an ATTENDEE property, keeping the address as written (usually `mailto:`).
fn parse_attendee(prop: &Property) -> Attendee {
    let val: &str = prop.val.as_ref();
    let mut attendee = Attendee::with_address(val.trim());

    let param = |key: &str| param_value(prop, key).unwrap_or_default().to_string();

    attendee.set_cn(param("CN"));
    attendee.set_member(param("MEMBER"));
    attendee.set_language(param("LANGUAGE"));
    attendee.set_sent_by(param("SENT-BY"));
    attendee.set_delegated_to(param("DELEGATED-TO"));
    attendee.set_delegated_from(param("DELEGATED-FROM"));

    // RFC 5545 defaults when parameters are absent
    attendee.set_cutype(param_value(prop, "CUTYPE").map_or(CuType::Individual, CuType::from_ics_str));
    attendee.set_role(param_value(prop, "ROLE").map_or(Role::Required, Role::from_ics_str));
    attendee.set_status(param_value(prop, "PARTSTAT").map_or(PartStat::NeedsAction, PartStat::from_ics_str));
    attendee.set_rsvp(param_value(prop, "RSVP").is_some_and(|v| v.eq_ignore_ascii_case("TRUE")));

    attendee
}
