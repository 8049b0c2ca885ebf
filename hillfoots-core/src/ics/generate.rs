//! ICS file generation.

use chrono::{DateTime, NaiveDateTime, Utc};
use icalendar::{Calendar, Component, EventLike};

use crate::event::Occurrence;

pub const PRODID: &str = "-//East Hillfoots Parish//Hillfoots//EN";

const UID_DOMAIN: &str = "east-hillfoots";

const UNTITLED: &str = "Untitled Event";

/// UID of one occurrence: `{id}-{YYYYMMDDTHHMM}@east-hillfoots`.
pub fn occurrence_uid(occurrence: &Occurrence) -> String {
    format!("{}@{}", occurrence.instance_key(), UID_DOMAIN)
}

/// Generate one calendar holding a VEVENT per occurrence.
///
/// `stamp` becomes every VEVENT's DTSTAMP; exports pass the current time.
pub fn generate_ics(occurrences: &[Occurrence], stamp: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();
    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    for occurrence in occurrences {
        let def = &occurrence.definition;
        let title = if def.title.trim().is_empty() {
            tracing::warn!(id = %def.id, "exporting event without a title");
            UNTITLED
        } else {
            def.title.as_str()
        };

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&occurrence_uid(occurrence));
        ics_event.summary(title);

        ics_event.add_property("DTSTAMP", &dtstamp);
        ics_event.add_property("DTSTART", floating(occurrence.instance_start));
        ics_event.add_property("DTEND", floating(occurrence.instance_end));

        if !def.description.is_empty() {
            ics_event.description(&def.description);
        }
        ics_event.location(&format!("{} Parish Church", def.location));
        ics_event.add_property("CATEGORIES", def.tag.to_string());

        cal.push(ics_event.done());
    }

    let output = strip_ics_bloat(&cal.done().to_string());
    tracing::debug!(events = occurrences.len(), "generated ics");

    output
}

fn floating(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Replace the icalendar crate's PRODID and drop the redundant CALSCALE.
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventDefinition, EventTag, ParishLocation};
    use chrono::{NaiveDate, TimeZone};

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap()
    }

    fn make_occurrence() -> Occurrence {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let def = EventDefinition {
            description: "Family service with communion".to_string(),
            location: ParishLocation::Muckhart,
            tag: EventTag::Muckhart,
            ..EventDefinition::new("svc-1", "Sunday Worship", date)
        };
        Occurrence {
            definition: def,
            instance_start: date.and_hms_opt(10, 30, 0).unwrap(),
            instance_end: date.and_hms_opt(11, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_generate_ics_uses_floating_times() {
        let ics = generate_ics(&[make_occurrence()], stamp());

        assert!(ics.contains("DTSTAMP:20240301T091500Z\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTART:20240310T103000\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND:20240310T113000\r\n"), "ICS:\n{}", ics);
        assert!(!ics.contains("TZID"), "times must stay floating. ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_event_fields() {
        let ics = generate_ics(&[make_occurrence()], stamp());

        assert!(ics.contains("UID:svc-1-20240310T1030@east-hillfoots"));
        assert!(ics.contains("SUMMARY:Sunday Worship"));
        assert!(ics.contains("DESCRIPTION:Family service with communion"));
        assert!(ics.contains("LOCATION:Muckhart Parish Church"));
        assert!(ics.contains("CATEGORIES:Muckhart"));
    }

    #[test]
    fn test_generate_ics_one_vevent_per_occurrence() {
        let first = make_occurrence();
        let mut second = make_occurrence();
        second.instance_start += chrono::Duration::days(7);
        second.instance_end += chrono::Duration::days(7);

        let ics = generate_ics(&[first, second], stamp());
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert_eq!(ics.matches("BEGIN:VCALENDAR").count(), 1);
        assert!(ics.contains("UID:svc-1-20240317T1030@east-hillfoots"));
    }

    #[test]
    fn test_generate_ics_strips_bloat() {
        let ics = generate_ics(&[make_occurrence()], stamp());

        assert!(ics.contains(&format!("PRODID:{}\r\n", PRODID)));
        assert!(!ics.contains("CALSCALE"));
    }

    #[test]
    fn test_generate_ics_keeps_untitled_events() {
        let mut untitled = make_occurrence();
        untitled.definition.id = "svc-2".to_string();
        untitled.definition.title = "  ".to_string();

        let ics = generate_ics(&[make_occurrence(), untitled], stamp());
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("SUMMARY:Sunday Worship"));
        assert!(ics.contains("SUMMARY:Untitled Event"));
        assert!(ics.contains("UID:svc-2-20240310T1030@east-hillfoots"));
    }

    #[test]
    fn test_occurrence_uid_builds_on_instance_key() {
        let occurrence = make_occurrence();
        assert_eq!(occurrence.instance_key(), "svc-1-20240310T1030");
        assert_eq!(occurrence_uid(&occurrence), "svc-1-20240310T1030@east-hillfoots");
    }
}
