//! "Add to calendar" deep links for a single occurrence.

use url::form_urlencoded;

use crate::event::Occurrence;

const GOOGLE_BASE: &str = "https://calendar.google.com/calendar/render";
const OUTLOOK_BASE: &str = "https://outlook.live.com/calendar/0/deeplink/compose";

fn location_label(occurrence: &Occurrence) -> String {
    format!("{} Parish Church", occurrence.definition.location)
}

fn with_query<'a>(base: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{}?{}", base, query)
}

/// Google Calendar template link. Times are floating so Google uses the
/// viewer's own zone, matching the wall-clock time on the notice board.
pub fn google_calendar_link(occurrence: &Occurrence) -> String {
    let dates = format!(
        "{}/{}",
        occurrence.instance_start.format("%Y%m%dT%H%M%S"),
        occurrence.instance_end.format("%Y%m%dT%H%M%S")
    );
    let location = location_label(occurrence);

    with_query(
        GOOGLE_BASE,
        [
            ("action", "TEMPLATE"),
            ("text", occurrence.title()),
            ("dates", dates.as_str()),
            ("details", occurrence.definition.description.as_str()),
            ("location", location.as_str()),
        ],
    )
}

pub fn outlook_calendar_link(occurrence: &Occurrence) -> String {
    let start = occurrence.instance_start.format("%Y-%m-%dT%H:%M:%S").to_string();
    let end = occurrence.instance_end.format("%Y-%m-%dT%H:%M:%S").to_string();
    let location = location_label(occurrence);

    with_query(
        OUTLOOK_BASE,
        [
            ("path", "/calendar/action/compose"),
            ("rru", "addevent"),
            ("subject", occurrence.title()),
            ("startdt", start.as_str()),
            ("enddt", end.as_str()),
            ("body", occurrence.definition.description.as_str()),
            ("location", location.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventDefinition, ParishLocation};
    use chrono::NaiveDate;
    use url::Url;

    fn occurrence() -> Occurrence {
        let date = NaiveDate::from_ymd_opt(2024, 12, 24).unwrap();
        let def = EventDefinition {
            description: "Carols & candles".to_string(),
            location: ParishLocation::Dollar,
            ..EventDefinition::new("xmas", "Watchnight Service", date)
        };
        Occurrence {
            definition: def,
            instance_start: date.and_hms_opt(23, 0, 0).unwrap(),
            instance_end: date.succ_opt().unwrap().and_hms_opt(0, 15, 0).unwrap(),
        }
    }

    fn params(link: &str) -> Vec<(String, String)> {
        Url::parse(link)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn param(link: &str, key: &str) -> String {
        params(link)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .unwrap()
    }

    #[test]
    fn test_google_link() {
        let link = google_calendar_link(&occurrence());

        assert!(link.starts_with("https://calendar.google.com/calendar/render?action=TEMPLATE&"));
        assert!(link.contains("text=Watchnight+Service"));
        assert!(link.contains("Carols+%26+candles"), "ampersand must be escaped: {link}");
        assert_eq!(param(&link, "dates"), "20241224T230000/20241225T001500");
        assert_eq!(param(&link, "location"), "Dollar Parish Church");
    }

    #[test]
    fn test_outlook_link() {
        let link = outlook_calendar_link(&occurrence());

        assert!(link.starts_with(OUTLOOK_BASE));
        assert_eq!(param(&link, "path"), "/calendar/action/compose");
        assert_eq!(param(&link, "rru"), "addevent");
        assert_eq!(param(&link, "subject"), "Watchnight Service");
        assert_eq!(param(&link, "startdt"), "2024-12-24T23:00:00");
        assert_eq!(param(&link, "enddt"), "2024-12-25T00:15:00");
        assert_eq!(param(&link, "body"), "Carols & candles");
    }
}
