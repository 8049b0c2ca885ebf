use anyhow::Result;
use chrono::NaiveDate;
use hillfoots_core::date_range::{DateRange, LocationFilter};
use hillfoots_core::links::{google_calendar_link, outlook_calendar_link};
use hillfoots_core::{EventDefinition, Occurrence, Store};
use owo_colors::OwoColorize;

pub fn run(range: DateRange, filter: LocationFilter, links: bool, today: NaiveDate) -> Result<()> {
    let (_, store) = super::open()?;
    let events: Vec<EventDefinition> = store.load()?;

    let occurrences = visible(&events, range, filter);

    if occurrences.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    // Group occurrences by day and print
    let mut current_date: Option<NaiveDate> = None;

    for occ in &occurrences {
        let date = occ.instance_start.date();

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date, today).bold());
            current_date = Some(date);
        }

        let church = format!("[{}]", occ.definition.location);
        println!("  {} {} {}", format_time(occ), occ.title(), church.dimmed());

        if links {
            println!("          {}", google_calendar_link(occ).dimmed());
            println!("          {}", outlook_calendar_link(occ).dimmed());
        }
    }

    Ok(())
}

/// Occurrences in `range` allowed by `filter`, earliest first.
fn visible(events: &[EventDefinition], range: DateRange, filter: LocationFilter) -> Vec<Occurrence> {
    let mut occurrences: Vec<Occurrence> = range
        .occurrences(events)
        .into_iter()
        .filter(|occ| filter.allows(occ))
        .collect();
    occurrences.sort_by_key(|occ| occ.instance_start);
    occurrences
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Start time (e.g. "  15:00"), or "all-day" for events without one
fn format_time(occ: &Occurrence) -> String {
    match occ.definition.start_time {
        Some(_) => format!("{:>7}", occ.instance_start.format("%H:%M")),
        None => "all-day".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use hillfoots_core::{EventTag, ParishLocation, Recurrence};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_label() {
        let today = date(2025, 2, 24);
        assert_eq!(format_date_label(today, today), "Today");
        assert_eq!(format_date_label(date(2025, 2, 25), today), "Tomorrow");
        assert_eq!(format_date_label(date(2025, 2, 26), today), "Wed Feb 26");
    }

    #[test]
    fn test_visible_filters_and_sorts() {
        let mut coffee = EventDefinition {
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            location: ParishLocation::Muckhart,
            tag: EventTag::Muckhart,
            ..EventDefinition::new("coffee", "Coffee Morning", date(2025, 3, 5))
        };
        coffee.is_recurring = true;
        coffee.recurrence = Recurrence::Weekly;

        let worship = EventDefinition {
            start_time: NaiveTime::from_hms_opt(11, 0, 0),
            location: ParishLocation::Dollar,
            tag: EventTag::Dollar,
            ..EventDefinition::new("worship", "Sunday Worship", date(2025, 3, 2))
        };

        let range = DateRange::new(date(2025, 3, 1), date(2025, 3, 14));
        let events = [coffee, worship];

        let all = visible(&events, range, LocationFilter::default());
        let titles: Vec<&str> = all.iter().map(|o| o.title()).collect();
        assert_eq!(titles, vec!["Sunday Worship", "Coffee Morning", "Coffee Morning"]);
        assert_eq!(format_time(&all[0]), "  11:00");

        let dollar = visible(&events, range, LocationFilter::only(ParishLocation::Dollar));
        assert_eq!(dollar.len(), 1);
    }

    #[test]
    fn test_format_time_all_day() {
        let def = EventDefinition::new("fete", "Summer Fete", date(2025, 6, 14));
        let start = date(2025, 6, 14).and_hms_opt(0, 0, 0).unwrap();
        let occ = Occurrence {
            definition: def,
            instance_start: start,
            instance_end: start,
        };
        assert_eq!(format_time(&occ), "all-day");
    }
}
