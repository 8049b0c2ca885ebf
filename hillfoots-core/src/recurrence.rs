//! Recurrence expansion for parish events.
//!
//! Turns stored [`EventDefinition`]s into the concrete [`Occurrence`]s that
//! fall inside a query window. Expansion is a pure function of its inputs:
//! malformed definitions are skipped or defaulted, never reported as errors.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::event::{EventDefinition, Occurrence, Recurrence, WeekOfMonth};
use crate::time::{
    end_of_day, end_of_month, first_of_next_month, last_of_month, local_datetime, start_of_day,
    week_of_month,
};

/// Loop guard for a single series. Bounds a call to roughly 9.5 years of a
/// weekly series or 41 years of a monthly one.
pub const MAX_ITERATIONS: usize = 500;

/// Length of events that have no end time.
const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Result of [`expand_with_report`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub occurrences: Vec<Occurrence>,
    /// Ids of series that hit [`MAX_ITERATIONS`] before reaching the end of the window.
    pub truncated: Vec<String>,
}

/// Expand `events` into occurrences between the start of `range_start` and
/// the end of the month containing `range_end`.
///
/// The upper bound is widened so month grids that show trailing days still
/// get every instance of the month. Output order is not significant.
pub fn expand(
    events: &[EventDefinition],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<Occurrence> {
    expand_with_report(events, range_start, range_end).occurrences
}

/// Same as [`expand`], also reporting which series were cut short by the
/// iteration cap.
pub fn expand_with_report(
    events: &[EventDefinition],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Expansion {
    let window = Window {
        start: start_of_day(range_start),
        end: end_of_month(range_end),
    };

    let mut expansion = Expansion::default();

    for event in events {
        let Some(anchor) = Anchor::resolve(event) else {
            continue;
        };

        if !event.is_series() {
            if window.contains(anchor.start) {
                expansion.occurrences.push(instance(event, false, anchor.start, anchor.end));
            }
            continue;
        }

        let completed = expand_series(event, &anchor, &window, &mut expansion.occurrences);
        if !completed {
            tracing::warn!(
                event_id = %event.id,
                recurrence = %event.recurrence,
                "series truncated after {} iterations",
                MAX_ITERATIONS
            );
            expansion.truncated.push(event.id.clone());
        }
    }

    tracing::debug!(
        definitions = events.len(),
        occurrences = expansion.occurrences.len(),
        %range_start,
        %range_end,
        "expanded events"
    );

    expansion
}

/// Resolve the `week_of_month`-th `weekday` of the month containing `month`.
///
/// First through fourth count forward from the 1st; `Last` counts back from
/// the final day. Returns `None` when the month has no such day, in which
/// case callers skip the month.
pub fn nth_weekday_of_month(
    month: NaiveDate,
    weekday: Weekday,
    week_of_month: WeekOfMonth,
) -> Option<NaiveDate> {
    match week_of_month.ordinal() {
        Some(n) => NaiveDate::from_weekday_of_month_opt(month.year(), month.month(), weekday, n as u8),
        None => {
            let last = last_of_month(month);
            let back = (7 + last.weekday().num_days_from_sunday() - weekday.num_days_from_sunday()) % 7;
            Some(last - Duration::days(i64::from(back)))
        }
    }
}

/// Inclusive bounds of a query.
struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }
}

/// The first instance of a definition, from which every other one is derived.
struct Anchor {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Anchor {
    /// `None` when the definition has no date, or its end would fall past
    /// the last representable instant.
    fn resolve(event: &EventDefinition) -> Option<Self> {
        let date = event.event_date?;
        let start = local_datetime(date, event.start_time);

        let end = match event.end_time {
            Some(end_time) => {
                let end = local_datetime(date, Some(end_time));
                // Overnight: ends on the following day
                if end < start {
                    end.checked_add_signed(Duration::days(1))?
                } else {
                    end
                }
            }
            None => start.checked_add_signed(Duration::minutes(DEFAULT_DURATION_MINUTES))?,
        };

        Some(Anchor { start, end })
    }

    fn day(&self) -> NaiveDate {
        self.start.date()
    }

    fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Walk a series from its anchor up to the search limit, pushing qualifying
/// instances. Returns false if the iteration cap stopped the walk early.
fn expand_series(
    event: &EventDefinition,
    anchor: &Anchor,
    window: &Window,
    out: &mut Vec<Occurrence>,
) -> bool {
    let search_limit = match event.recurrence_end_date {
        Some(until) => end_of_day(until).min(window.end),
        None => window.end,
    };
    let last_day = search_limit.date();

    let monthly_rule = (event.recurrence == Recurrence::MonthlyRelative).then(|| {
        let weekday = event
            .day_of_week
            .map_or_else(|| anchor.day().weekday(), |d| d.weekday());
        let week = event
            .week_of_month
            .unwrap_or_else(|| WeekOfMonth::clamped(i64::from(week_of_month(anchor.day()))));
        (weekday, week)
    });

    let mut cursor = anchor.day();
    let mut iterations = 0;

    while cursor <= last_day {
        if iterations == MAX_ITERATIONS {
            return false;
        }
        iterations += 1;

        let candidate = match (event.recurrence, monthly_rule) {
            (Recurrence::Weekly, _) => Some(cursor),
            (Recurrence::BiWeekly, _) => {
                let weeks = (cursor - anchor.day()).num_days().div_euclid(7);
                (weeks.rem_euclid(2) == 0).then_some(cursor)
            }
            (Recurrence::MonthlyRelative, Some((weekday, week))) => {
                nth_weekday_of_month(cursor, weekday, week)
            }
            _ => None,
        };

        if let Some(date) = candidate {
            let start = date.and_time(anchor.start.time());
            let end = start.checked_add_signed(anchor.duration());
            if let Some(end) = end.filter(|_| {
                date >= anchor.day() && start <= search_limit && window.contains(start)
            }) {
                out.push(instance(event, true, start, end));
            }
        }

        let next = match event.recurrence {
            Recurrence::MonthlyRelative => first_of_next_month(cursor),
            _ => cursor.checked_add_signed(Duration::weeks(1)),
        };
        // Nothing after the last representable date
        let Some(next) = next else { break };
        cursor = next;
    }

    true
}

fn instance(
    event: &EventDefinition,
    is_recurring: bool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Occurrence {
    let mut definition = event.clone();
    definition.is_recurring = is_recurring;

    Occurrence {
        definition,
        instance_start: start,
        instance_end: end,
    }
}
