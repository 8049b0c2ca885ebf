//! Date ranges used by the calendar views, the exporter and the chat context.

use chrono::{Duration, NaiveDate};

use crate::error::{ParishError, ParishResult};
use crate::event::{EventDefinition, EventTag, Occurrence, ParishLocation};
use crate::recurrence::expand;
use crate::time::{end_of_week, first_of_month, last_of_month, parse_date, start_of_week};

/// Days of upcoming events given to the chat assistant.
pub const DEFAULT_CONTEXT_DAYS: i64 = 30;

/// How a calendar is being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    List,
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange { from, to }
    }

    /// Full weeks (Sunday to Saturday) covering the month containing `date`.
    pub fn month_grid(date: NaiveDate) -> Self {
        DateRange {
            from: start_of_week(first_of_month(date)),
            to: end_of_week(last_of_month(date)),
        }
    }

    /// The Sunday-to-Saturday week containing `date`.
    pub fn week(date: NaiveDate) -> Self {
        DateRange {
            from: start_of_week(date),
            to: end_of_week(date),
        }
    }

    /// `today` through `today + days`.
    pub fn upcoming(today: NaiveDate, days: i64) -> ParishResult<Self> {
        if days < 0 {
            return Err(ParishError::InvalidRange(format!(
                "days ahead must not be negative, got {days}"
            )));
        }

        let to = Duration::try_days(days)
            .and_then(|ahead| today.checked_add_signed(ahead))
            .ok_or_else(|| {
                ParishError::InvalidRange(format!("{days} days after {today} is out of range"))
            })?;

        Ok(DateRange { from: today, to })
    }

    /// Range shown by `view` around `date`. The list view pages by week.
    pub fn for_view(view: CalendarView, date: NaiveDate) -> Self {
        match view {
            CalendarView::Month => Self::month_grid(date),
            CalendarView::Week | CalendarView::List => Self::week(date),
        }
    }

    /// Parse `--from` / `--to` style arguments (YYYY-MM-DD).
    /// Missing bounds fall back to this month's grid around `today`.
    pub fn from_args(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> ParishResult<Self> {
        let default = Self::month_grid(today);

        let from = match from {
            Some(s) => parse_arg(s)?,
            None => default.from,
        };
        let to = match to {
            Some(s) => parse_arg(s)?,
            None => default.to.max(from),
        };

        if to < from {
            return Err(ParishError::InvalidRange(format!("{to} is before {from}")));
        }

        Ok(DateRange { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Expand `events` for this range.
    ///
    /// The expander widens the end to the close of its month; the result is
    /// trimmed back to the days this range actually covers.
    pub fn occurrences(&self, events: &[EventDefinition]) -> Vec<Occurrence> {
        expand(events, self.from, self.to)
            .into_iter()
            .filter(|occ| self.contains(occ.instance_start.date()))
            .collect()
    }
}

fn parse_arg(s: &str) -> ParishResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date(s))
        .ok_or_else(|| ParishError::InvalidDate(s.to_string()))
}

/// The calendar's church toggles.
///
/// Events tagged for one church show only when that church is active; events
/// tagged Both/All show whenever any church is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationFilter {
    dollar: bool,
    muckhart: bool,
}

impl Default for LocationFilter {
    fn default() -> Self {
        LocationFilter {
            dollar: true,
            muckhart: true,
        }
    }
}

impl LocationFilter {
    /// Only `location` active; `Both` activates both churches.
    pub fn only(location: ParishLocation) -> Self {
        match location {
            ParishLocation::Dollar => LocationFilter { dollar: true, muckhart: false },
            ParishLocation::Muckhart => LocationFilter { dollar: false, muckhart: true },
            ParishLocation::Both => LocationFilter::default(),
        }
    }

    pub fn is_active(&self, location: ParishLocation) -> bool {
        match location {
            ParishLocation::Dollar => self.dollar,
            ParishLocation::Muckhart => self.muckhart,
            ParishLocation::Both => self.dollar && self.muckhart,
        }
    }

    /// Flip one church. The last active church cannot be switched off.
    pub fn toggle(&mut self, location: ParishLocation) {
        match location {
            ParishLocation::Dollar if !self.dollar || self.muckhart => self.dollar = !self.dollar,
            ParishLocation::Muckhart if !self.muckhart || self.dollar => {
                self.muckhart = !self.muckhart
            }
            _ => {}
        }
    }

    pub fn allows(&self, occurrence: &Occurrence) -> bool {
        match occurrence.definition.tag {
            EventTag::Dollar => self.dollar,
            EventTag::Muckhart => self.muckhart,
            EventTag::Both | EventTag::All => self.dollar || self.muckhart,
        }
    }
}
