//! Parish event types.
//!
//! `EventDefinition` is the stored, canonical shape of one event or event
//! series. `Occurrence` is a dated instance of a definition, computed on
//! demand by [`crate::recurrence::expand`] and never persisted.
//!
//! All dates and times are naive wall-clock values: the parish lives in one
//! timezone and an event at 23:30 on 2024-03-10 must stay on that day no
//! matter where the code runs.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::time::serde_hhmm;

/// One event or recurring event series, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// Anchor date: the first occurrence and reference point for recurrence math.
    /// Definitions without one are skipped by the expander.
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default, with = "serde_hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "serde_hhmm")]
    pub end_time: Option<NaiveTime>,

    #[serde(default)]
    pub location: ParishLocation,
    #[serde(default)]
    pub tag: EventTag,

    // Recurrence fields
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
    /// MonthlyRelative only; defaults to the anchor's weekday
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    /// MonthlyRelative only; defaults to the anchor's week of the month
    #[serde(default)]
    pub week_of_month: Option<WeekOfMonth>,
    /// Inclusive last day of the series
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
}

impl EventDefinition {
    /// A one-off event on `date` with no times set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        EventDefinition {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            event_date: Some(date),
            start_time: None,
            end_time: None,
            location: ParishLocation::default(),
            tag: EventTag::default(),
            is_recurring: false,
            recurrence: Recurrence::None,
            day_of_week: None,
            week_of_month: None,
            recurrence_end_date: None,
        }
    }

    /// True when the definition describes a series rather than a single event.
    pub fn is_series(&self) -> bool {
        self.is_recurring && self.recurrence != Recurrence::None
    }
}

/// A concrete dated instance of an [`EventDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    #[serde(flatten)]
    pub definition: EventDefinition,
    pub instance_start: NaiveDateTime,
    pub instance_end: NaiveDateTime,
}

impl Occurrence {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    /// Stable per-instance key, e.g. `evt-1-20240115T1030`. Two instances
    /// of one series never start at the same minute.
    pub fn instance_key(&self) -> String {
        format!(
            "{}-{}",
            self.definition.id,
            self.instance_start.format("%Y%m%dT%H%M")
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recurrence {
    #[default]
    None,
    Weekly,
    BiWeekly,
    MonthlyRelative,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recurrence::None => "None",
            Recurrence::Weekly => "Weekly",
            Recurrence::BiWeekly => "BiWeekly",
            Recurrence::MonthlyRelative => "MonthlyRelative",
        };
        f.write_str(s)
    }
}

/// Which church an event is held at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParishLocation {
    Dollar,
    Muckhart,
    #[default]
    Both,
}

impl fmt::Display for ParishLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParishLocation::Dollar => "Dollar",
            ParishLocation::Muckhart => "Muckhart",
            ParishLocation::Both => "Both",
        };
        f.write_str(s)
    }
}

/// Audience label used by the calendar's location filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    Dollar,
    Muckhart,
    Both,
    #[default]
    All,
}

impl EventTag {
    /// The single church this tag is restricted to, if any.
    pub fn church(&self) -> Option<ParishLocation> {
        match self {
            EventTag::Dollar => Some(ParishLocation::Dollar),
            EventTag::Muckhart => Some(ParishLocation::Muckhart),
            EventTag::Both | EventTag::All => None,
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventTag::Dollar => "Dollar",
            EventTag::Muckhart => "Muckhart",
            EventTag::Both => "Both",
            EventTag::All => "All",
        };
        f.write_str(s)
    }
}

/// Weekday stored as a Sunday-based index (Sunday = 0 .. Saturday = 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(pub Weekday);

impl DayOfWeek {
    pub fn weekday(self) -> Weekday {
        self.0
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        let weekday = match index {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            _ => return Err(format!("day of week must be 0-6, got {index}")),
        };
        Ok(DayOfWeek(weekday))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> u8 {
        day.0.num_days_from_sunday() as u8
    }
}

/// Position of a weekday within its month: first through fourth, or last.
///
/// Stored as 1-5 where 5 means "last", which is not the same as "fifth":
/// a month with only four Fridays still has a last Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekOfMonth {
    /// Clamp a loosely-typed number into 1-5.
    pub fn clamped(n: i64) -> Self {
        match n {
            i64::MIN..=1 => WeekOfMonth::First,
            2 => WeekOfMonth::Second,
            3 => WeekOfMonth::Third,
            4 => WeekOfMonth::Fourth,
            _ => WeekOfMonth::Last,
        }
    }

    /// Ordinal for First..Fourth, `None` for Last.
    pub fn ordinal(self) -> Option<u32> {
        match self {
            WeekOfMonth::First => Some(1),
            WeekOfMonth::Second => Some(2),
            WeekOfMonth::Third => Some(3),
            WeekOfMonth::Fourth => Some(4),
            WeekOfMonth::Last => None,
        }
    }
}

impl TryFrom<u8> for WeekOfMonth {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1..=5 => Ok(WeekOfMonth::clamped(i64::from(n))),
            _ => Err(format!("week of month must be 1-5, got {n}")),
        }
    }
}

impl From<WeekOfMonth> for u8 {
    fn from(week: WeekOfMonth) -> u8 {
        match week.ordinal() {
            Some(n) => n as u8,
            None => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_round_trips_camel_case_json() {
        let json = r#"{
            "id": "evt-1",
            "title": "Messy Church",
            "eventDate": "2024-03-10",
            "startTime": "23:30",
            "location": "Muckhart",
            "tag": "Muckhart",
            "isRecurring": true,
            "recurrence": "MonthlyRelative",
            "dayOfWeek": 0,
            "weekOfMonth": 5
        }"#;

        let def: EventDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.event_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(def.start_time, NaiveTime::from_hms_opt(23, 30, 0));
        assert_eq!(def.end_time, None);
        assert_eq!(def.day_of_week, Some(DayOfWeek(Weekday::Sun)));
        assert_eq!(def.week_of_month, Some(WeekOfMonth::Last));
        assert!(def.is_series());

        let back = serde_json::to_value(&def).unwrap();
        assert_eq!(back["startTime"], "23:30");
        assert_eq!(back["weekOfMonth"], 5);
        assert_eq!(back["eventDate"], "2024-03-10");
    }

    #[test]
    fn test_out_of_range_week_of_month_is_rejected() {
        let json = r#"{"id": "x", "title": "x", "weekOfMonth": 6}"#;
        assert!(serde_json::from_str::<EventDefinition>(json).is_err());
    }

    #[test]
    fn test_week_of_month_clamps_loose_numbers() {
        assert_eq!(WeekOfMonth::clamped(0), WeekOfMonth::First);
        assert_eq!(WeekOfMonth::clamped(3), WeekOfMonth::Third);
        assert_eq!(WeekOfMonth::clamped(9), WeekOfMonth::Last);
    }

    #[test]
    fn test_recurring_flag_without_rule_is_not_a_series() {
        let mut def = EventDefinition::new("a", "A", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        def.is_recurring = true;
        assert!(!def.is_series());
    }
}
