//! Wall-clock date and time helpers.
//!
//! Everything here works on naive (zone-less) values. Dates and times are
//! composed field by field, never routed through a zone-aware parser, so a
//! stored `2024-03-10` is March 10th on every host.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse `YYYY-MM-DD`, or the date part of an ISO date-time, into a plain date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split_once('T').map_or(s, |(date, _)| date);

    let mut parts = date_part.split('-').map(|p| p.trim().parse::<i64>().ok());
    let (Some(Some(y)), Some(Some(m)), Some(Some(d)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    NaiveDate::from_ymd_opt(
        i32::try_from(y).ok()?,
        u32::try_from(m).ok()?,
        u32::try_from(d).ok()?,
    )
}

/// Parse `HH:MM`, `HH:MM:SS`, or the time part of an ISO date-time.
///
/// Seconds, fractions and zone suffixes are ignored: only hour and minute
/// survive, read as local wall-clock values.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    let time_part = s.split_once('T').map_or(s, |(_, time)| time);
    if !time_part.contains(':') {
        return None;
    }

    let mut parts = time_part.split(':');
    let hours = leading_number(parts.next()?).unwrap_or(0);
    let minutes = parts.next().and_then(leading_number).unwrap_or(0);

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Compose a local date-time from a date and an optional time (midnight when absent).
pub fn local_datetime(date: NaiveDate, time: Option<NaiveTime>) -> NaiveDateTime {
    date.and_time(time.unwrap_or(NaiveTime::MIN))
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date` (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or(NaiveDateTime::MAX)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Saturates at `NaiveDate::MAX`, which is itself the last day of its month.
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// End of the last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDateTime {
    end_of_day(last_of_month(date))
}

/// First day of the month after the one containing `date`; `None` past the
/// last representable month.
pub fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date).checked_add_months(Months::new(1))
}

/// Which 7-day block of its month `date` falls in: `ceil(day / 7)`, 1-5.
pub fn week_of_month(date: NaiveDate) -> u32 {
    date.day().div_ceil(7)
}

/// Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(NaiveDate::MIN)
}

/// Saturday on or after `date`.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date)
        .checked_add_signed(Duration::days(6))
        .unwrap_or(NaiveDate::MAX)
}

/// Serde adapter storing an optional time of day as `"HH:MM"`.
///
/// Deserialization is lenient: empty or unreadable strings become `None`.
pub mod serde_hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(super::parse_time))
    }
}
