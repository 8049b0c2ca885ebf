//! Normalization of spreadsheet rows into typed parish records.
//!
//! Sheets are edited by hand, so column headers drift ("Event Date", "date",
//! "Day") and cells hold loosely-typed text ("yes", "1", "10/03/2024"). Each
//! record type declares a schema: for every canonical field, a prioritized
//! list of accepted header aliases. Headers are compared case- and
//! whitespace-insensitively.
//!
//! Everything downstream of this module, the expander included, only ever
//! sees well-typed records.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};

use crate::event::{DayOfWeek, EventDefinition, EventTag, ParishLocation, Recurrence, WeekOfMonth};
use crate::model::{
    ChurchContact, ChurchGroup, ContactRequest, Feedback, FoundLooking, KnowledgeEntry,
    MissionStatement, Subscriber,
};
use crate::time::parse_time;

/// One spreadsheet row as delivered by the sync API.
pub type RawRow = Map<String, Value>;

/// A canonical field and the headers accepted for it, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

const fn field(canonical: &'static str, aliases: &'static [&'static str]) -> FieldAliases {
    FieldAliases { canonical, aliases }
}

pub const EVENT_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid", "entryid"]),
    field("title", &["title", "name", "event", "subject"]),
    field("description", &["description", "details", "info", "notes"]),
    field("location", &["location", "place", "venue"]),
    field("tag", &["tag", "category", "label"]),
    field("startTime", &["starttime", "start", "time"]),
    field("endTime", &["endtime", "end"]),
    field("eventDate", &["eventdate", "date", "day"]),
    field("isRecurring", &["isrecurring", "recurring", "repeat?"]),
    field("recurrence", &["recurrence", "frequency", "repeat"]),
    field("recurrenceEndDate", &["recurrenceenddate", "repeatuntil", "until"]),
    field("dayOfWeek", &["dayofweek", "weekday"]),
    field("weekOfMonth", &["weekofmonth", "weeknumber"]),
];

pub const GROUP_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid", "entryid"]),
    field("name", &["name", "groupname", "title"]),
    field("description", &["description", "details", "info"]),
    field("church", &["church", "location", "parish"]),
    field("meetingTime", &["meetingtime", "time", "when"]),
    field("contactPerson", &["contactperson", "contact", "leader"]),
];

pub const CONTACT_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid", "entryid"]),
    field("name", &["name", "fullname", "contactname"]),
    field("title", &["title", "position", "parishtitle"]),
    field("role", &["role", "accessrole", "systemrole"]),
    field("email", &["email", "emailaddress", "contactemail"]),
    field("phone", &["phone", "telephone", "mobile", "number"]),
    field("imageUrl", &["imageurl", "image", "photo", "profilepicture"]),
    field("displayPublicly", &["displaypublicly", "public", "visible"]),
];

pub const SUBSCRIBER_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid"]),
    field("name", &["name", "fullname", "member"]),
    field("email", &["email", "emailaddress"]),
    field("subscribedAt", &["subscribedat", "date", "joined"]),
];

pub const FEEDBACK_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid"]),
    field("foundLooking", &["foundlooking", "found", "status"]),
    field("improveWebsite", &["improvewebsite", "improve", "feedback"]),
    field("addRemove", &["addremove", "changes"]),
    field("submittedAt", &["submittedat", "date", "time"]),
    field("pagePath", &["pagepath", "page", "url"]),
];

pub const KNOWLEDGE_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid"]),
    field("title", &["title", "subject"]),
    field("content", &["content", "description", "text"]),
    field("attachmentUrl", &["attachmenturl", "attachment", "file"]),
    field("attachmentName", &["attachmentname", "filename"]),
    field("lastUpdated", &["lastupdated", "date"]),
];

pub const REQUEST_FIELDS: &[FieldAliases] = &[
    field("id", &["id", "uuid"]),
    field("name", &["name", "fullname", "sender"]),
    field("email", &["email", "emailaddress"]),
    field("phone", &["phone", "telephone"]),
    field("subject", &["subject", "topic"]),
    field("message", &["message", "text", "inquiry"]),
    field("submittedAt", &["submittedat", "date", "time"]),
];

pub const MISSION_FIELDS: &[FieldAliases] = &[
    field("text", &["text", "mission", "statement", "missionstatement"]),
    field("lastUpdated", &["lastupdated", "date", "updated"]),
];

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// A row viewed through a schema.
struct Fields<'a> {
    row: &'a RawRow,
    schema: &'static [FieldAliases],
}

impl<'a> Fields<'a> {
    fn new(row: &'a RawRow, schema: &'static [FieldAliases]) -> Self {
        Fields { row, schema }
    }

    /// First non-blank value among `canonical`'s aliases.
    fn value(&self, canonical: &str) -> Option<&'a Value> {
        let spec = self.schema.iter().find(|f| f.canonical == canonical)?;

        spec.aliases.iter().find_map(|alias| {
            let wanted = normalize_key(alias);
            self.row
                .iter()
                .find(|(key, value)| normalize_key(key) == wanted && !is_blank(value))
                .map(|(_, value)| value)
        })
    }

    fn text(&self, canonical: &str) -> Option<String> {
        self.value(canonical).map(value_text)
    }

    fn text_or(&self, canonical: &str, default: &str) -> String {
        self.text(canonical).unwrap_or_else(|| default.to_string())
    }

    fn id_or(&self, prefix: &str, index: usize) -> String {
        self.text("id").unwrap_or_else(|| fallback_id(prefix, index))
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// `event-3-9f1c`: row position plus a short random suffix, for rows with no id.
fn fallback_id(prefix: &str, index: usize) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, index, &suffix[..4])
}

/// Loose truthiness: `true`, "yes", "1", "on" (any case) and non-zero numbers.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1" | "on"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Read an integer, falling back when the value is missing, blank or not numeric.
pub fn coerce_number(value: Option<&Value>, fallback: i64) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Some(Value::Bool(b)) => Some(i64::from(*b)),
        _ => None,
    };
    parsed.unwrap_or(fallback)
}

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})").unwrap());
static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})").unwrap());

/// Parse the date formats found in hand-edited sheets.
///
/// `2024-03-10` and `2024/3/10` are read as year-month-day. For
/// `10/03/2024` the first number is the day when it exceeds 12, otherwise
/// the sheet is assumed to use month/day order. Written-out dates such as
/// "10 March 2024" are also accepted.
pub fn parse_cloud_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let num = |caps: &regex::Captures<'_>, i: usize| caps[i].parse::<u32>().ok();

    if let Some(caps) = ISO_DATE.captures(s) {
        let year = caps[1].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, num(&caps, 2)?, num(&caps, 3)?);
    }

    if let Some(caps) = SLASH_DATE.captures(s) {
        let (first, second) = (num(&caps, 1)?, num(&caps, 2)?);
        let year = caps[3].parse::<i32>().ok()?;
        return if first > 12 {
            NaiveDate::from_ymd_opt(year, second, first)
        } else {
            NaiveDate::from_ymd_opt(year, first, second)
        };
    }

    ["%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y", "%A, %B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Map free text to a church; anything unrecognised means both.
pub fn normalize_location(value: Option<&Value>) -> ParishLocation {
    let text = value.map(value_text).unwrap_or_default().to_lowercase();
    if text.contains("dollar") {
        ParishLocation::Dollar
    } else if text.contains("muckhart") {
        ParishLocation::Muckhart
    } else {
        ParishLocation::Both
    }
}

pub fn normalize_tag(value: Option<&Value>) -> EventTag {
    match normalize_location(value) {
        ParishLocation::Dollar => EventTag::Dollar,
        ParishLocation::Muckhart => EventTag::Muckhart,
        ParishLocation::Both => EventTag::All,
    }
}

pub fn parse_recurrence(s: &str) -> Recurrence {
    let key: String = s
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    match key.as_str() {
        "weekly" => Recurrence::Weekly,
        "biweekly" | "fortnightly" => Recurrence::BiWeekly,
        "monthlyrelative" | "monthly" => Recurrence::MonthlyRelative,
        _ => Recurrence::None,
    }
}

/// Converts raw rows into records, stamping defaults with the ingest clock.
#[derive(Debug, Clone)]
pub struct Normalizer {
    today: NaiveDate,
    stamp: String,
}

impl Normalizer {
    pub fn new(now: NaiveDateTime) -> Self {
        Normalizer {
            today: now.date(),
            stamp: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Normalize every object row of a sheet; anything else is dropped.
    pub fn all<T>(&self, rows: &[Value], f: impl Fn(&Self, &RawRow, usize) -> T) -> Vec<T> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| row.as_object().map(|row| f(self, row, index)))
            .collect()
    }

    pub fn event(&self, row: &RawRow, index: usize) -> EventDefinition {
        let f = Fields::new(row, EVENT_FIELDS);

        let recurrence = f.text("recurrence").map_or(Recurrence::None, |r| parse_recurrence(&r));
        let is_recurring = match f.value("isRecurring") {
            Some(raw) => coerce_bool(raw),
            None => recurrence != Recurrence::None,
        };

        let day_of_week = u8::try_from(coerce_number(f.value("dayOfWeek"), -1))
            .ok()
            .and_then(|n| DayOfWeek::try_from(n).ok());
        let week_of_month = match coerce_number(f.value("weekOfMonth"), 0) {
            n if n >= 1 => Some(WeekOfMonth::clamped(n)),
            _ => None,
        };

        EventDefinition {
            id: f.id_or("event", index),
            title: f.text_or("title", "Untitled Event"),
            description: f.text_or("description", ""),
            event_date: Some(
                f.text("eventDate")
                    .and_then(|d| parse_cloud_date(&d))
                    .unwrap_or(self.today),
            ),
            start_time: f.text("startTime").and_then(|t| parse_time(&t)),
            end_time: f.text("endTime").and_then(|t| parse_time(&t)),
            location: normalize_location(f.value("location")),
            tag: normalize_tag(f.value("tag")),
            is_recurring,
            recurrence,
            day_of_week,
            week_of_month,
            recurrence_end_date: f.text("recurrenceEndDate").and_then(|d| parse_cloud_date(&d)),
        }
    }

    pub fn group(&self, row: &RawRow, index: usize) -> ChurchGroup {
        let f = Fields::new(row, GROUP_FIELDS);

        let church = match normalize_location(f.value("church")) {
            ParishLocation::Muckhart => ParishLocation::Muckhart,
            _ => ParishLocation::Dollar,
        };

        ChurchGroup {
            id: f.id_or("group", index),
            name: f.text_or("name", "Unnamed Group"),
            description: f.text_or("description", ""),
            church,
            meeting_time: f.text_or("meetingTime", ""),
            contact_person: f.text_or("contactPerson", ""),
        }
    }

    pub fn contact(&self, row: &RawRow, index: usize) -> ChurchContact {
        let f = Fields::new(row, CONTACT_FIELDS);

        ChurchContact {
            id: f.id_or("contact", index),
            name: f.text_or("name", "Unknown Name"),
            title: f.text_or("title", ""),
            role: f.text_or("role", "Volunteer"),
            email: f.text_or("email", ""),
            phone: f.text_or("phone", ""),
            image_url: f.text_or("imageUrl", ""),
            display_publicly: f.value("displayPublicly").is_none_or(coerce_bool),
        }
    }

    pub fn subscriber(&self, row: &RawRow, index: usize) -> Subscriber {
        let f = Fields::new(row, SUBSCRIBER_FIELDS);

        Subscriber {
            id: f.id_or("sub", index),
            name: f.text_or("name", "Subscriber"),
            email: f.text_or("email", ""),
            subscribed_at: f.text_or("subscribedAt", &self.stamp),
        }
    }

    pub fn feedback(&self, row: &RawRow, index: usize) -> Feedback {
        let f = Fields::new(row, FEEDBACK_FIELDS);

        let found_looking = match f.text("foundLooking").map(|s| s.to_lowercase()) {
            Some(s) if s.contains("still") => FoundLooking::StillLooking,
            Some(s) if s == "no" => FoundLooking::No,
            _ => FoundLooking::Yes,
        };

        Feedback {
            id: f.id_or("fb", index),
            found_looking,
            improve_website: f.text_or("improveWebsite", ""),
            add_remove: f.text_or("addRemove", ""),
            submitted_at: f.text_or("submittedAt", &self.stamp),
            page_path: f.text_or("pagePath", "Home"),
        }
    }

    pub fn knowledge(&self, row: &RawRow, index: usize) -> KnowledgeEntry {
        let f = Fields::new(row, KNOWLEDGE_FIELDS);

        KnowledgeEntry {
            id: f.id_or("kb", index),
            title: f.text_or("title", "Untitled Entry"),
            content: f.text_or("content", ""),
            attachment_url: f.text_or("attachmentUrl", ""),
            attachment_name: f.text_or("attachmentName", ""),
            last_updated: f.text_or("lastUpdated", &self.stamp),
        }
    }

    pub fn request(&self, row: &RawRow, index: usize) -> ContactRequest {
        let f = Fields::new(row, REQUEST_FIELDS);

        ContactRequest {
            id: f.id_or("req", index),
            name: f.text_or("name", "Anonymous"),
            email: f.text_or("email", ""),
            phone: f.text_or("phone", ""),
            subject: f.text_or("subject", "General"),
            message: f.text_or("message", ""),
            submitted_at: f.text_or("submittedAt", &self.stamp),
        }
    }

    /// The mission sheet is a log; the last object row is current.
    pub fn mission(&self, rows: &[Value]) -> Option<MissionStatement> {
        let row = rows.iter().rev().find_map(Value::as_object)?;
        let f = Fields::new(row, MISSION_FIELDS);

        Some(MissionStatement {
            text: f.text_or("text", ""),
            last_updated: f.text_or("lastUpdated", &self.stamp),
        })
    }
}
