//! Plain-text summaries of the calendar and knowledge base for the
//! parish assistant.

use chrono::NaiveDate;

use crate::config::ParishConfig;
use crate::date_range::DateRange;
use crate::error::ParishResult;
use crate::event::{EventDefinition, Occurrence};
use crate::model::KnowledgeEntry;

const NO_EVENTS: &str = "No upcoming events scheduled.";

/// One line per occurrence, e.g.
/// `- Guild at Muckhart (Muckhart Parish) on Tuesday, March 12 at 2:00 PM. Details: Soup lunch`
pub fn describe(occurrence: &Occurrence) -> String {
    let def = &occurrence.definition;
    format!(
        "- {} at {} ({} Parish) on {} at {}. Details: {}",
        def.title,
        def.location,
        def.tag,
        occurrence.instance_start.format("%A, %B %-d"),
        occurrence.instance_start.format("%-I:%M %p"),
        def.description
    )
}

/// Occurrences from `today` through `today + days`, earliest first.
pub fn upcoming(
    events: &[EventDefinition],
    today: NaiveDate,
    days: i64,
) -> ParishResult<Vec<Occurrence>> {
    let mut occurrences = DateRange::upcoming(today, days)?.occurrences(events);
    occurrences.sort_by_key(|occ| occ.instance_start);
    Ok(occurrences)
}

pub fn upcoming_context(
    events: &[EventDefinition],
    today: NaiveDate,
    days: i64,
) -> ParishResult<String> {
    Ok(upcoming(events, today, days)?
        .iter()
        .map(describe)
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn knowledge_context(entries: &[KnowledgeEntry]) -> String {
    entries
        .iter()
        .map(|k| format!("TOPIC: {}\nCONTENT: {}", k.title, k.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Instruction given to the assistant before a visitor's question.
pub fn system_prompt(
    config: &ParishConfig,
    today: NaiveDate,
    events: &[EventDefinition],
    knowledge: &[KnowledgeEntry],
) -> ParishResult<String> {
    let events_context = upcoming_context(events, today, config.context_days)?;
    let events_context = if events_context.is_empty() {
        NO_EVENTS.to_string()
    } else {
        events_context
    };

    Ok(format!(
        "You are the {name} AI Assistant. Your goal is to help visitors and parishioners \
with information about Dollar and Muckhart churches.

Today's date is {date}.

Use the following information to answer questions:

### PARISH KNOWLEDGE BASE ###
{knowledge}

### UPCOMING EVENTS (NEXT {days} DAYS) ###
{events}

If the answer is not in the knowledge base or calendar, politely inform them you don't have \
that specific information yet and suggest they contact the parish secretary.
Keep your tone warm, welcoming, and professional.
If asked for spiritual advice, provide a compassionate response and suggest speaking with \
the Minister for deeper guidance.",
        name = config.parish_name,
        date = today.format("%A, %B %-d, %Y"),
        knowledge = knowledge_context(knowledge),
        days = config.context_days,
        events = events_context,
    ))
}
