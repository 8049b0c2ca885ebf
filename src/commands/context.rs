use anyhow::Result;
use chrono::NaiveDate;
use hillfoots_core::model::KnowledgeEntry;
use hillfoots_core::summary::{system_prompt, upcoming_context};
use hillfoots_core::{EventDefinition, Store};
use owo_colors::OwoColorize;

pub fn run(days: Option<i64>, prompt: bool, today: NaiveDate) -> Result<()> {
    let (mut config, store) = super::open()?;
    if let Some(days) = days {
        config.context_days = days;
    }

    let events: Vec<EventDefinition> = store.load()?;

    if prompt {
        let knowledge: Vec<KnowledgeEntry> = store.load()?;
        println!("{}", system_prompt(&config, today, &events, &knowledge)?);
        return Ok(());
    }

    let context = upcoming_context(&events, today, config.context_days)?;
    if context.is_empty() {
        println!("{}", "No upcoming events scheduled.".dimmed());
    } else {
        println!("{context}");
    }

    Ok(())
}
