use std::path::PathBuf;

use anyhow::{Context, Result};
use hillfoots_core::date_range::DateRange;
use hillfoots_core::ics::generate_ics;
use hillfoots_core::{EventDefinition, Store};
use owo_colors::OwoColorize;

pub fn run(range: DateRange, output: Option<PathBuf>) -> Result<()> {
    let (_, store) = super::open()?;
    let events: Vec<EventDefinition> = store.load()?;

    let mut occurrences = range.occurrences(&events);
    occurrences.sort_by_key(|occ| occ.instance_start);

    let ics = generate_ics(&occurrences, chrono::Utc::now());

    match output {
        Some(path) => {
            std::fs::write(&path, ics)
                .with_context(|| format!("Could not write {}", path.display()))?;
            println!(
                "Exported {} events ({} to {}) to {}",
                occurrences.len(),
                range.from,
                range.to,
                path.display().green()
            );
        }
        None => print!("{ics}"),
    }

    Ok(())
}
