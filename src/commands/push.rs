use anyhow::{Result, anyhow, bail};
use hillfoots_core::Collection;
use hillfoots_core::store::Store;
use owo_colors::OwoColorize;

use crate::utils::tui::while_syncing;

pub async fn run(collection: &str) -> Result<()> {
    let collection: Collection = collection.parse().map_err(|e: String| anyhow!(e))?;
    if !Collection::SYNCED.contains(&collection) {
        bail!("'{}' is local only and cannot be pushed", collection);
    }

    let (config, store) = super::open()?;
    let client = super::sheets_client(&config)?;
    let records = store.get(collection)?;

    if records.is_empty() {
        println!("{}", format!("No local {} to push", collection).dimmed());
        return Ok(());
    }

    let message = format!("Pushing {}", collection);
    let results = while_syncing(message, client.push_all(collection, &records)).await;

    let failures: Vec<_> = results.iter().filter(|r| !r.success).collect();
    let sent = results.len() - failures.len();

    println!("Pushed {} of {} {} records", sent.green(), results.len(), collection);
    for failure in &failures {
        println!("   {} {}", failure.message.red(), failure.timestamp.dimmed());
    }

    if !failures.is_empty() {
        bail!("{} records failed to sync", failures.len());
    }

    Ok(())
}
