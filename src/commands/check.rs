use anyhow::{Result, bail};
use hillfoots_sheets::SyncApi;
use owo_colors::OwoColorize;

use crate::utils::tui::{endpoint_label, while_syncing};

pub async fn run() -> Result<()> {
    let (config, _) = super::open()?;
    let client = super::sheets_client(&config)?;

    let message = format!("Checking {}", endpoint_label(client.url()));
    let result = while_syncing(message, client.test_connection()).await;

    println!("{}", client.url());

    if !result.success {
        bail!("{} ({})", result.message, result.timestamp);
    }

    println!("   {} {}", result.message.green(), result.timestamp.dimmed());
    Ok(())
}
