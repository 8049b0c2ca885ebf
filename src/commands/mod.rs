pub mod check;
pub mod config;
pub mod context;
pub mod events;
pub mod export;
pub mod pull;
pub mod push;
pub mod remove;

use anyhow::{Result, bail};
use hillfoots_core::config::ParishConfig;
use hillfoots_core::store::JsonDirStore;
use hillfoots_sheets::SheetsClient;

/// Load the config and open the local data directory.
fn open() -> Result<(ParishConfig, JsonDirStore)> {
    let config = ParishConfig::load()?;
    let store = JsonDirStore::new(config.data_path());
    Ok((config, store))
}

fn sheets_client(config: &ParishConfig) -> Result<SheetsClient> {
    let Some(url) = config.sheets_url.as_deref() else {
        bail!(
            "No spreadsheet configured.\n\n\
            Set the Apps Script URL with:\n  \
            hillfoots config --sheets-url https://script.google.com/macros/s/<id>/exec"
        );
    };

    Ok(SheetsClient::new(url)?)
}
