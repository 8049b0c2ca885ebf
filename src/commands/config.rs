use anyhow::{Result, bail};
use hillfoots_core::config::ParishConfig;
use hillfoots_sheets::sanitize_url;
use owo_colors::OwoColorize;

pub fn run(sheets_url: Option<String>) -> Result<()> {
    let config_path = ParishConfig::config_path()?;
    let mut config = ParishConfig::load_from(&config_path)?;

    if let Some(url) = sheets_url {
        let url = sanitize_url(&url);
        if !url.contains("/exec") {
            bail!("URL must end in /exec");
        }
        config.sheets_url = Some(url);
        config.save_to(&config_path)?;
        println!("{}", "Saved spreadsheet URL".green());
    }

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!("  Data:    {}", config.data_path().display());

    println!("{}", "Settings".bold());
    println!("  Parish:       {}", config.parish_name);
    println!("  Context days: {}", config.context_days);
    match &config.sheets_url {
        Some(url) => println!("  Spreadsheet:  {}", url),
        None => println!("  Spreadsheet:  {}", "not configured".dimmed()),
    }

    Ok(())
}
