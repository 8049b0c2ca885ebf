mod commands;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use hillfoots_core::ParishLocation;
use hillfoots_core::date_range::{DateRange, LocationFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hillfoots")]
#[command(about = "Browse, export and sync the East Hillfoots parish calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List event occurrences, grouped by day
    Events {
        /// Show events from this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Show events until this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only show events for one church
        #[arg(short, long)]
        location: Option<Church>,

        /// Print "add to calendar" links under each event
        #[arg(long)]
        links: bool,
    },
    /// Export occurrences as an .ics calendar
    Export {
        /// Export events from this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Export events until this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the upcoming-events context given to the parish assistant
    Context {
        /// Days ahead to include (defaults to context_days from the config)
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=36_500))]
        days: Option<i64>,

        /// Print the full assistant instruction instead of the event list
        #[arg(long)]
        prompt: bool,
    },
    /// Fetch every collection from the parish spreadsheet
    Pull,
    /// Send a local collection to the parish spreadsheet
    Push {
        /// Collection name, e.g. "events" or "subscriber"
        collection: String,
    },
    /// Delete one local record by id, e.g. `remove groups g-12`
    Remove {
        /// Collection name, e.g. "events" or "knowledge"
        collection: String,

        /// Id of the record to delete
        id: String,
    },
    /// Remove a newsletter subscriber by email address
    Unsubscribe {
        email: String,
    },
    /// Check that the spreadsheet script is reachable
    Check,
    /// Show configuration paths and settings
    Config {
        /// Save the spreadsheet script URL (must end in /exec)
        #[arg(long)]
        sheets_url: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Church {
    Dollar,
    Muckhart,
}

impl From<Church> for ParishLocation {
    fn from(church: Church) -> Self {
        match church {
            Church::Dollar => ParishLocation::Dollar,
            Church::Muckhart => ParishLocation::Muckhart,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Events {
            from,
            to,
            location,
            links,
        } => {
            let range = DateRange::from_args(from.as_deref(), to.as_deref(), today)?;
            let filter = location.map_or_else(LocationFilter::default, |church| {
                LocationFilter::only(church.into())
            });
            commands::events::run(range, filter, links, today)
        }
        Commands::Export { from, to, output } => {
            let range = DateRange::from_args(from.as_deref(), to.as_deref(), today)?;
            commands::export::run(range, output)
        }
        Commands::Context { days, prompt } => commands::context::run(days, prompt, today),
        Commands::Pull => commands::pull::run().await,
        Commands::Push { collection } => commands::push::run(&collection).await,
        Commands::Remove { collection, id } => commands::remove::run(&collection, &id),
        Commands::Unsubscribe { email } => commands::remove::unsubscribe(&email),
        Commands::Check => commands::check::run().await,
        Commands::Config { sheets_url } => commands::config::run(sheets_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_days_must_be_in_range() {
        let cli = Cli::try_parse_from(["hillfoots", "context", "--days", "14"]).unwrap();
        assert!(matches!(cli.command, Commands::Context { days: Some(14), .. }));

        assert!(Cli::try_parse_from(["hillfoots", "context", "--days", "-1"]).is_err());
        assert!(Cli::try_parse_from(["hillfoots", "context", "--days", "9999999999"]).is_err());
    }

    #[test]
    fn test_remove_takes_collection_and_id() {
        let cli = Cli::try_parse_from(["hillfoots", "remove", "groups", "g-12"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Remove { ref collection, ref id } if collection == "groups" && id == "g-12"
        ));
    }
}
