//! Global parish configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::date_range::DEFAULT_CONTEXT_DAYS;
use crate::error::{ParishError, ParishResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/hillfoots";
static DEFAULT_PARISH_NAME: &str = "East Hillfoots Parish";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_parish_name() -> String {
    DEFAULT_PARISH_NAME.to_string()
}

fn default_context_days() -> i64 {
    DEFAULT_CONTEXT_DAYS
}

/// Configuration at ~/.config/hillfoots/config.toml.
///
/// Every key can be overridden from the environment with a `HILLFOOTS_`
/// prefix, e.g. `HILLFOOTS_SHEETS_URL`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParishConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Apps Script web app endpoint (ends in `/exec`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets_url: Option<String>,

    #[serde(default = "default_parish_name")]
    pub parish_name: String,

    /// Days of upcoming events included in the chat context.
    #[serde(default = "default_context_days")]
    pub context_days: i64,
}

impl Default for ParishConfig {
    fn default() -> Self {
        ParishConfig {
            data_dir: default_data_dir(),
            sheets_url: None,
            parish_name: default_parish_name(),
            context_days: default_context_days(),
        }
    }
}

impl ParishConfig {
    pub fn config_path() -> ParishResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ParishError::Config("Could not determine config directory".into()))?
            .join("hillfoots");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template on first run.
    pub fn load() -> ParishResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> ParishResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let config: ParishConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("HILLFOOTS"))
            .build()
            .map_err(|e| ParishError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ParishError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> ParishResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ParishError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ParishError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ParishResult<()> {
        let contents = format!(
            "\
# hillfoots configuration

# Where local copies of the parish sheets are kept:
# data_dir = \"{}\"

# Google Apps Script web app URL for the parish spreadsheet:
# sheets_url = \"https://script.google.com/macros/s/.../exec\"

# Name used when talking to visitors:
# parish_name = \"{}\"

# Days of upcoming events given to the assistant:
# context_days = {}
",
            DEFAULT_DATA_DIR, DEFAULT_PARISH_NAME, DEFAULT_CONTEXT_DAYS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ParishError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ParishError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
