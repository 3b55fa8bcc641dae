//! Layered configuration for the terminal viewer.
//!
//! Values come from built-in defaults, then an optional settings file (any
//! format the `config` crate recognises by extension, usually TOML), then
//! `ASSET_TABLE_*` environment variables. Command-line flags are applied on
//! top by the binary.
//!
//! ```toml
//! page_size = 25
//! search_debounce_ms = 300
//! state_file = "~/.local/state/asset-table.json"
//! theme = "dark"
//! log_file = "asset-table.log"
//! log_level = "debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Environment variable prefix, e.g. `ASSET_TABLE_PAGE_SIZE=50`.
pub const ENV_PREFIX: &str = "ASSET_TABLE";

/// Terminal colour scheme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Pick light or dark from the terminal background.
    #[default]
    Auto,
    Dark,
    Light,
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub page_size: usize,
    pub search_debounce_ms: u64,
    /// File holding persisted table layouts.
    pub state_file: PathBuf,
    pub empty_message: String,
    pub theme: ThemeMode,
    /// Log destination. Logging is off when unset, since the terminal is
    /// owned by the UI.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 10,
            search_debounce_ms: 300,
            state_file: PathBuf::from("asset-table-state.json"),
            empty_message: "No records found".to_string(),
            theme: ThemeMode::Auto,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings, layering `path` (if given) and the environment over
    /// the defaults. A missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("page_size", defaults.page_size as i64)?
            .set_default("search_debounce_ms", defaults.search_debounce_ms as i64)?
            .set_default("state_file", defaults.state_file.to_string_lossy().into_owned())?
            .set_default("empty_message", defaults.empty_message)?
            .set_default("theme", "auto")?
            .set_default("log_level", defaults.log_level)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        if settings.page_size == 0 {
            anyhow::bail!("page_size must be greater than zero");
        }
        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
