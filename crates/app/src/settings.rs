//! Handles settings for the application. Configuration is written in
//! `settings.toml`.
//!
//! See `settings.toml.example` for the expected layout.
use config::{Config, ConfigError, File};
use serde::Deserialize;

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Path to the SQLite file; omit for an in-memory database.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settlement {
    pub url: String,
    pub invoice_key: String,
    pub admin_key: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Treasury {
    pub withdraw_fee_sats: Option<i64>,
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub settlement: Settlement,
    #[serde(default)]
    pub treasury: Treasury,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
