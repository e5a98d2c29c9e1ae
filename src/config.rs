//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `monitor.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - StoreConfig: where the readings live (REST url, table, api key).
//!     - PollingConfig: how often the store is queried, and how many rows.
//!     - ChartConfig: how many readings each chart plots.
//!     - ServerConfig: where the dashboard is served.
//!     - LoggingConfig: log level and per-poll console output.
//!
//! store credentials can be overridden with ENVMON_STORE_URL and
//! ENVMON_STORE_KEY so they never have to live in the file.
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::{CHART_POINTS, WINDOW_LIMIT};

pub const ENV_STORE_URL: &str = "ENVMON_STORE_URL";
pub const ENV_STORE_KEY: &str = "ENVMON_STORE_KEY";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// project base url, e.g. "https://xyz.supabase.co"
    pub url: String,
    pub table: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_seconds: u64,
    pub limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub points: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            table: "sensor_data".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_seconds: 5, limit: WINDOW_LIMIT }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { points: CHART_POINTS }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl MonitorConfig {
    /// Parse configuration from toml text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: MonitorConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::from_toml(&content)
    }

    /// Load with default fallback, then apply environment overrides
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("config").join("monitor.toml"),
            std::path::PathBuf::from("..").join("config").join("monitor.toml"),
        ];

        let mut config = None;
        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(loaded) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        config = Some(loaded);
                        break;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            println!("[CONFIG] Warning: No config file found - using defaults");
            Self::default()
        });
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Override store credentials from the environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.is_empty()) {
            self.store.url = url;
        }
        if let Some(key) = lookup(ENV_STORE_KEY).filter(|v| !v.is_empty()) {
            self.store.api_key = key;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.polling.interval_seconds == 0 {
            bail!("polling.interval_seconds must be at least 1");
        }
        if self.polling.limit == 0 {
            bail!("polling.limit must be at least 1");
        }
        if self.chart.points == 0 {
            bail!("chart.points must be at least 1");
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let store = if self.store.url.is_empty() { "(not set)" } else { self.store.url.as_str() };
        println!("┌─────────────────────────────────────────┐");
        println!("│          MONITOR CONFIGURATION          │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Store: {}", store);
        println!("│ Table: {}", self.store.table);
        println!("│ Poll Interval: {}s", self.polling.interval_seconds);
        println!("│ Window: {} rows, {} charted", self.polling.limit, self.chart.points);
        println!("│ Dashboard: {}", self.server.bind);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
