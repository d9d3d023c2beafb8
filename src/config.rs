use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::analytics::WatchPolicy;
use crate::constants::{
    BEACON_QUEUE_CAPACITY, DEFAULT_BASE_URL, JITTER_TOLERANCE_SECS, NEAR_END_MIN_DURATION_SECS,
    NEAR_END_MIN_ELAPSED_SECS, NEAR_END_WINDOW_SECS, REQUEST_TIMEOUT_SECS, SEGMENT_SECONDS,
    TICK_INTERVAL_MS, WATCHED_RATIO,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Analytics backend; leave reports go to `{base_url}/{org}/video/{video}/leave`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: f64,

    #[serde(default = "default_watched_ratio")]
    pub watched_ratio: f64,

    #[serde(default = "default_jitter_tolerance")]
    pub jitter_tolerance_secs: f64,

    #[serde(default = "default_near_end_window")]
    pub near_end_window_secs: f64,

    #[serde(default = "default_near_end_min_duration")]
    pub near_end_min_duration_secs: f64,

    #[serde(default = "default_near_end_min_elapsed")]
    pub near_end_min_elapsed_secs: u64,

    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_true")]
    pub beacon_enabled: bool,

    #[serde(default = "default_queue_capacity")]
    pub beacon_queue_capacity: usize,
}

impl Config {
    /// Load the user's config file, writing the defaults out on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.policy()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Validated heuristics for new sessions
    pub fn policy(&self) -> Result<WatchPolicy> {
        let policy = WatchPolicy {
            segment_seconds: self.policy.segment_seconds,
            watched_ratio: self.policy.watched_ratio,
            jitter_tolerance_secs: self.policy.jitter_tolerance_secs,
            near_end_window_secs: self.policy.near_end_window_secs,
            near_end_min_duration_secs: self.policy.near_end_min_duration_secs,
            near_end_min_elapsed: Duration::from_secs(self.policy.near_end_min_elapsed_secs),
            tick_interval: Duration::from_millis(self.policy.tick_interval_ms),
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("heatwatch").join("config.toml"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            segment_seconds: default_segment_seconds(),
            watched_ratio: default_watched_ratio(),
            jitter_tolerance_secs: default_jitter_tolerance(),
            near_end_window_secs: default_near_end_window(),
            near_end_min_duration_secs: default_near_end_min_duration(),
            near_end_min_elapsed_secs: default_near_end_min_elapsed(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            beacon_enabled: default_true(),
            beacon_queue_capacity: default_queue_capacity(),
        }
    }
}

// Default value functions
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_request_timeout() -> u64 { REQUEST_TIMEOUT_SECS }
fn default_segment_seconds() -> f64 { SEGMENT_SECONDS }
fn default_watched_ratio() -> f64 { WATCHED_RATIO }
fn default_jitter_tolerance() -> f64 { JITTER_TOLERANCE_SECS }
fn default_near_end_window() -> f64 { NEAR_END_WINDOW_SECS }
fn default_near_end_min_duration() -> f64 { NEAR_END_MIN_DURATION_SECS }
fn default_near_end_min_elapsed() -> u64 { NEAR_END_MIN_ELAPSED_SECS }
fn default_tick_interval() -> u64 { TICK_INTERVAL_MS }
fn default_true() -> bool { true }
fn default_queue_capacity() -> usize { BEACON_QUEUE_CAPACITY }
