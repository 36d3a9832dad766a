use onair_common::SourceType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub throttle: ThrottleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file (supports `~`)
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("onair.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Timing constants used when resolving what a channel airs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Tolerance around item boundaries and reconnects (default: just under 10s)
    #[serde(default = "default_slack_ms")]
    pub slack_ms: i64,

    /// Longest offline placeholder handed out at once (default: 10 minutes)
    #[serde(default = "default_offline_cap_ms")]
    pub offline_cap_ms: i64,

    /// Placeholder length for channels whose only item is flex (default: 365 days)
    #[serde(default = "default_permanent_offline_ms")]
    pub permanent_offline_ms: i64,

    /// How long a recursive redirect error is shown (default: 60s)
    #[serde(default = "default_error_duration_ms")]
    pub error_duration_ms: i64,

    /// External id sources attached to resolved items (empty: all)
    #[serde(default)]
    pub external_id_sources: Vec<SourceType>,
}

fn default_slack_ms() -> i64 {
    9_999
}

fn default_offline_cap_ms() -> i64 {
    10 * 60 * 1000
}

fn default_permanent_offline_ms() -> i64 {
    365 * 24 * 60 * 60 * 1000
}

fn default_error_duration_ms() -> i64 {
    60_000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            slack_ms: default_slack_ms(),
            offline_cap_ms: default_offline_cap_ms(),
            permanent_offline_ms: default_permanent_offline_ms(),
            error_duration_ms: default_error_duration_ms(),
            external_id_sources: Vec::new(),
        }
    }
}

/// Limits on how often one session may request the same item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_throttle_enabled")]
    pub enabled: bool,

    /// Attempts allowed per window before throttling kicks in
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How long the throttle error item is shown (default: 60s)
    #[serde(default = "default_error_duration_ms")]
    pub error_duration_ms: i64,
}

fn default_throttle_enabled() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    10
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: default_throttle_enabled(),
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
            error_duration_ms: default_error_duration_ms(),
        }
    }
}
