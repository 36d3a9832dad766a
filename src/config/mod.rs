mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./onair.toml",
        "~/.config/onair/config.toml",
        "/etc/onair/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Database path with `~` expanded.
pub fn database_path(config: &Config) -> PathBuf {
    let raw = config.database.path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let playback = &config.playback;
    if playback.slack_ms < 0 {
        anyhow::bail!("playback.slack_ms cannot be negative");
    }
    if playback.offline_cap_ms <= 0 {
        anyhow::bail!("playback.offline_cap_ms must be positive");
    }
    if playback.permanent_offline_ms <= 0 {
        anyhow::bail!("playback.permanent_offline_ms must be positive");
    }
    if playback.error_duration_ms <= 0 {
        anyhow::bail!("playback.error_duration_ms must be positive");
    }

    let throttle = &config.throttle;
    if throttle.enabled {
        if throttle.max_attempts == 0 {
            anyhow::bail!("throttle.max_attempts cannot be 0 while throttling is enabled");
        }
        if throttle.window_secs == 0 {
            anyhow::bail!("throttle.window_secs cannot be 0 while throttling is enabled");
        }
    }
    if throttle.error_duration_ms <= 0 {
        anyhow::bail!("throttle.error_duration_ms must be positive");
    }

    if config.database.path.as_os_str().is_empty() {
        anyhow::bail!("database.path cannot be empty");
    }

    Ok(())
}
