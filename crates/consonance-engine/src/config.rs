use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for consonance.
///
/// Configuration is loaded from multiple sources with the following
/// priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CONSONANCE_* prefix)
/// 3. Config file (~/.config/consonance/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the fingerprint cache file.
    ///
    /// Can be set via:
    /// - CLI: --cache /path/to/fingerprints.json
    /// - ENV: CONSONANCE_CACHE_PATH
    /// - Config: cache_path = "/path/to/fingerprints.json"
    /// - Default: ~/.local/share/consonance/fingerprints.json
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Worker pool size for the distance computation (1-100).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How many matches a search reports by default.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            workers: default_workers(),
            top_n: default_top_n(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for the config file at
    /// `~/.config/consonance/config.toml` and reads environment
    /// variables with the CONSONANCE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be
    /// parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("consonance");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }
}

fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("consonance")
        .join("fingerprints.json")
}

fn default_workers() -> usize {
    15
}

fn default_top_n() -> usize {
    10
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/consonance/config.toml
/// - macOS: ~/Library/Application Support/consonance/config.toml
/// - Windows: %APPDATA%\consonance\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("consonance")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Consonance Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CONSONANCE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the fingerprint cache file.
#
# Holds one fingerprint per indexed audio file. Build it with
# `consonance index <dir>`; searches read it back.
#
# Can also be set via:
# - CLI: consonance --cache /custom/fingerprints.json search target.mp3
# - Environment: CONSONANCE_CACHE_PATH=/custom/fingerprints.json
#
# Default: Platform-specific data directory
#cache_path = "/path/to/fingerprints.json"

# Worker pool size for the distance computation (1-100).
#workers = 15

# How many matches a search reports by default.
#top_n = 10
"#
}

/// Create a default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already
/// existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.cache_path.as_os_str().is_empty());
        assert_eq!(config.workers, 15);
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }
}
