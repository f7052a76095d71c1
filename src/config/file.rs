//! Configuration file management for viva.
//!
//! This module handles loading application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Backend API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the recruiting API, e.g. "https://vtb-aihr.ru/api"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://vtb-aihr.ru/api".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Microphone capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `viva list-devices`
    /// - device name from `viva list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz (the device's native rate is used if it differs)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Reference level in dBFS for 100% meter display (typical: -20 to -6 dBFS)
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_reference_level_db() -> i8 {
    -20
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            reference_level_db: default_reference_level_db(),
        }
    }
}

/// Interview session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterviewConfig {
    /// Countdown length when a question's response time cannot be looked up
    #[serde(default = "default_response_time_secs")]
    pub default_response_time_secs: u32,
    /// Stop and submit the recording when the countdown runs out
    #[serde(default)]
    pub auto_submit_on_expiry: bool,
    /// Play interviewer audio as soon as a prompt arrives
    #[serde(default)]
    pub autoplay_prompts: bool,
    /// Final message appended once the backend reports the interview result
    #[serde(default = "default_thank_you_message")]
    pub thank_you_message: String,
}

fn default_response_time_secs() -> u32 {
    120
}

fn default_thank_you_message() -> String {
    "Thank you! Your interview is complete. The recruiting team will be in touch.".to_string()
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            default_response_time_secs: default_response_time_secs(),
            auto_submit_on_expiry: false,
            autoplay_prompts: false,
            thank_you_message: default_thank_you_message(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VivaConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

impl VivaConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut config: VivaConfig = toml::from_str(content)?;
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        if config.api.base_url.is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        Ok(config)
    }
}

/// Returns the path to the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("viva");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("viva.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = VivaConfig::parse("").unwrap();
        assert_eq!(config, VivaConfig::default());
        assert_eq!(config.interview.default_response_time_secs, 120);
        assert!(!config.interview.auto_submit_on_expiry);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = VivaConfig::parse(
            r#"
            [api]
            base_url = "http://localhost:8000/api/"

            [interview]
            auto_submit_on_expiry = true
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_secs, 60);
        assert!(config.interview.auto_submit_on_expiry);
        assert_eq!(config.audio.device, "default");
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(VivaConfig::parse("[api]\nbase_url = \"/\"").is_err());
    }

    #[test]
    fn bundled_template_matches_defaults() {
        let template = include_str!("../../environments/viva.toml");
        assert_eq!(VivaConfig::parse(template).unwrap(), VivaConfig::default());
    }

    #[test]
    fn load_from_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = VivaConfig::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
