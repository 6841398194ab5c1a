//! Configuration management (~/.config/Klaxon/config.toml)
//!
//! Handles loading, saving, and providing defaults for siren, strobe and
//! output settings. Settings are stored in TOML format in the
//! platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::output::SinkPurpose;
use crate::waveform::WaveformParams;

/// Config file name inside [`config_dir`]
pub const CONFIG_FILE: &str = "config.toml";

/// Errors while reading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config: {0}")]
    Write(#[from] std::io::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Siren waveform and playback settings
    #[serde(default)]
    pub siren: SirenConfig,
    /// Strobe pulse settings
    #[serde(default)]
    pub strobe: StrobeConfig,
    /// Output device routing (cpal adapter)
    #[serde(default)]
    pub output: OutputConfig,
}

/// Siren waveform and playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SirenConfig {
    /// Output sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Low tone frequency in Hz (default: 600)
    #[serde(default = "default_low_hz")]
    pub low_hz: f64,
    /// High tone frequency in Hz (default: 1400)
    #[serde(default = "default_high_hz")]
    pub high_hz: f64,
    /// Duration of each tone segment in milliseconds (default: 350)
    #[serde(default = "default_segment_ms")]
    pub segment_ms: u32,
    /// Peak gain in (0, 1] (default: 0.9)
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Samples per written block; 0 uses the output's minimum (default: 0)
    #[serde(default)]
    pub block_len: usize,
}

/// Strobe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrobeConfig {
    /// Time between torch toggles in milliseconds (default: 80)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

/// Output device names per routing purpose.
///
/// `None` selects the host's default output device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub alert_device: Option<String>,
    #[serde(default)]
    pub in_call_device: Option<String>,
    #[serde(default)]
    pub ringer_device: Option<String>,
}

fn default_sample_rate() -> u32 {
    44_100
}
fn default_low_hz() -> f64 {
    600.0
}
fn default_high_hz() -> f64 {
    1400.0
}
fn default_segment_ms() -> u32 {
    350
}
fn default_amplitude() -> f64 {
    0.9
}
fn default_period_ms() -> u64 {
    80
}

impl Default for SirenConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            low_hz: default_low_hz(),
            high_hz: default_high_hz(),
            segment_ms: default_segment_ms(),
            amplitude: default_amplitude(),
            block_len: 0,
        }
    }
}

impl Default for StrobeConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}

impl SirenConfig {
    pub fn waveform(&self) -> WaveformParams {
        WaveformParams {
            sample_rate: self.sample_rate,
            low_hz: self.low_hz,
            high_hz: self.high_hz,
            segment_ms: self.segment_ms,
            amplitude: self.amplitude,
        }
    }
}

impl StrobeConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl OutputConfig {
    /// Device name configured for a routing purpose
    pub fn device_for(&self, purpose: SinkPurpose) -> Option<&str> {
        match purpose {
            SinkPurpose::Alert => self.alert_device.as_deref(),
            SinkPurpose::InCall => self.in_call_device.as_deref(),
            SinkPurpose::Ringer => self.ringer_device.as_deref(),
        }
    }
}

impl Config {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.siren.waveform().validate()?;
        if self.strobe.period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "strobe.period_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Klaxon\config`
/// On macOS: `~/Library/Application Support/io.klaxon.Klaxon`
/// On Linux: `~/.config/Klaxon`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.klaxon", "", "Klaxon")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the default config file, if a config directory exists.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring config: {}", e);
            Config::default()
        }),
        _ => Config::default(),
    }
}

/// Loads and validates the configuration at `path`.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Saves the configuration to `path`, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Saves the configuration to the platform's configuration directory.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    match config_path() {
        Some(path) => save_to(config, &path),
        None => Ok(()),
    }
}
