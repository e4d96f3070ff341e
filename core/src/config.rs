//! Handles the configuration of the player.
//!
//! this module is responsible for parsing the Encore.toml file and the `ENCORE_` environment
//! variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use std::{path::PathBuf, str::FromStr};

pub static DEFAULT_CONFIG: &str = include_str!("../Encore.toml");

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// Playback defaults
    #[serde(default)]
    pub player: PlayerSettings,
    /// Play-start reporting
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    /// What level of logging to use.
    /// Default is "info".
    #[serde(default = "default_log_level")]
    #[serde(deserialize_with = "de_log_level")]
    pub log_level: log::LevelFilter,
}

impl Default for Settings {
    #[inline]
    fn default() -> Self {
        Self {
            player: PlayerSettings::default(),
            telemetry: TelemetrySettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from the config file and environment variables.
    ///
    /// The environment variables are prefixed with `ENCORE_`.
    ///
    /// # Arguments
    ///
    /// * `config` - Path to the config file.
    /// * `log_level` - Overrides the configured log level, if set.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config file is not found or if the config file is
    /// invalid.
    #[inline]
    pub fn init(config: PathBuf, log_level: Option<log::LevelFilter>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(config))
            .add_source(Environment::with_prefix("ENCORE"))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if let Some(log_level) = log_level {
            settings.log_level = log_level;
        }

        Ok(settings)
    }

    /// Get the (default) path to the config file.
    /// If the config file does not exist at this path, it will be created with the default config.
    ///
    /// See [`crate::get_config_dir`] for more information about where this default path is located.
    ///
    /// # Errors
    ///
    /// This function will return an error if the system config directory (e.g., `~/.config` on linux) could not be found, or if the config file was missing and could not be created.
    #[inline]
    pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
        match crate::get_config_dir() {
            Ok(config_dir) => Self::ensure_config_file(config_dir),
            Err(e) => {
                log::error!("{e}");
                Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Unable to find the config directory for encore.",
                ))
            }
        }
    }

    fn ensure_config_file(config_dir: PathBuf) -> Result<PathBuf, std::io::Error> {
        // if the config directory does not exist, create it
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }
        let config_file = config_dir.join("Encore.toml");

        if !config_file.exists() {
            std::fs::write(&config_file, DEFAULT_CONFIG)?;
        }

        Ok(config_file)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct PlayerSettings {
    /// Initial volume, clamped to `[0, 1]` when applied.
    /// Default is 1.0.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Whether the player starts muted.
    /// Default is false.
    #[serde(default)]
    pub muted: bool,
}

const fn default_volume() -> f32 {
    1.0
}

impl Default for PlayerSettings {
    #[inline]
    fn default() -> Self {
        Self {
            volume: default_volume(),
            muted: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct TelemetrySettings {
    /// Report a play event each time a track starts.
    /// Default is true.
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
}

const fn default_telemetry_enabled() -> bool {
    true
}

impl Default for TelemetrySettings {
    #[inline]
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
        }
    }
}

fn de_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(log::LevelFilter::from_str(&s).unwrap_or_else(|_| default_log_level()))
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}
