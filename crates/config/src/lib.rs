#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for ipakit
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/ipakit/config.toml)
//! - Environment variables
//! - CLI flags

use ipakit_errors::{ConfigError, Error};
use ipakit_types::{ColorChoice, DeviceFamily, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub keychain: KeychainConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// Store front and device identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// ISO 3166-1 alpha-2 country code of the account's store front.
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub device_family: DeviceFamily,
    /// Pinned device identifier. When unset the identifier is derived from
    /// the primary network interface.
    #[serde(default)]
    pub guid: Option<String>,
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeychainConfig {
    /// Override for the encrypted credential file location.
    pub path: Option<PathBuf>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300, // 5 minutes
            retries: 3,
            retry_delay: 1, // 1 second
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            device_family: DeviceFamily::default(),
            guid: None,
        }
    }
}

// Default value functions for serde

fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_country() -> String {
    "US".to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("ipakit").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: &Option<PathBuf>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // IPAKIT_OUTPUT
        if let Ok(output) = std::env::var("IPAKIT_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "IPAKIT_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // IPAKIT_COLOR
        if let Ok(color) = std::env::var("IPAKIT_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "IPAKIT_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // IPAKIT_COUNTRY
        if let Ok(country) = std::env::var("IPAKIT_COUNTRY") {
            if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidValue {
                    field: "IPAKIT_COUNTRY".to_string(),
                    value: country,
                }
                .into());
            }
            self.store.country = country.to_ascii_uppercase();
        }

        // IPAKIT_GUID
        if let Ok(guid) = std::env::var("IPAKIT_GUID") {
            if guid.is_empty() || !guid.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidValue {
                    field: "IPAKIT_GUID".to_string(),
                    value: guid,
                }
                .into());
            }
            self.store.guid = Some(guid.to_ascii_uppercase());
        }

        Ok(())
    }

    /// Get the credential store path (with default)
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the system config
    /// directory cannot be determined.
    pub fn keychain_path(&self) -> Result<PathBuf, Error> {
        if let Some(path) = &self.keychain.path {
            return Ok(path.clone());
        }
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("ipakit").join("auth.enc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn load_from_file_parses_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\ncountry = \"GB\"\n\n[network]\ntimeout = 60\n"
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.store.country, "GB");
        assert_eq!(config.network.timeout, 60);
        // Untouched sections keep defaults
        assert_eq!(config.network.retries, 3);
        assert_eq!(config.general.default_output, OutputFormat::Tty);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = Config::load_from_file(Path::new("/nonexistent/config.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store\ncountry = ").unwrap();

        let err = Config::load_from_file(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.store.country, "US");
        assert_eq!(config.network.timeout, 300);
        assert!(config.store.guid.is_none());
    }
}
