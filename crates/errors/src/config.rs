//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("invalid config: {message}")]
    ParseError { message: String },

    #[error("invalid value {value} for {field}")]
    InvalidValue { field: String, value: String },

    #[error("could not determine the config directory")]
    NoConfigDir,
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ParseError { .. } | Self::InvalidValue { .. } => {
                Some("Check ~/.config/ipakit/config.toml for syntax errors.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "error.config.not_found",
            Self::ParseError { .. } => "error.config.parse_error",
            Self::InvalidValue { .. } => "error.config.invalid_value",
            Self::NoConfigDir => "error.config.no_config_dir",
        })
    }
}
