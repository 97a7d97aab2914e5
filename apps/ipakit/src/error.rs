//! CLI error handling

use std::fmt;

use ipakit_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(ipakit_errors::ConfigError),
    /// Library operation error
    Operation(ipakit_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Operation(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Operation(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<ipakit_errors::ConfigError> for CliError {
    fn from(e: ipakit_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ipakit_errors::Error> for CliError {
    fn from(e: ipakit_errors::Error) -> Self {
        // Config problems keep their own rendering even when wrapped
        match e {
            ipakit_errors::Error::Config(config) => CliError::Config(config),
            other => CliError::Operation(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipakit_errors::{Error, StoreError};

    #[test]
    fn operation_errors_render_code_and_hint() {
        let err = CliError::from(Error::Store(StoreError::PasswordTokenExpired));
        let rendered = err.to_string();
        assert!(rendered.contains("Code: error.store.password_token_expired"));
        assert!(rendered.contains("Hint:"));
    }

    #[test]
    fn config_errors_unwrap_from_the_umbrella() {
        let err = CliError::from(Error::Config(ipakit_errors::ConfigError::NoConfigDir));
        assert!(matches!(err, CliError::Config(_)));
    }
}
