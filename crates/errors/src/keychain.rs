//! Credential store error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeychainError {
    #[error("no stored account; not signed in")]
    NoAccount,

    #[error("credential store is corrupt: {message}")]
    Corrupt { message: String },

    #[error("credential decryption failed")]
    DecryptFailed,

    #[error("credential encryption failed")]
    EncryptFailed,

    #[error("credential store io failed at {path}: {message}")]
    Io { path: String, message: String },
}

impl UserFacingError for KeychainError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoAccount => Some("Sign in first with `ipakit auth login`."),
            Self::Corrupt { .. } | Self::DecryptFailed => {
                Some("Run `ipakit auth revoke` and sign in again.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NoAccount => "error.keychain.no_account",
            Self::Corrupt { .. } => "error.keychain.corrupt",
            Self::DecryptFailed => "error.keychain.decrypt_failed",
            Self::EncryptFailed => "error.keychain.encrypt_failed",
            Self::Io { .. } => "error.keychain.io",
        })
    }
}
