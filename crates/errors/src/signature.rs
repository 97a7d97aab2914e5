//! App package (ipa) patching error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignatureError {
    #[error("invalid app package: {message}")]
    InvalidArchive { message: String },

    #[error("no archive entry matches suffix {suffix}")]
    EntryNotFound { suffix: String },

    #[error("app bundle name could not be derived from {path}")]
    InvalidBundle { path: String },

    #[error("signature manifest is malformed: {message}")]
    MalformedManifest { message: String },

    #[error("no applicable signature for the package")]
    MissingSignature,

    #[error("failed to write archive entry {entry}: {message}")]
    ArchiveWrite { entry: String, message: String },

    #[error("plist encoding failed: {message}")]
    PlistEncoding { message: String },
}

impl UserFacingError for SignatureError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArchive { .. } | Self::EntryNotFound { .. } => {
                Some("The downloaded package looks corrupt; retry the download.")
            }
            Self::MissingSignature | Self::MalformedManifest { .. } => {
                Some("The store returned an unusable signature set; retry the download grant.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ArchiveWrite { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidArchive { .. } => "error.signature.invalid_archive",
            Self::EntryNotFound { .. } => "error.signature.entry_not_found",
            Self::InvalidBundle { .. } => "error.signature.invalid_bundle",
            Self::MalformedManifest { .. } => "error.signature.malformed_manifest",
            Self::MissingSignature => "error.signature.missing_signature",
            Self::ArchiveWrite { .. } => "error.signature.archive_write",
            Self::PlistEncoding { .. } => "error.signature.plist_encoding",
        })
    }
}
