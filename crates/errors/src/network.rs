//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("rate limited, retry after {seconds}s")]
    RateLimited { seconds: u64 },

    #[error("request encoding failed: {0}")]
    EncodingFailed(String),

    #[error("empty response body")]
    EmptyResponse,
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) | Self::DownloadFailed(_) => {
                Some("Check your network connection and retry.")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The downloaded file was corrupted in transit; retry the download.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionRefused(_)
                | Self::DownloadFailed(_)
                | Self::ChecksumMismatch { .. }
                | Self::RateLimited { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "error.network.timeout",
            Self::DownloadFailed(_) => "error.network.download_failed",
            Self::ConnectionRefused(_) => "error.network.connection_refused",
            Self::InvalidUrl(_) => "error.network.invalid_url",
            Self::HttpError { .. } => "error.network.http",
            Self::ChecksumMismatch { .. } => "error.network.checksum_mismatch",
            Self::RateLimited { .. } => "error.network.rate_limited",
            Self::EncodingFailed(_) => "error.network.encoding_failed",
            Self::EmptyResponse => "error.network.empty_response",
        })
    }
}
