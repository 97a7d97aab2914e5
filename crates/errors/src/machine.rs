//! Device identity error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MachineError {
    #[error("no usable network interface for the device identifier")]
    MacAddressUnavailable,

    #[error("device identifier lookup failed: {message}")]
    LookupFailed { message: String },
}

impl UserFacingError for MachineError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("Pin a device identifier in the config under [store] guid.")
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::MacAddressUnavailable => "error.machine.mac_address_unavailable",
            Self::LookupFailed { .. } => "error.machine.lookup_failed",
        })
    }
}
