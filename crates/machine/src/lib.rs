#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Device identity for ipakit
//!
//! The store backend keys sessions and download grants to a device
//! identifier (GUID). The identifier is the primary interface MAC address,
//! uppercased with separators stripped, or a value pinned in the config.

use ipakit_errors::{Error, MachineError};

/// Source of the device identifier.
pub trait MachineId: Send + Sync {
    /// The device GUID, uppercase hex without separators.
    ///
    /// # Errors
    ///
    /// Returns an error if no identifier can be derived for this host.
    fn device_guid(&self) -> Result<String, Error>;
}

/// Derives the identifier from the primary network interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareMachineId;

impl MachineId for HardwareMachineId {
    fn device_guid(&self) -> Result<String, Error> {
        let addr = mac_address::get_mac_address()
            .map_err(|e| MachineError::LookupFailed {
                message: e.to_string(),
            })?
            .ok_or(MachineError::MacAddressUnavailable)?;
        Ok(format_guid(&addr.bytes()))
    }
}

/// A pinned identifier, from config or tests.
#[derive(Debug, Clone)]
pub struct FixedMachineId(String);

impl FixedMachineId {
    #[must_use]
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into().to_ascii_uppercase())
    }
}

impl MachineId for FixedMachineId {
    fn device_guid(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

/// Resolve the device GUID, preferring a pinned value over hardware lookup.
///
/// # Errors
///
/// Returns an error if no value is pinned and the hardware lookup fails.
pub fn resolve_guid(pinned: Option<&str>) -> Result<String, Error> {
    match pinned {
        Some(guid) => Ok(guid.to_ascii_uppercase()),
        None => HardwareMachineId.device_guid(),
    }
}

fn format_guid(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut guid, byte| {
            // Infallible for String
            let _ = write!(guid, "{byte:02X}");
            guid
        },
    )
}
