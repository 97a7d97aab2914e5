#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Credential storage for ipakit
//!
//! Persists the signed-in account between invocations. The file-backed
//! store encrypts at rest with a key derived from the machine identifier,
//! so a copied credential file is useless on another machine. Only the CLI
//! touches this crate; the protocol clients take an [`Account`] by value
//! and never read storage themselves.

mod encrypted;
mod memory;

pub use encrypted::EncryptedFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use ipakit_errors::{Error, KeychainError};
use ipakit_types::Account;

/// Storage key under which the serialized account lives.
pub const ACCOUNT_KEY: &str = "account";

/// A small keyed credential store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch a stored value, `None` when the key has never been set.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Store a value, replacing any previous one.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), Error>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// Load the stored account, if any.
///
/// # Errors
///
/// Returns [`KeychainError::Corrupt`] when stored bytes no longer parse as
/// an account.
pub async fn load_account(store: &dyn CredentialStore) -> Result<Option<Account>, Error> {
    match store.get(ACCOUNT_KEY).await? {
        Some(raw) => {
            let account = serde_json::from_slice(&raw).map_err(|e| KeychainError::Corrupt {
                message: e.to_string(),
            })?;
            Ok(Some(account))
        }
        None => Ok(None),
    }
}

/// Persist the account.
///
/// # Errors
///
/// Returns storage errors from the underlying store.
pub async fn save_account(store: &dyn CredentialStore, account: &Account) -> Result<(), Error> {
    let raw = serde_json::to_vec(account).map_err(|e| KeychainError::Corrupt {
        message: e.to_string(),
    })?;
    store.set(ACCOUNT_KEY, &raw).await
}

/// Forget the stored account, reporting whether one existed.
///
/// # Errors
///
/// Returns storage errors from the underlying store.
pub async fn delete_account(store: &dyn CredentialStore) -> Result<bool, Error> {
    let existed = store.get(ACCOUNT_KEY).await?.is_some();
    store.delete(ACCOUNT_KEY).await?;
    Ok(existed)
}
