use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use ipakit_errors::{Error, KeychainError};
use rand_core::OsRng;
use tokio::fs;

use crate::CredentialStore;

/// Domain separator for the storage key derivation. Changing it invalidates
/// every existing credential file.
const KEY_CONTEXT: &str = "ipakit credential store v1";

const NONCE_LEN: usize = 12;

/// File-backed credential store, encrypted at rest.
///
/// The whole entry map is serialized, sealed with ChaCha20-Poly1305, and
/// written as `nonce || ciphertext` in one atomic replace. The key is
/// derived from the machine identifier, which ties the file to the machine
/// that wrote it.
pub struct EncryptedFileStore {
    path: PathBuf,
    key: [u8; 32],
}

impl EncryptedFileStore {
    pub fn new(path: impl Into<PathBuf>, device_guid: &str) -> Self {
        Self {
            path: path.into(),
            key: blake3::derive_key(KEY_CONTEXT, device_guid.as_bytes()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<HashMap<String, Vec<u8>>, Error> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(io_error(&self.path, &e)),
        };
        if raw.len() < NONCE_LEN {
            return Err(KeychainError::Corrupt {
                message: "file too short to hold a nonce".to_string(),
            }
            .into());
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new((&self.key).into());
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| KeychainError::DecryptFailed)?;

        serde_json::from_slice(&plaintext).map_err(|e| {
            KeychainError::Corrupt {
                message: e.to_string(),
            }
            .into()
        })
    }

    async fn write_entries(&self, entries: &HashMap<String, Vec<u8>>) -> Result<(), Error> {
        let plaintext = serde_json::to_vec(entries).map_err(|_| KeychainError::EncryptFailed)?;
        let cipher = ChaCha20Poly1305::new((&self.key).into());
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| KeychainError::EncryptFailed)?;

        let mut payload = nonce.to_vec();
        payload.extend_from_slice(&ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, &e))?;
        }

        let tmp = self.path.with_extension("enc.tmp");
        fs::write(&tmp, &payload)
            .await
            .map_err(|e| io_error(&tmp, &e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| io_error(&tmp, &e))?;
        }
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, &e))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for EncryptedFileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), Error> {
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_vec());
        self.write_entries(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

fn io_error(path: &Path, e: &io::Error) -> Error {
    KeychainError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
    .into()
}
