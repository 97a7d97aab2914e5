//! File download with progress reporting and verification

use futures::StreamExt;
use ipakit_errors::{Error, NetworkError};
use ipakit_events::{AppEvent, DownloadEvent, EventEmitter, EventSender};
use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::NetClient;

/// Download operation handle
pub struct Download {
    url: Url,
}

/// Result of a download operation
#[derive(Debug)]
pub struct DownloadResult {
    pub url: String,
    pub size: u64,
    /// Lowercase hex MD5 of the downloaded bytes.
    pub md5: String,
}

impl Download {
    /// Create a new download
    ///
    /// # Errors
    ///
    /// Returns an error if the provided URL is invalid.
    pub fn new(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        Ok(Self { url })
    }

    /// Execute the download
    ///
    /// Streams into `dest` with a `.download` extension and renames into
    /// place once the content is complete and verified. On checksum
    /// mismatch the partial file is removed and nothing lands at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns an
    /// error status, the checksum does not match, or there are I/O errors
    /// while writing.
    pub async fn execute(
        self,
        client: &NetClient,
        dest: &Path,
        expected_md5: Option<&str>,
        tx: &EventSender,
    ) -> Result<DownloadResult, Error> {
        let url_str = self.url.to_string();

        let response = client.get(url_str.as_str()).await?;

        if !response.status().is_success() {
            return Err(NetworkError::HttpError {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            }
            .into());
        }

        let content_length = response.content_length();

        tx.emit_download_started(url_str.clone(), content_length);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = dest.with_extension("download");
        let mut file = File::create(&temp_path).await?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let mut hasher = Md5::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;

            hasher.update(&chunk);
            file.write_all(&chunk).await?;

            downloaded += chunk.len() as u64;
            tx.emit_download_progress(url_str.clone(), downloaded, content_length);
        }

        file.flush().await?;
        drop(file);

        let md5 = format!("{:x}", hasher.finalize());

        if let Some(expected) = expected_md5 {
            if !md5.eq_ignore_ascii_case(expected) {
                let _ = tokio::fs::remove_file(&temp_path).await;

                tx.emit(AppEvent::Download(DownloadEvent::ChecksumMismatch {
                    url: url_str.clone(),
                    expected: expected.to_lowercase(),
                    actual: md5.clone(),
                }));

                return Err(NetworkError::ChecksumMismatch {
                    expected: expected.to_lowercase(),
                    actual: md5,
                }
                .into());
            }
        }

        tokio::fs::rename(&temp_path, dest).await?;

        tx.emit_download_completed(url_str.clone(), downloaded);

        Ok(DownloadResult {
            url: url_str,
            size: downloaded,
            md5,
        })
    }
}
