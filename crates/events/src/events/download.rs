use serde::{Deserialize, Serialize};

/// File download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Download started
    Started {
        url: String,
        total_size: Option<u64>,
    },

    /// Download progress update
    Progress {
        url: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// Download completed successfully
    Completed { url: String, final_size: u64 },

    /// Download failed
    Failed { url: String, error: String },

    /// Checksum verification failed; the partial file was removed
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },
}
