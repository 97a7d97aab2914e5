use serde::{Deserialize, Serialize};

/// Package patching events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SignatureEvent {
    /// Ownership metadata written into the package
    MetadataAppended { archive: String },

    /// Signature blob written into the package
    SignatureAppended { archive: String, entry: String },
}
