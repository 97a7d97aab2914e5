use serde::{Deserialize, Serialize};

/// Store protocol events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// Sign-in request sent
    AuthenticationStarted { email: String },

    /// First sign-in attempt was rejected; retrying once
    AuthenticationRetried { email: String },

    /// Sign-in succeeded
    Authenticated { email: String, store_front: String },

    /// Purchase request sent for an item
    PurchaseStarted { app_id: u64 },

    /// The account already holds a license for the item
    LicenseExists { app_id: u64 },

    /// Purchase receipt confirmed
    Purchased { app_id: u64 },

    /// Download grant requested for an item
    GrantRequested { app_id: u64 },

    /// Download grant issued with the package URL
    GrantIssued { app_id: u64, url: String },
}
