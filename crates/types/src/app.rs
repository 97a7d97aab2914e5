//! Catalog entry types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single app as returned by the catalog lookup/search endpoints.
///
/// Field names mirror the catalog JSON so the struct deserializes from a
/// `results[]` element directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    #[serde(rename = "trackId")]
    pub id: u64,
    #[serde(rename = "bundleId")]
    pub bundle_id: String,
    #[serde(rename = "trackName")]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Catalog price in the store front currency. Absent for some items,
    /// which the catalog treats as free.
    #[serde(default)]
    pub price: f64,
}

impl App {
    /// True for items that can be acquired without payment.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price == 0.0
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.name, self.bundle_id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_from_catalog_json() {
        let json = r#"{
            "trackId": 324684580,
            "bundleId": "com.spotify.client",
            "trackName": "Spotify",
            "version": "9.0.62",
            "price": 0
        }"#;
        let app: App = serde_json::from_str(json).unwrap();
        assert_eq!(app.id, 324_684_580);
        assert_eq!(app.bundle_id, "com.spotify.client");
        assert!(app.is_free());
    }

    #[test]
    fn missing_price_defaults_to_free() {
        let json = r#"{"trackId": 1, "bundleId": "a.b", "trackName": "A"}"#;
        let app: App = serde_json::from_str(json).unwrap();
        assert!(app.is_free());
        assert!(app.version.is_empty());
    }
}
