use ipakit_errors::{Error, NetworkError, StoreError};
use ipakit_net::{HttpRequest, Transport};
use ipakit_types::{App, DeviceFamily};
use serde::Deserialize;

pub const CATALOG_BASE_URL: &str = "https://itunes.apple.com";

/// Envelope around catalog results. The count field the API sends is
/// redundant with the result list, so only the list is decoded.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    results: Vec<App>,
}

/// Client for the catalog lookup and search endpoints.
pub struct CatalogClient<T: Transport> {
    transport: T,
    base_url: String,
}

impl<T: Transport> CatalogClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: CATALOG_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host. Tests use this to talk to a
    /// local mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve a bundle identifier to its catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AppNotFound`] when the catalog has no entry
    /// for the bundle identifier in the given country.
    pub async fn lookup(
        &self,
        bundle_id: &str,
        country: &str,
        device_family: DeviceFamily,
    ) -> Result<App, Error> {
        let url = self.endpoint_url(
            "/lookup",
            &[
                ("media", "software"),
                ("bundleId", bundle_id),
                ("limit", "1"),
                ("country", country),
                ("entity", device_family.entity()),
            ],
        )?;
        let apps = self.fetch(url).await?;
        apps.into_iter()
            .next()
            .ok_or_else(|| StoreError::AppNotFound.into())
    }

    /// Full-text search over the catalog.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors; an empty result list is not an
    /// error for a search.
    pub async fn search(
        &self,
        term: &str,
        limit: u32,
        country: &str,
        device_family: DeviceFamily,
    ) -> Result<Vec<App>, Error> {
        let limit = limit.to_string();
        let url = self.endpoint_url(
            "/search",
            &[
                ("media", "software"),
                ("term", term),
                ("limit", &limit),
                ("country", country),
                ("entity", device_family.entity()),
            ],
        )?;
        self.fetch(url).await
    }

    fn endpoint_url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, Error> {
        let mut url = ipakit_net::parse_url(&format!("{}{path}", self.base_url))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url.into())
    }

    async fn fetch(&self, url: String) -> Result<Vec<App>, Error> {
        let response = self.transport.send(HttpRequest::get(url)).await?;
        if response.status != 200 {
            return Err(NetworkError::HttpError {
                status: response.status,
                message: "catalog request failed".to_string(),
            }
            .into());
        }

        let decoded: CatalogResponse =
            serde_json::from_slice(&response.body).map_err(|e| StoreError::DecodeFailed {
                message: e.to_string(),
            })?;
        Ok(decoded.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_results() {
        let decoded: CatalogResponse = serde_json::from_str(r#"{"resultCount": 0}"#).unwrap();
        assert!(decoded.results.is_empty());
    }

    #[test]
    fn envelope_ignores_extra_fields() {
        let decoded: CatalogResponse = serde_json::from_str(
            r#"{
                "resultCount": 1,
                "results": [{
                    "trackId": 1,
                    "bundleId": "a.b",
                    "trackName": "A",
                    "artistName": "Someone",
                    "sellerUrl": "https://example.com"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(decoded.results.len(), 1);
        assert_eq!(decoded.results[0].bundle_id, "a.b");
    }
}
