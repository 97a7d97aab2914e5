//! Request/response wire model for the store protocol
//!
//! Store requests carry string-keyed payloads in one of two encodings. Each
//! encoding implies a default `Content-Type`, and explicitly listed headers
//! are applied after the payload default so a request can override it. The
//! sign-in endpoint depends on this: it sends an XML property-list body
//! under a form-urlencoded content type.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bytes::Bytes;
use ipakit_errors::{Error, NetworkError};
use reqwest::Method;

/// Request payload with its body encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `application/x-www-form-urlencoded` key-value body
    UrlEncoded(BTreeMap<String, String>),
    /// XML property-list body, `application/x-apple-plist` by default
    Plist(BTreeMap<String, String>),
}

impl Payload {
    /// Default `Content-Type` implied by the encoding.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::UrlEncoded(_) => "application/x-www-form-urlencoded",
            Self::Plist(_) => "application/x-apple-plist",
        }
    }

    /// Encode the payload into a request body.
    ///
    /// # Errors
    ///
    /// Returns an error if the property-list serializer fails.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        match self {
            Self::UrlEncoded(pairs) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                serializer.extend_pairs(pairs.iter());
                Ok(serializer.finish().into_bytes())
            }
            Self::Plist(pairs) => {
                let mut body = Vec::new();
                plist::to_writer_xml(&mut body, pairs)
                    .map_err(|e| NetworkError::EncodingFailed(e.to_string()))?;
                Ok(body)
            }
        }
    }
}

/// A single protocol request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Explicit headers, applied after any payload-derived defaults.
    pub headers: Vec<(String, String)>,
    pub payload: Option<Payload>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            payload: None,
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            payload: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// A protocol response with the raw status preserved.
///
/// Transports never turn HTTP error statuses into errors. The store client
/// assigns meaning to statuses (an HTTP 500 from the purchase endpoint is a
/// protocol answer, not a transport failure).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Response headers with lowercased names.
    headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Look up a response header, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// The seam between the store client and the network.
///
/// `NetClient` is the production implementation; tests script responses
/// through their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single request. No retries at this level.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}
