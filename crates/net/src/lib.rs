#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for ipakit
//!
//! This crate handles all HTTP operations: the request/response wire model
//! the store protocol client runs on, catalog fetches, and package
//! downloads with checksum verification.

mod client;
mod download;
mod request;

pub use client::{NetClient, NetConfig, STORE_USER_AGENT};
pub use download::{Download, DownloadResult};
pub use request::{HttpRequest, HttpResponse, Payload, Transport};
pub use reqwest::Method;

use ipakit_errors::{Error, NetworkError};
use ipakit_events::{EventEmitter, EventSender};
use std::path::Path;
use url::Url;

/// Download a file with progress reporting and optional MD5 verification
///
/// # Errors
///
/// Returns an error if the URL is invalid, the download fails, the checksum
/// does not match, or there are I/O errors while writing the file.
pub async fn download_file(
    client: &NetClient,
    url: &str,
    dest: &Path,
    expected_md5: Option<&str>,
    tx: &EventSender,
) -> Result<DownloadResult, Error> {
    let download = Download::new(url)?;
    download.execute(client, dest, expected_md5, tx).await
}

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error
/// status, or the response body cannot be decoded as text.
pub async fn fetch_text(client: &NetClient, url: &str, tx: &EventSender) -> Result<String, Error> {
    tx.emit_debug(format!("Fetching text from {url}"));

    let response = client.get(url).await?;

    if !response.status().is_success() {
        return Err(NetworkError::HttpError {
            status: response.status().as_u16(),
            message: response.status().to_string(),
        }
        .into());
    }

    response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()).into())
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
