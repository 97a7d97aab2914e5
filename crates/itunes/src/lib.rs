#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Public catalog client for ipakit
//!
//! Thin JSON client for the public lookup and search endpoints. Unlike the
//! store protocol this API is unauthenticated and versionless; the only
//! shared piece is the country code, which callers usually derive from the
//! signed-in account's store front.

mod client;

pub use client::{CatalogClient, CATALOG_BASE_URL};
