#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package signature patcher for ipakit
//!
//! A freshly downloaded package is not installable: the official client
//! adds the purchaser's identity and a server-issued signature blob before
//! the package runs on a device. This crate replays both mutations on a
//! local archive using the data a download grant carries.
//!
//! The two steps are additive and independent; neither rewrites existing
//! entries. An archive that went through only one of them is incomplete,
//! which the caller reports when a step fails.

mod client;

pub use client::SignatureClient;
