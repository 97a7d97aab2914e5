#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Store protocol client for ipakit
//!
//! Implements the private MZFinance/MZBuy endpoints: account sign-in,
//! license acquisition, and download grants. The client is stateless
//! between calls; callers thread the account identity (DSID and password
//! token) through each operation.
//!
//! The transport is injected through [`ipakit_net::Transport`], so tests
//! drive the full request/response cycle with scripted responses.

mod client;
mod endpoint;
mod request;
mod response;

pub use client::StoreClient;
pub use response::{AccountInfo, Item, Receipt, Sinf, StoreResponse};
