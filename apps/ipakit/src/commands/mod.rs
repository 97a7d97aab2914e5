//! Command implementations
//!
//! Each command resolves its inputs (session, country, device family),
//! drives the library crates, and returns a [`CommandOutput`] for the
//! display layer to render.

pub mod auth;
pub mod download;
pub mod lookup;
pub mod purchase;
pub mod search;

use ipakit_config::Config;
use ipakit_errors::{Error, KeychainError};
use ipakit_events::EventSender;
use ipakit_itunes::CatalogClient;
use ipakit_keychain::{load_account, EncryptedFileStore};
use ipakit_net::{NetClient, NetConfig};
use ipakit_store::StoreClient;
use ipakit_types::{country_for_store_front, Account, App, DeviceFamily};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Shared state for command execution
pub struct CommandContext {
    config: Config,
    tx: EventSender,
    interactive: bool,
}

impl CommandContext {
    pub fn new(config: Config, tx: EventSender, interactive: bool) -> Self {
        Self {
            config,
            tx,
            interactive,
        }
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn events(&self) -> &EventSender {
        &self.tx
    }

    /// HTTP client configured from the network section.
    fn net(&self) -> Result<NetClient, Error> {
        let config = NetConfig {
            timeout: Duration::from_secs(self.config.network.timeout),
            retry_count: self.config.network.retries,
            retry_delay: Duration::from_secs(self.config.network.retry_delay),
            ..NetConfig::default()
        };
        NetClient::new(config)
    }

    fn device_guid(&self) -> Result<String, Error> {
        ipakit_machine::resolve_guid(self.config.store.guid.as_deref())
    }

    fn credential_store(&self) -> Result<EncryptedFileStore, Error> {
        let path = self.config.keychain_path()?;
        let guid = self.device_guid()?;
        Ok(EncryptedFileStore::new(path, &guid))
    }

    fn store_client(&self, net: NetClient) -> Result<StoreClient<NetClient>, Error> {
        let guid = self.device_guid()?;
        Ok(StoreClient::new(net, guid).with_events(self.tx.clone()))
    }

    fn catalog_client(&self, net: NetClient) -> CatalogClient<NetClient> {
        CatalogClient::new(net)
    }

    /// The stored session. Commands that talk to the store proper cannot
    /// run without one.
    async fn require_account(&self) -> Result<Account, Error> {
        let store = self.credential_store()?;
        load_account(&store)
            .await?
            .ok_or_else(|| KeychainError::NoAccount.into())
    }

    /// The stored session if one is readable. Catalog queries work without
    /// a session, so credential store problems are not fatal here.
    async fn stored_account(&self) -> Option<Account> {
        let store = self.credential_store().ok()?;
        load_account(&store).await.ok().flatten()
    }

    /// Country precedence: explicit flag, then the signed-in store front,
    /// then the configured default.
    fn resolve_country(&self, flag: Option<&str>, account: Option<&Account>) -> String {
        if let Some(country) = flag {
            return country.to_ascii_uppercase();
        }
        if let Some(country) = account.and_then(|a| country_for_store_front(&a.store_front)) {
            return country.to_string();
        }
        self.config.store.country.clone()
    }

    fn resolve_device_family(&self, flag: Option<DeviceFamily>) -> DeviceFamily {
        flag.unwrap_or(self.config.store.device_family)
    }
}

/// Result payload of a command, rendered by the display layer
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutput {
    Account(AccountSummary),
    Revoked { name: String },
    App(App),
    AppList(Vec<App>),
    Purchase(PurchaseOutcome),
    Download(DownloadReport),
}

/// Stored-session view. Deliberately never carries the password token or
/// the directory services identifier; `auth info` output must not leak
/// session secrets.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub email: String,
    pub store_front: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
            store_front: account.store_front.clone(),
            country: country_for_store_front(&account.store_front).map(str::to_string),
        }
    }
}

/// Outcome of the purchase command
#[derive(Debug, Serialize)]
pub struct PurchaseOutcome {
    pub app_id: u64,
    pub bundle_id: String,
    pub name: String,
    pub already_licensed: bool,
}

/// Outcome of the download command
#[derive(Debug, Serialize)]
pub struct DownloadReport {
    pub bundle_id: String,
    pub name: String,
    pub version: String,
    pub output: PathBuf,
    pub size: u64,
    pub md5: String,
}
