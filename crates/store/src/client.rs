//! Store protocol client
//!
//! Drives the authenticate, purchase, and download-grant flows over a
//! [`Transport`]. The transport never turns HTTP statuses into errors, so
//! the client sees every response and can give protocol meaning to status
//! codes; the purchase endpoint answers 500 when the account already holds
//! a license.

use ipakit_errors::{Error, StoreError};
use ipakit_events::{AppEvent, EventEmitter, EventSender, StoreEvent};
use ipakit_net::Transport;
use ipakit_types::{Account, Credentials};

use crate::request;
use crate::response::{Item, StoreResponse};

/// One sign-in retry is sanctioned after rejected credentials; everything
/// else fails on the first answer.
const MAX_AUTH_ATTEMPTS: u32 = 2;

/// Outcome of a buy call, before the caller decides whether an existing
/// license is an error or business as usual.
enum BuyOutcome {
    Purchased,
    AlreadyLicensed,
}

pub struct StoreClient<T: Transport> {
    transport: T,
    guid: String,
    tx: Option<EventSender>,
}

impl<T: Transport> StoreClient<T> {
    pub fn new(transport: T, guid: impl Into<String>) -> Self {
        Self {
            transport,
            guid: guid.into(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Machine identifier sent with every protocol call.
    #[must_use]
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Sign in and produce an [`Account`].
    ///
    /// Retries exactly once when the first attempt comes back as invalid
    /// credentials; any later rejection, including a second invalid
    /// credentials answer, surfaces to the caller. The store front the
    /// backend assigns at sign-in is captured from the response headers.
    ///
    /// # Errors
    ///
    /// Returns protocol failures (invalid credentials, verification code
    /// required, locked account), decode errors, or transport errors.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Account, Error> {
        self.emit(AppEvent::Store(StoreEvent::AuthenticationStarted {
            email: credentials.email.clone(),
        }));

        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = request::authenticate(credentials, &self.guid);
            let response = self.transport.send(request).await?;
            let store_front = response
                .header("x-set-apple-store-front")
                .unwrap_or_default()
                .to_string();

            match StoreResponse::decode(&response.body)? {
                StoreResponse::Account(info) => {
                    self.emit(AppEvent::Store(StoreEvent::Authenticated {
                        email: credentials.email.clone(),
                        store_front: store_front.clone(),
                    }));
                    return Ok(Account {
                        email: credentials.email.clone(),
                        name: format!("{} {}", info.first_name, info.last_name),
                        password_token: info.password_token,
                        directory_services_id: info.directory_services_id,
                        store_front,
                    });
                }
                StoreResponse::Failure(StoreError::InvalidCredentials)
                    if attempt < MAX_AUTH_ATTEMPTS =>
                {
                    self.emit(AppEvent::Store(StoreEvent::AuthenticationRetried {
                        email: credentials.email.clone(),
                    }));
                }
                StoreResponse::Failure(err) => return Err(err.into()),
                _ => {
                    return Err(StoreError::InvalidResponse {
                        expected: "account".to_string(),
                    }
                    .into())
                }
            }
        }
    }

    /// Acquire a zero-cost license for an item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateLicense`] when the account already
    /// holds a license, [`StoreError::PurchaseFailed`] on a failing
    /// receipt, and protocol failures such as an expired password token or
    /// a price mismatch as-is.
    pub async fn purchase(
        &self,
        account: &Account,
        app_id: u64,
        country: &str,
    ) -> Result<(), Error> {
        self.emit(AppEvent::Store(StoreEvent::PurchaseStarted { app_id }));
        match self.buy(account, app_id, country).await? {
            BuyOutcome::Purchased => {
                self.emit(AppEvent::Store(StoreEvent::Purchased { app_id }));
                Ok(())
            }
            BuyOutcome::AlreadyLicensed => Err(StoreError::DuplicateLicense.into()),
        }
    }

    /// Acquire a license if the account lacks one, then request the
    /// download grant for an item.
    ///
    /// The buy leg is idempotent: an answer of "already licensed" is
    /// expected for repeat downloads and the flow proceeds to the grant
    /// request.
    ///
    /// # Errors
    ///
    /// Returns purchase failures from the buy leg and protocol failures
    /// (missing license, invalid item, expired token) from the grant leg.
    pub async fn download_grant(
        &self,
        account: &Account,
        app_id: u64,
        country: &str,
    ) -> Result<Item, Error> {
        self.emit(AppEvent::Store(StoreEvent::PurchaseStarted { app_id }));
        match self.buy(account, app_id, country).await? {
            BuyOutcome::Purchased => {
                self.emit(AppEvent::Store(StoreEvent::Purchased { app_id }));
            }
            BuyOutcome::AlreadyLicensed => {
                self.emit(AppEvent::Store(StoreEvent::LicenseExists { app_id }));
            }
        }

        self.emit(AppEvent::Store(StoreEvent::GrantRequested { app_id }));
        let request = request::download(app_id, &account.directory_services_id, &self.guid);
        let response = self.transport.send(request).await?;

        match StoreResponse::decode(&response.body)? {
            StoreResponse::Item(item) => {
                self.emit(AppEvent::Store(StoreEvent::GrantIssued {
                    app_id,
                    url: item.url.clone(),
                }));
                Ok(item)
            }
            StoreResponse::Failure(err) => Err(err.into()),
            _ => Err(StoreError::InvalidResponse {
                expected: "download grant".to_string(),
            }
            .into()),
        }
    }

    async fn buy(
        &self,
        account: &Account,
        app_id: u64,
        country: &str,
    ) -> Result<BuyOutcome, Error> {
        let request = request::purchase(
            app_id,
            &account.directory_services_id,
            &account.password_token,
            country,
            &self.guid,
        )?;
        let response = self.transport.send(request).await?;

        // The purchase endpoint reports an existing license as a plain
        // server error, not as a decodable failure.
        if response.status == 500 {
            return Ok(BuyOutcome::AlreadyLicensed);
        }

        match StoreResponse::decode(&response.body)? {
            StoreResponse::Receipt(receipt) if receipt.is_success() => Ok(BuyOutcome::Purchased),
            StoreResponse::Receipt(receipt) => Err(StoreError::PurchaseFailed {
                status_code: receipt.status,
                status_type: receipt.doc_type,
            }
            .into()),
            StoreResponse::Failure(err) => Err(err.into()),
            _ => Err(StoreError::InvalidResponse {
                expected: "purchase receipt".to_string(),
            }
            .into()),
        }
    }
}

impl<T: Transport> EventEmitter for StoreClient<T> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}
