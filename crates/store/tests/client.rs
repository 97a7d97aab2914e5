//! Store client flow tests against a scripted transport.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use ipakit_errors::{Error, NetworkError, StoreError};
use ipakit_events::{channel, AppEvent, EventReceiver, StoreEvent};
use ipakit_net::{HttpRequest, HttpResponse, Transport};
use ipakit_store::StoreClient;
use ipakit_types::{Account, Credentials};

const GUID: &str = "AABBCC001122";

const ACCOUNT_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>accountInfo</key>
    <dict>
        <key>address</key>
        <dict>
            <key>firstName</key><string>Jane</string>
            <key>lastName</key><string>Appleseed</string>
        </dict>
    </dict>
    <key>passwordToken</key><string>token123</string>
    <key>dsPersonId</key><string>123456789</string>
</dict>
</plist>"#;

const INVALID_CREDENTIALS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>failureType</key><string>-5000</string>
    <key>customerMessage</key><string>Your account information was entered incorrectly.</string>
</dict>
</plist>"#;

const CODE_REQUIRED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>failureType</key><string></string>
    <key>customerMessage</key><string>MZFinance.BadLogin.Configurator_message</string>
</dict>
</plist>"#;

const RECEIPT_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>status</key><integer>0</integer>
    <key>jingleDocType</key><string>purchaseSuccess</string>
</dict>
</plist>"#;

const RECEIPT_FAILED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>status</key><integer>2059</integer>
    <key>jingleDocType</key><string>failure</string>
</dict>
</plist>"#;

const TOKEN_EXPIRED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>failureType</key><string>2034</string>
</dict>
</plist>"#;

const LICENSE_REQUIRED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>failureType</key><string>9610</string>
</dict>
</plist>"#;

const ITEM_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>songList</key>
    <array>
        <dict>
            <key>URL</key><string>https://iosapps.itunes.apple.com/itunes-assets/app.ipa</string>
            <key>md5</key><string>0cc175b9c0f1b6a831c399e269772661</string>
            <key>sinfs</key>
            <array>
                <dict>
                    <key>id</key><integer>0</integer>
                    <key>sinf</key><data>c2luZi1ieXRlcw==</data>
                </dict>
            </array>
            <key>metadata</key>
            <dict>
                <key>softwareVersionBundleId</key><string>com.spotify.client</string>
            </dict>
        </dict>
    </array>
</dict>
</plist>"#;

#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    fn scripted(responses: impl IntoIterator<Item = HttpResponse>) -> SharedTransport {
        SharedTransport(Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }))
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Clonable handle to one shared `MockTransport`; the orphan rule forbids
/// implementing `Transport` on `Arc<MockTransport>` directly.
#[derive(Clone)]
struct SharedTransport(Arc<MockTransport>);

impl std::ops::Deref for SharedTransport {
    type Target = MockTransport;

    fn deref(&self) -> &MockTransport {
        &self.0
    }
}

#[async_trait]
impl Transport for SharedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| NetworkError::EmptyResponse.into())
    }
}

fn ok_body(body: &str) -> HttpResponse {
    HttpResponse::new(200, HashMap::new(), Bytes::from(body.to_string()))
}

fn ok_body_with_store_front(body: &str, store_front: &str) -> HttpResponse {
    let headers = HashMap::from([(
        "X-Set-Apple-Store-Front".to_string(),
        store_front.to_string(),
    )]);
    HttpResponse::new(200, headers, Bytes::from(body.to_string()))
}

fn server_error() -> HttpResponse {
    HttpResponse::new(
        500,
        HashMap::new(),
        Bytes::from_static(b"Internal Server Error"),
    )
}

fn account() -> Account {
    Account {
        email: "user@example.com".into(),
        name: "Jane Appleseed".into(),
        password_token: "tok".into(),
        directory_services_id: "12345".into(),
        store_front: "143441-1,29".into(),
    }
}

fn store_events(rx: &mut EventReceiver) -> Vec<StoreEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::Store(event) = event {
            out.push(event);
        }
    }
    out
}

#[tokio::test]
async fn authenticate_returns_account_and_captures_store_front() {
    let transport = MockTransport::scripted([ok_body_with_store_front(ACCOUNT_OK, "143441-1,29")]);
    let client = StoreClient::new(transport.clone(), GUID);

    let credentials = Credentials::new("user@example.com", "hunter2");
    let account = client.authenticate(&credentials).await.unwrap();

    assert_eq!(account.email, "user@example.com");
    assert_eq!(account.name, "Jane Appleseed");
    assert_eq!(account.password_token, "token123");
    assert_eq!(account.directory_services_id, "123456789");
    assert_eq!(account.store_front, "143441-1,29");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].url.starts_with("https://p25-buy.itunes.apple.com/"));
}

#[tokio::test]
async fn authenticate_with_code_talks_to_the_code_front_end() {
    let transport = MockTransport::scripted([ok_body(ACCOUNT_OK)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let credentials = Credentials::new("user@example.com", "hunter2").with_auth_code("123456");
    let account = client.authenticate(&credentials).await.unwrap();

    // No store front header in the response leaves the field empty.
    assert_eq!(account.store_front, "");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].url.starts_with("https://p71-buy.itunes.apple.com/"));
}

#[tokio::test]
async fn authenticate_retries_once_after_rejected_credentials() {
    let transport = MockTransport::scripted([ok_body(INVALID_CREDENTIALS), ok_body(ACCOUNT_OK)]);
    let (tx, mut rx) = channel();
    let client = StoreClient::new(transport.clone(), GUID).with_events(tx);

    let credentials = Credentials::new("user@example.com", "hunter2");
    let account = client.authenticate(&credentials).await.unwrap();
    assert_eq!(account.password_token, "token123");
    assert_eq!(transport.sent().len(), 2);

    let events = store_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::AuthenticationRetried { .. })));
}

#[tokio::test]
async fn authenticate_surfaces_a_second_rejection() {
    let transport =
        MockTransport::scripted([ok_body(INVALID_CREDENTIALS), ok_body(INVALID_CREDENTIALS)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let credentials = Credentials::new("user@example.com", "wrong");
    let err = client.authenticate(&credentials).await.unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::InvalidCredentials)));
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test]
async fn authenticate_does_not_retry_when_a_code_is_required() {
    let transport = MockTransport::scripted([ok_body(CODE_REQUIRED)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let credentials = Credentials::new("user@example.com", "hunter2");
    let err = client.authenticate(&credentials).await.unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::CodeRequired)));
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn authenticate_rejects_unexpected_shapes() {
    let transport = MockTransport::scripted([ok_body(RECEIPT_OK)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let credentials = Credentials::new("user@example.com", "hunter2");
    let err = client.authenticate(&credentials).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Store(StoreError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn purchase_succeeds_on_a_clean_receipt() {
    let transport = MockTransport::scripted([ok_body(RECEIPT_OK)]);
    let (tx, mut rx) = channel();
    let client = StoreClient::new(transport.clone(), GUID).with_events(tx);

    client.purchase(&account(), 324_684_580, "US").await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].url,
        "https://buy.itunes.apple.com/WebObjects/MZBuy.woa/wa/buyProduct"
    );

    let events = store_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::Purchased { app_id: 324_684_580 })));
}

#[tokio::test]
async fn purchase_maps_server_error_to_duplicate_license() {
    let transport = MockTransport::scripted([server_error()]);
    let client = StoreClient::new(transport.clone(), GUID);

    let err = client
        .purchase(&account(), 324_684_580, "US")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::DuplicateLicense)));
}

#[tokio::test]
async fn purchase_surfaces_failing_receipts() {
    let transport = MockTransport::scripted([ok_body(RECEIPT_FAILED)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let err = client
        .purchase(&account(), 324_684_580, "US")
        .await
        .unwrap_err();

    match err {
        Error::Store(StoreError::PurchaseFailed {
            status_code,
            status_type,
        }) => {
            assert_eq!(status_code, 2059);
            assert_eq!(status_type, "failure");
        }
        other => panic!("expected purchase failure, got {other:?}"),
    }
}

#[tokio::test]
async fn purchase_surfaces_an_expired_password_token() {
    let transport = MockTransport::scripted([ok_body(TOKEN_EXPIRED)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let err = client
        .purchase(&account(), 324_684_580, "US")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Store(StoreError::PasswordTokenExpired)
    ));
}

#[tokio::test]
async fn purchase_rejects_unknown_countries_without_sending() {
    let transport = MockTransport::scripted([]);
    let client = StoreClient::new(transport.clone(), GUID);

    let err = client
        .purchase(&account(), 324_684_580, "XX")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Store(StoreError::UnknownStorefront { .. })
    ));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn download_grant_tolerates_an_existing_license() {
    let transport = MockTransport::scripted([server_error(), ok_body(ITEM_OK)]);
    let (tx, mut rx) = channel();
    let client = StoreClient::new(transport.clone(), GUID).with_events(tx);

    let item = client
        .download_grant(&account(), 324_684_580, "US")
        .await
        .unwrap();

    assert_eq!(
        item.url,
        "https://iosapps.itunes.apple.com/itunes-assets/app.ipa"
    );
    assert_eq!(item.md5, "0cc175b9c0f1b6a831c399e269772661");
    assert_eq!(item.sinfs.len(), 1);

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].url.ends_with("/buyProduct"));
    assert!(sent[1]
        .url
        .contains("/volumeStoreDownloadProduct?guid=AABBCC001122"));

    let events = store_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::LicenseExists { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::GrantIssued { .. })));
}

#[tokio::test]
async fn download_grant_purchases_first_when_unlicensed() {
    let transport = MockTransport::scripted([ok_body(RECEIPT_OK), ok_body(ITEM_OK)]);
    let (tx, mut rx) = channel();
    let client = StoreClient::new(transport.clone(), GUID).with_events(tx);

    client
        .download_grant(&account(), 324_684_580, "US")
        .await
        .unwrap();

    let events = store_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::Purchased { .. })));
}

#[tokio::test]
async fn download_grant_surfaces_a_missing_license() {
    let transport = MockTransport::scripted([server_error(), ok_body(LICENSE_REQUIRED)]);
    let client = StoreClient::new(transport.clone(), GUID);

    let err = client
        .download_grant(&account(), 324_684_580, "US")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::LicenseRequired)));
}
