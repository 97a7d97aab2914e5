//! Store response classification
//!
//! Every protocol endpoint answers with an XML property list. The payload
//! shape, not the HTTP status, decides what the response means. Shape
//! checks run in a fixed order: account material, then a download grant,
//! then a purchase receipt, then declared failures. Responses that fit no
//! shape are matched against known customer-message phrases as a last
//! resort.

use ipakit_errors::{Error, StoreError};
use plist::{Dictionary, Value};

const MESSAGE_INVALID_CREDENTIALS: &str = "Your account information was entered incorrectly.";
const MESSAGE_CODE_REQUIRED: &str = "An Apple ID verification code is required to sign in. Type your password followed by the verification code shown on your other devices.";
const MESSAGE_BAD_LOGIN: &str = "MZFinance.BadLogin.Configurator_message";
const MESSAGE_LOCKED_ACCOUNT: &str = "This Apple ID has been locked for security reasons. Visit iForgot to reset your account (https://iforgot.apple.com).";

/// A classified store response.
#[derive(Debug, Clone)]
pub enum StoreResponse {
    Account(AccountInfo),
    Item(Item),
    Receipt(Receipt),
    Failure(StoreError),
}

/// Account material from a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub first_name: String,
    pub last_name: String,
    pub directory_services_id: String,
    pub password_token: String,
}

/// A download grant: the package URL, its checksum, the signature set, and
/// the ownership metadata dictionary carried verbatim.
#[derive(Debug, Clone)]
pub struct Item {
    pub url: String,
    pub md5: String,
    pub sinfs: Vec<Sinf>,
    pub metadata: Dictionary,
}

/// One signature record from a download grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sinf {
    pub id: i64,
    pub data: Vec<u8>,
}

/// A purchase receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub status: i64,
    pub doc_type: String,
}

impl Receipt {
    /// Whether the receipt confirms the purchase.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 0 && self.doc_type == "purchaseSuccess"
    }
}

impl StoreResponse {
    /// Decode and classify a response body.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the body is not a property list or a
    /// recognized shape is missing required fields. Declared protocol
    /// failures classify as [`StoreResponse::Failure`], not as errors.
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let value: Value =
            plist::from_bytes(body).map_err(|e| decode_failed(e.to_string()))?;
        let dict = value
            .as_dictionary()
            .ok_or_else(|| decode_failed("response is not a dictionary"))?;
        Self::classify(dict)
    }

    fn classify(dict: &Dictionary) -> Result<Self, Error> {
        if let Some(account_info) = dict.get("accountInfo") {
            return Ok(Self::Account(decode_account(dict, account_info)?));
        }

        if let Some(items) = dict.get("songList").and_then(Value::as_array) {
            if let Some(first) = items.first() {
                return Ok(Self::Item(decode_item(first)?));
            }
        }

        if dict.contains_key("status") {
            return Ok(Self::Receipt(decode_receipt(dict)?));
        }

        let failure_type = dict
            .get("failureType")
            .and_then(Value::as_string)
            .unwrap_or("");
        if !failure_type.is_empty() {
            let code = failure_type.parse::<i64>().unwrap_or(0);
            return Ok(Self::Failure(StoreError::from_failure_code(code)));
        }

        let message = dict
            .get("customerMessage")
            .and_then(Value::as_string)
            .unwrap_or("");
        Ok(Self::Failure(match message {
            MESSAGE_INVALID_CREDENTIALS => StoreError::InvalidCredentials,
            MESSAGE_CODE_REQUIRED | MESSAGE_BAD_LOGIN => StoreError::CodeRequired,
            MESSAGE_LOCKED_ACCOUNT => StoreError::LockedAccount,
            _ => StoreError::Unknown { code: 0 },
        }))
    }
}

fn decode_account(dict: &Dictionary, account_info: &Value) -> Result<AccountInfo, Error> {
    let directory_services_id = required_string(dict, "dsPersonId")?;
    let password_token = required_string(dict, "passwordToken")?;

    let address = account_info
        .as_dictionary()
        .and_then(|info| info.get("address"))
        .and_then(Value::as_dictionary)
        .ok_or_else(|| decode_failed("accountInfo missing address"))?;
    let first_name = required_string(address, "firstName")?;
    let last_name = required_string(address, "lastName")?;

    Ok(AccountInfo {
        first_name,
        last_name,
        directory_services_id,
        password_token,
    })
}

fn decode_item(value: &Value) -> Result<Item, Error> {
    let dict = value
        .as_dictionary()
        .ok_or_else(|| decode_failed("songList element is not a dictionary"))?;

    let md5 = required_string(dict, "md5")?;
    let url = required_string(dict, "URL")?;
    ipakit_net::parse_url(&url).map_err(|_| decode_failed("songList element URL is invalid"))?;

    // The ownership metadata travels into the package verbatim; absence
    // means the item cannot be installed.
    let metadata = dict
        .get("metadata")
        .and_then(Value::as_dictionary)
        .cloned()
        .ok_or(StoreError::InvalidItem)?;

    let sinfs = dict
        .get("sinfs")
        .and_then(Value::as_array)
        .ok_or_else(|| decode_failed("songList element missing sinfs"))?
        .iter()
        .map(decode_sinf)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Item {
        url,
        md5,
        sinfs,
        metadata,
    })
}

fn decode_sinf(value: &Value) -> Result<Sinf, Error> {
    let dict = value
        .as_dictionary()
        .ok_or_else(|| decode_failed("sinf entry is not a dictionary"))?;
    let id = dict
        .get("id")
        .and_then(Value::as_signed_integer)
        .ok_or_else(|| decode_failed("sinf entry missing id"))?;
    let data = dict
        .get("sinf")
        .and_then(Value::as_data)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| decode_failed("sinf entry missing data"))?;
    Ok(Sinf { id, data })
}

fn decode_receipt(dict: &Dictionary) -> Result<Receipt, Error> {
    let status = dict
        .get("status")
        .and_then(Value::as_signed_integer)
        .ok_or_else(|| decode_failed("receipt status is not an integer"))?;
    let doc_type = required_string(dict, "jingleDocType")?;
    Ok(Receipt { status, doc_type })
}

fn required_string(dict: &Dictionary, key: &str) -> Result<String, Error> {
    dict.get(key)
        .and_then(Value::as_string)
        .map(ToString::to_string)
        .ok_or_else(|| decode_failed(format!("missing {key}")))
}

fn decode_failed(message: impl Into<String>) -> Error {
    StoreError::DecodeFailed {
        message: message.into(),
    }
    .into()
}
