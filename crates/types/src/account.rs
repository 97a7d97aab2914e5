//! Account and credential records

use serde::{Deserialize, Serialize};
use std::fmt;

/// A signed-in store account.
///
/// Produced by a successful authenticate call and persisted by the
/// credential store. The password token is a bearer secret; `Debug` and
/// `Display` keep it out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub name: String,
    #[serde(rename = "passwordToken")]
    pub password_token: String,
    #[serde(rename = "directoryServicesId")]
    pub directory_services_id: String,
    /// Value of the `X-Set-Apple-Store-Front` response header, when the
    /// backend sent one. Includes the platform suffix (e.g. "143441-1,29").
    #[serde(rename = "storeFront", default)]
    pub store_front: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_token", &"<redacted>")
            .field("directory_services_id", &self.directory_services_id)
            .field("store_front", &self.store_front)
            .finish()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}

/// Sign-in input. The verification code is absent on the first attempt and
/// filled in when the backend asks for one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub auth_code: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            auth_code: None,
        }
    }

    #[must_use]
    pub fn with_auth_code(mut self, code: impl Into<String>) -> Self {
        self.auth_code = Some(code.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("auth_code", &self.auth_code.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}
