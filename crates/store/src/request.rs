//! Store request builders
//!
//! Every payload is an XML property list. Content types differ per
//! endpoint and do not always match the body encoding: sign-in and
//! download grants go out under a form-urlencoded content type, purchases
//! under `application/x-apple-plist`. The builders list the content type
//! as an explicit header so it overrides the payload default.

use std::collections::BTreeMap;

use ipakit_errors::{Error, StoreError};
use ipakit_net::{HttpRequest, Payload, STORE_USER_AGENT};
use ipakit_types::{store_front_for_country, Credentials};

use crate::endpoint::StoreEndpoint;

fn base_request(endpoint: &StoreEndpoint<'_>) -> HttpRequest {
    HttpRequest::post(endpoint.url())
        .header("User-Agent", STORE_USER_AGENT)
        .header("Content-Type", "application/x-www-form-urlencoded")
}

/// Sign-in request. The attempt marker and host prefix depend on whether a
/// verification code is present; the code is concatenated onto the
/// password.
pub(crate) fn authenticate(credentials: &Credentials, guid: &str) -> HttpRequest {
    let code = credentials.auth_code.as_deref();
    let endpoint = StoreEndpoint::Authenticate {
        prefix: if code.is_none() { "p25" } else { "p71" },
        guid,
    };

    let mut pairs = BTreeMap::new();
    pairs.insert("appleId".to_string(), credentials.email.clone());
    pairs.insert(
        "attempt".to_string(),
        if code.is_none() { "4" } else { "2" }.to_string(),
    );
    pairs.insert("createSession".to_string(), "true".to_string());
    pairs.insert("guid".to_string(), guid.to_string());
    pairs.insert(
        "password".to_string(),
        format!("{}{}", credentials.password, code.unwrap_or("")),
    );
    pairs.insert("rmp".to_string(), "0".to_string());
    pairs.insert("why".to_string(), "signIn".to_string());

    base_request(&endpoint).payload(Payload::Plist(pairs))
}

/// License purchase request for a free item.
///
/// # Errors
///
/// Returns [`StoreError::UnknownStorefront`] when the country has no store
/// front mapping; no request is sent in that case.
pub(crate) fn purchase(
    app_id: u64,
    directory_services_id: &str,
    password_token: &str,
    country: &str,
    guid: &str,
) -> Result<HttpRequest, Error> {
    let store_front =
        store_front_for_country(country).ok_or_else(|| StoreError::UnknownStorefront {
            country: country.to_string(),
        })?;

    let mut pairs = BTreeMap::new();
    pairs.insert("appExtVrsId".to_string(), "0".to_string());
    pairs.insert("hasAskedToFulfillPreorder".to_string(), "true".to_string());
    pairs.insert("buyWithoutAuthorization".to_string(), "true".to_string());
    pairs.insert("hasDoneAgeCheck".to_string(), "true".to_string());
    pairs.insert("guid".to_string(), guid.to_string());
    pairs.insert("needDiv".to_string(), "0".to_string());
    pairs.insert("origPage".to_string(), format!("Software-{app_id}"));
    pairs.insert("origPageLocation".to_string(), "Buy".to_string());
    pairs.insert("price".to_string(), "0".to_string());
    pairs.insert("pricingParameters".to_string(), "STDQ".to_string());
    pairs.insert("productType".to_string(), "C".to_string());
    pairs.insert("salableAdamId".to_string(), app_id.to_string());

    Ok(base_request(&StoreEndpoint::Buy)
        .header("X-Dsid", directory_services_id)
        .header("iCloud-DSID", directory_services_id)
        .header("Content-Type", "application/x-apple-plist")
        .header("X-Apple-Store-Front", store_front)
        .header("X-Token", password_token)
        .payload(Payload::Plist(pairs)))
}

/// Download grant request for an already licensed item.
pub(crate) fn download(app_id: u64, directory_services_id: &str, guid: &str) -> HttpRequest {
    let endpoint = StoreEndpoint::Download { guid };

    let mut pairs = BTreeMap::new();
    pairs.insert("creditDisplay".to_string(), String::new());
    pairs.insert("guid".to_string(), guid.to_string());
    pairs.insert("salableAdamId".to_string(), app_id.to_string());

    base_request(&endpoint)
        .header("X-Dsid", directory_services_id)
        .header("iCloud-DSID", directory_services_id)
        .payload(Payload::Plist(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipakit_errors::Error;

    fn payload_pairs(request: &HttpRequest) -> BTreeMap<String, String> {
        match &request.payload {
            Some(Payload::Plist(pairs)) => pairs.clone(),
            other => panic!("expected plist payload, got {other:?}"),
        }
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn authenticate_without_code_marks_attempt_four() {
        let credentials = Credentials::new("user@example.com", "hunter2");
        let request = authenticate(&credentials, "AABBCC001122");

        assert!(request.url.starts_with("https://p25-buy.itunes.apple.com/"));
        assert!(request.url.ends_with("?guid=AABBCC001122"));

        let pairs = payload_pairs(&request);
        assert_eq!(pairs["appleId"], "user@example.com");
        assert_eq!(pairs["attempt"], "4");
        assert_eq!(pairs["password"], "hunter2");
        assert_eq!(pairs["createSession"], "true");
        assert_eq!(pairs["guid"], "AABBCC001122");
        assert_eq!(pairs["rmp"], "0");
        assert_eq!(pairs["why"], "signIn");

        assert_eq!(header(&request, "User-Agent"), Some(STORE_USER_AGENT));
        assert_eq!(
            header(&request, "Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn authenticate_with_code_concatenates_password_and_switches_host() {
        let credentials = Credentials::new("user@example.com", "hunter2").with_auth_code("123456");
        let request = authenticate(&credentials, "AABBCC001122");

        assert!(request.url.starts_with("https://p71-buy.itunes.apple.com/"));

        let pairs = payload_pairs(&request);
        assert_eq!(pairs["attempt"], "2");
        assert_eq!(pairs["password"], "hunter2123456");
    }

    #[test]
    fn purchase_carries_identity_headers_and_fixed_flags() {
        let request = purchase(324_684_580, "12345", "tok", "US", "AABBCC001122").unwrap();

        assert_eq!(
            request.url,
            "https://buy.itunes.apple.com/WebObjects/MZBuy.woa/wa/buyProduct"
        );
        assert_eq!(header(&request, "X-Dsid"), Some("12345"));
        assert_eq!(header(&request, "iCloud-DSID"), Some("12345"));
        assert_eq!(header(&request, "X-Token"), Some("tok"));
        assert_eq!(header(&request, "X-Apple-Store-Front"), Some("143441"));
        assert_eq!(
            header(&request, "Content-Type"),
            Some("application/x-apple-plist")
        );

        let pairs = payload_pairs(&request);
        assert_eq!(pairs["salableAdamId"], "324684580");
        assert_eq!(pairs["origPage"], "Software-324684580");
        assert_eq!(pairs["price"], "0");
        assert_eq!(pairs["pricingParameters"], "STDQ");
        assert_eq!(pairs["productType"], "C");
        assert_eq!(pairs["buyWithoutAuthorization"], "true");
    }

    #[test]
    fn purchase_rejects_unknown_country_before_sending() {
        let err = purchase(1, "12345", "tok", "XX", "AABBCC001122").unwrap_err();
        assert!(matches!(
            err,
            Error::Store(StoreError::UnknownStorefront { .. })
        ));
    }

    #[test]
    fn download_keeps_urlencoded_content_type() {
        let request = download(324_684_580, "12345", "AABBCC001122");

        assert!(request
            .url
            .contains("/WebObjects/MZFinance.woa/wa/volumeStoreDownloadProduct"));
        assert!(request.url.ends_with("?guid=AABBCC001122"));
        assert_eq!(header(&request, "X-Dsid"), Some("12345"));
        assert_eq!(
            header(&request, "Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(header(&request, "X-Token"), None);

        let pairs = payload_pairs(&request);
        assert_eq!(pairs["creditDisplay"], "");
        assert_eq!(pairs["salableAdamId"], "324684580");
    }
}
