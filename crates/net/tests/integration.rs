//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use ipakit_events::{channel, AppEvent, DownloadEvent};
    use ipakit_net::{download_file, fetch_text, HttpRequest, NetClient, Payload, Transport};
    use md5::{Digest, Md5};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn md5_hex(content: &[u8]) -> String {
        format!("{:x}", Md5::digest(content))
    }

    #[tokio::test]
    async fn test_download_file() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        // Mock response
        let content = b"test file content";
        let mock = server.mock(|when, then| {
            when.method(GET).path("/test.ipa");
            then.status(200)
                .header("content-length", content.len().to_string())
                .body(content);
        });

        // Setup
        let temp = tempdir().unwrap();
        let dest = temp.path().join("downloaded.ipa");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/test.ipa");

        // Download
        let result = download_file(&client, &url, &dest, None, &tx)
            .await
            .unwrap();

        // Verify
        mock.assert();
        assert_eq!(result.size, content.len() as u64);
        assert_eq!(result.md5, md5_hex(content));

        let downloaded = tokio::fs::read(&dest).await.unwrap();
        assert_eq!(downloaded, content);

        // Check events
        let mut saw_start = false;
        let mut saw_complete = false;

        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Download(DownloadEvent::Started { .. }) => saw_start = true,
                AppEvent::Download(DownloadEvent::Completed { .. }) => saw_complete = true,
                _ => {}
            }
        }

        assert!(saw_start);
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn test_download_with_md5_verification() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let content = b"verified content";
        let expected = md5_hex(content);

        server.mock(|when, then| {
            when.method(GET).path("/verified.ipa");
            then.status(200).body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("verified.ipa");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/verified.ipa");

        // Download with correct checksum
        let result = download_file(&client, &url, &dest, Some(&expected), &tx)
            .await
            .unwrap();
        assert_eq!(result.md5, expected);

        // Download with wrong checksum should fail and leave nothing behind
        let dest2 = temp.path().join("wrong.ipa");
        let error = download_file(
            &client,
            &url,
            &dest2,
            Some("00000000000000000000000000000000"),
            &tx,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            error,
            ipakit_errors::Error::Network(ipakit_errors::NetworkError::ChecksumMismatch { .. })
        ));
        assert!(!dest2.exists());
        assert!(!dest2.with_extension("download").exists());
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let content = "Hello, world!";
        server.mock(|when, then| {
            when.method(GET).path("/text");
            then.status(200)
                .header("content-type", "text/plain")
                .body(content);
        });

        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/text");

        let text = fetch_text(&client, &url, &tx).await.unwrap();
        assert_eq!(text, content);
    }

    #[tokio::test]
    async fn test_http_error_handling() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/404");
            then.status(404).body("Not Found");
        });

        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/404");

        let error = fetch_text(&client, &url, &tx).await.unwrap_err();
        assert!(matches!(
            error,
            ipakit_errors::Error::Network(ipakit_errors::NetworkError::HttpError {
                status: 404,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_transport_header_overrides_payload_default() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/authenticate")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_contains("<plist");
            then.status(200).body("ok");
        });

        let client = NetClient::with_defaults().unwrap();

        let mut pairs = BTreeMap::new();
        pairs.insert("appleId".to_string(), "user@example.com".to_string());
        let request = HttpRequest::post(server.url("/authenticate"))
            .payload(Payload::Plist(pairs))
            .header("Content-Type", "application/x-www-form-urlencoded");

        let response = client.send(request).await.unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_transport_preserves_error_statuses() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/buyProduct");
            then.status(500)
                .header("x-set-apple-store-front", "143441-1,29")
                .body("failure");
        });

        let client = NetClient::with_defaults().unwrap();
        let request = HttpRequest::post(server.url("/buyProduct"));

        // HTTP 500 must come back as a response, not an error
        let response = client.send(request).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(
            response.header("X-Set-Apple-Store-Front"),
            Some("143441-1,29")
        );
        assert_eq!(&response.body[..], b"failure");
    }
}
