//! Common test utilities for support-bundle integration tests

#![allow(dead_code)]

use std::time::Duration;
use support_bundle::RetryConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the support bundle REST endpoint
pub const BUNDLE_PATH: &str = "/api/system/support/bundle";

pub const IN_PROGRESS_BODY: &str = r#"{"status":"in progress"}"#;
pub const SUCCESS_BODY: &str = r#"{"status":"success"}"#;

/// Archive content served by [`mount_artifactory`]
pub const ARCHIVE: &[u8] = b"PK\x03\x04 not really a zip";

/// Upload retries fast enough for tests
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

/// Mount a well-behaved bundle lifecycle for `id`:
/// creation, one "in progress" status, then "success", then the archive.
pub async fn mount_artifactory(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path(BUNDLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(r#"{{"id":"{id}"}}"#)))
        .mount(server)
        .await;

    let status_path = format!("{BUNDLE_PATH}/{id}");
    Mock::given(method("GET"))
        .and(path(status_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_PROGRESS_BODY))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(status_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{status_path}/archive").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ARCHIVE))
        .mount(server)
        .await;
}
