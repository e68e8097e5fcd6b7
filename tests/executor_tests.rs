// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retry, re-authentication and header behavior of the request executor.

use scoutbook_sync::config::Config;
use scoutbook_sync::error::SyncError;
use scoutbook_sync::services::executor::{PROVIDER_ACCEPT, PROVIDER_ORIGIN, PROVIDER_REFERER};
use scoutbook_sync::services::{RateLimiter, RequestExecutor, SessionManager};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{mount_auth, request_count, test_config, AUTH_PATH};

fn executor(config: &Config) -> RequestExecutor {
    let http = reqwest::Client::new();
    let session = Arc::new(SessionManager::new(config, http.clone()));
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_interval));
    RequestExecutor::new(config, http, session, limiter)
}

#[tokio::test]
async fn test_sends_provider_headers_and_bearer_token() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/persons/v2/1/personprofile"))
        .and(header("accept", PROVIDER_ACCEPT))
        .and(header("origin", PROVIDER_ORIGIN))
        .and(header("referer", PROVIDER_REFERER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profile": {"userId": 1}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let exec = executor(&config);
    let body: Value = exec.get("/persons/v2/1/personprofile").await.unwrap();
    assert_eq!(body["profile"]["userId"], 1);

    let requests = server.received_requests().await.unwrap();
    let api_call = requests
        .iter()
        .find(|r| r.url.path() == "/persons/v2/1/personprofile")
        .unwrap();
    let auth = api_call.headers.get("authorization").unwrap().to_str().unwrap();
    assert!(auth.starts_with("Bearer "));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("POST"))
        .and(path("/advancements/events"))
        .and(body_json(json!({"unitId": "121"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let events: Vec<Value> = executor(&config)
        .post("/advancements/events", &json!({"unitId": "121"}))
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_429_then_success_is_retried() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let body: Value = executor(&config).get("/throttled").await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_429_exhausts_retry_budget() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let config = Config {
        max_retries: 2,
        ..test_config(&server)
    };

    Mock::given(method("GET"))
        .and(path("/always-throttled"))
        .respond_with(ResponseTemplate::new(429))
        .expect(u64::from(config.max_retries) + 1)
        .mount(&server)
        .await;

    let err = executor(&config)
        .get::<Value>("/always-throttled")
        .await
        .unwrap_err();
    assert!(err.is_transient());

    match err {
        SyncError::RateLimited { path, attempts } => {
            assert_eq!(path, "/always-throttled");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_backoff_grows_between_retries() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let config = Config {
        max_retries: 2,
        retry_base_delay: Duration::from_millis(40),
        ..test_config(&server)
    };

    Mock::given(method("GET"))
        .and(path("/slow-down"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let _ = executor(&config).get::<Value>("/slow-down").await;

    // 40ms + 80ms of backoff before giving up.
    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn test_401_reauthenticates_once_then_succeeds() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/stale"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fresh": true})))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let body: Value = executor(&config).get("/stale").await.unwrap();

    assert_eq!(body["fresh"], true);
    assert_eq!(request_count(&server, AUTH_PATH).await, 2);
    assert_eq!(request_count(&server, "/stale").await, 2);
}

#[tokio::test]
async fn test_second_401_propagates_without_another_reauth() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = executor(&config)
        .get::<Value>("/forbidden")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Unauthorized { .. }));
    assert!(err.is_auth_error());
    assert_eq!(request_count(&server, AUTH_PATH).await, 2);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = executor(&config).get::<Value>("/broken").await.unwrap_err();
    assert!(!err.is_transient());

    match err {
        SyncError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Http, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = executor(&config).get::<Value>("/garbled").await.unwrap_err();
    assert!(matches!(err, SyncError::Decode(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_network_failure_exhausts_into_network_error() {
    // Nothing listens on the reserved port, so every attempt fails to connect.
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let config = Config {
        api_url: "http://127.0.0.1:9".to_string(),
        max_retries: 1,
        ..test_config(&server)
    };

    let err = executor(&config).get::<Value>("/anything").await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
    assert!(err.is_transient());
}
