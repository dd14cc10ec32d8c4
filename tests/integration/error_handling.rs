//! Integration tests for error handling

use crate::integration::mock_server::MockServerFixture;
use neverbounce_rust::client::{RequestParams, AUTH_NOT_CONFIGURED};
use neverbounce_rust::{ApiErrorKind, Error, VerifyOptions};
use reqwest::Method;
use serde_json::json;

#[tokio::test]
async fn test_throttle_is_typed() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "GET",
            "/single/check",
            vec![],
            json!({
                "status": "throttle_triggered",
                "message": "Too many requests in a short amount of time",
                "execution_time": 41
            }),
        )
        .await;

    let err = fixture
        .client()
        .verify("a@example.com", &VerifyOptions::default())
        .await
        .unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.kind, ApiErrorKind::ThrottleTriggered);
            assert!(api.kind.is_retryable());
            assert_eq!(
                api.message.as_deref(),
                Some("Too many requests in a short amount of time")
            );
            assert_eq!(api.execution_time, Some(41));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_auth_failure_without_key_is_rewritten() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "GET",
            "/account/info",
            vec![],
            json!({
                "status": "auth_failure",
                "message": "Invalid API key 'None'",
                "execution_time": 3
            }),
        )
        .await;

    let client = fixture.builder().build().unwrap();
    let err = client.account_info().await.unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.kind, ApiErrorKind::AuthFailure);
            assert_eq!(api.message.as_deref(), Some(AUTH_NOT_CONFIGURED));
        }
        other => panic!("expected auth failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_auth_failure_with_key_keeps_server_message() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "GET",
            "/account/info",
            vec![],
            json!({ "status": "auth_failure", "message": "Invalid API key" }),
        )
        .await;

    let err = fixture.client().account_info().await.unwrap_err();

    assert_eq!(err.api_kind(), Some(ApiErrorKind::AuthFailure));
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_auth_failure_with_per_call_key_keeps_server_message() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "GET",
            "/account/info",
            vec![("key", "wrong_key")],
            json!({ "status": "auth_failure", "message": "Invalid API key 'wrong_key'" }),
        )
        .await;

    let client = fixture.builder().build().unwrap();
    let err = client
        .core()
        .call(
            Method::GET,
            &["account", "info"],
            RequestParams::new().with_auth("wrong_key"),
        )
        .await
        .unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.kind, ApiErrorKind::AuthFailure);
            assert_eq!(api.message.as_deref(), Some("Invalid API key 'wrong_key'"));
        }
        other => panic!("expected auth failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_status_is_unexpected_response() {
    let fixture = MockServerFixture::new().await;
    let body = json!({ "result": "valid" });
    let _mock = fixture
        .mock_json("GET", "/single/check", vec![], body.clone())
        .await;

    let err = fixture
        .client()
        .verify("a@example.com", &VerifyOptions::default())
        .await
        .unwrap_err();

    match err {
        Error::UnexpectedResponse { payload } => assert_eq!(payload, body),
        other => panic!("expected unexpected response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_is_transport_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_raw(
            "GET",
            "/account/info",
            503,
            "application/json",
            r#"{"status":"temp_unavail"}"#,
        )
        .await;

    let err = fixture.client().account_info().await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_malformed_body_is_serialization_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_raw("GET", "/account/info", 200, "application/json", "{not json")
        .await;

    let err = fixture.client().account_info().await.unwrap_err();

    assert!(matches!(err, Error::Serialization(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = neverbounce_rust::ClientBuilder::new()
        .base_url("http://127.0.0.1:9")
        .auth("k")
        .timeout(std::time::Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.account_info().await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {:?}", err);
}
