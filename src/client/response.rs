//! Response validation: HTTP status, payload shape and API `status`.

use crate::error::ApiError;
use crate::error_code::{ApiErrorKind, SUCCESS_STATUS};
use crate::transport::TransportError;
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

/// Message used for `auth_failure` when the client never had a credential.
pub const AUTH_NOT_CONFIGURED: &str = "client auth is not configured";

/// An HTTP response whose body has been parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub http_status: StatusCode,
    pub headers: HeaderMap,
    pub payload: Value,
}

impl ApiResponse {
    pub fn new(payload: Value) -> Self {
        Self {
            http_status: StatusCode::OK,
            headers: HeaderMap::new(),
            payload,
        }
    }

    /// Fails on non-2xx HTTP status or a body that is not JSON.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let response = response.error_for_status().map_err(TransportError::Http)?;
        let http_status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(TransportError::Http)?;
        let payload = serde_json::from_str(&body)?;
        Ok(Self {
            http_status,
            headers,
            payload,
        })
    }

    /// The API-level `status` field, if present.
    pub fn api_status(&self) -> Option<&str> {
        self.payload.get("status").and_then(Value::as_str)
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Checks the API-level `status` of a parsed response.
///
/// `auth_configured` tells whether a credential was resolved for the client;
/// without one an `auth_failure` gets [`AUTH_NOT_CONFIGURED`] as its message.
pub fn validate(response: ApiResponse, auth_configured: bool) -> Result<ApiResponse> {
    let status = match response.api_status() {
        Some(status) => status.to_string(),
        None => {
            return Err(Error::UnexpectedResponse {
                payload: response.payload,
            })
        }
    };

    if status == SUCCESS_STATUS {
        return Ok(response);
    }

    let mut message = response
        .payload
        .get("message")
        .and_then(Value::as_str)
        .map(String::from);
    let execution_time = response
        .payload
        .get("execution_time")
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.round() as u64)));

    let mut err = ApiError::new(status, None, execution_time);
    if err.kind == ApiErrorKind::AuthFailure && !auth_configured {
        message = Some(AUTH_NOT_CONFIGURED.to_string());
    }
    err.message = message;

    tracing::warn!(
        status = %err.status,
        kind = %err.kind,
        execution_time = ?err.execution_time,
        "API reported failure"
    );
    Err(Error::Api(err))
}
