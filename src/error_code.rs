//! API 状态码：将 NeverBounce 响应中的 `status` 字符串映射为固定的错误类别。
//!
//! NeverBounce API status codes.
//!
//! Every API response carries a `status` field. Anything other than
//! `"success"` is a failure, classified here into a closed set of kinds so
//! callers can branch on the failure without string matching.
//!
//! | Status                | Kind                  | Retryable |
//! |-----------------------|-----------------------|-----------|
//! | `general_failure`     | `GeneralFailure`      | no        |
//! | `auth_failure`        | `AuthFailure`         | no        |
//! | `temp_unavail`        | `TempUnavailable`     | yes       |
//! | `throttle_triggered`  | `ThrottleTriggered`   | yes       |
//! | `bad_referrer`        | `BadReferrer`         | no        |
//! | `invalid_credentials` | `InvalidCredentials`  | no        |
//!
//! Unrecognised statuses fall back to `GeneralFailure`.
//!
//! ## Example
//!
//! ```rust
//! use neverbounce_rust::error_code::ApiErrorKind;
//!
//! let kind = ApiErrorKind::from_status("throttle_triggered");
//! assert_eq!(kind, ApiErrorKind::ThrottleTriggered);
//! assert!(kind.is_retryable());
//! assert_eq!(ApiErrorKind::from_status("brand_new_status"), ApiErrorKind::GeneralFailure);
//! ```

use std::fmt;

/// The status string the API uses for a successful call.
pub const SUCCESS_STATUS: &str = "success";

/// Failure kind reported by the API through the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Catch-all for `general_failure` and any unrecognised status
    GeneralFailure,
    /// Missing or rejected API key
    AuthFailure,
    /// Service temporarily unavailable
    TempUnavailable,
    /// Too many requests in a short window
    ThrottleTriggered,
    /// Request came from a referrer the key is not allowed for
    BadReferrer,
    /// The supplied credentials are malformed or revoked
    InvalidCredentials,
}

impl ApiErrorKind {
    /// Maps an API `status` string to its kind. Never fails.
    pub fn from_status(status: &str) -> Self {
        match status {
            "auth_failure" => Self::AuthFailure,
            "temp_unavail" => Self::TempUnavailable,
            "throttle_triggered" => Self::ThrottleTriggered,
            "bad_referrer" => Self::BadReferrer,
            "invalid_credentials" => Self::InvalidCredentials,
            _ => Self::GeneralFailure,
        }
    }

    /// Returns the canonical status string (e.g., `"auth_failure"`).
    #[inline]
    pub fn status(&self) -> &'static str {
        match self {
            Self::GeneralFailure => "general_failure",
            Self::AuthFailure => "auth_failure",
            Self::TempUnavailable => "temp_unavail",
            Self::ThrottleTriggered => "throttle_triggered",
            Self::BadReferrer => "bad_referrer",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }

    /// Whether waiting and trying again may succeed.
    ///
    /// This is a hint for callers; the client never retries on its own.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ThrottleTriggered | Self::TempUnavailable)
    }

    /// Whether the failure is caused by the credential rather than the request.
    #[inline]
    pub fn is_auth_related(&self) -> bool {
        matches!(
            self,
            Self::AuthFailure | Self::BadReferrer | Self::InvalidCredentials
        )
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}
