//! # neverbounce-rust
//!
//! NeverBounce 邮箱验证 API 的异步 Rust 客户端。
//!
//! Async client for the NeverBounce email verification API.
//!
//! ## Overview
//!
//! The client authenticates requests with a static API key, verifies single
//! addresses, runs bulk verification jobs and turns API-level failures into
//! typed errors callers can match on.
//!
//! ## Key Features
//!
//! - **Single checks**: [`NeverBounceClient::verify`] and [`NeverBounceClient::account_info`]
//! - **Bulk jobs**: submit, poll, fetch results, cancel and delete through [`bulk::JobRunner`]
//! - **Typed failures**: every non-success `status` maps to an [`error_code::ApiErrorKind`]
//! - **Sessions**: [`NeverBounceClient::session`] keeps one connection pool open for a scope
//! - **Pluggable auth**: implement [`auth::AuthStrategy`] to change how the key is attached
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neverbounce_rust::{NeverBounceClient, VerifyOptions};
//!
//! #[tokio::main]
//! async fn main() -> neverbounce_rust::Result<()> {
//!     let client = NeverBounceClient::new("secret_api_key")?;
//!     let result = client
//!         .verify("support@neverbounce.com", &VerifyOptions::default())
//!         .await?;
//!     println!("{}", result["result"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client facade, builder, request core and response validation |
//! | [`bulk`] | Bulk job lifecycle and payload types |
//! | [`auth`] | Authentication strategies |
//! | [`transport`] | HTTP configuration and persistent sessions |
//! | [`error_code`] | API status to failure kind mapping |

pub mod auth;
pub mod bulk;
pub mod client;
pub mod error_code;
pub mod transport;

// Re-export main types for convenience
pub use auth::{Auth, AuthStrategy, IntoAuth, StaticTokenAuth};
pub use bulk::{JobId, JobInput, JobRecord, JobState, SubmitOptions};
pub use client::{ApiResponse, ClientBuilder, NeverBounceClient, SessionScope, VerifyOptions};
pub use error_code::ApiErrorKind;

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{ApiError, Error, ErrorContext};

/// Factory alias for [`NeverBounceClient::new`].
pub fn client(api_key: impl IntoAuth) -> Result<NeverBounceClient> {
    NeverBounceClient::new(api_key)
}
