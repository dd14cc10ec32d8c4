//! Client interface for the NeverBounce API.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod api;
pub mod builder;
pub mod core;
pub mod response;
pub mod session;

pub use api::{NeverBounceClient, VerifyOptions};
pub use builder::ClientBuilder;
pub use self::core::{ApiCore, RequestParams, DEFAULT_BASE_URL};
pub use response::{ApiResponse, AUTH_NOT_CONFIGURED};
pub use session::SessionScope;
