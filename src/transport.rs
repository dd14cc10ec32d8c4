//! HTTP transport: client configuration, one-off calls and persistent sessions.

mod http;

pub use http::{HttpConfig, Session, TransportError};
