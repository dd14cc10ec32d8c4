use crate::auth::{Auth, IntoAuth};
use crate::{Error, Result};
use reqwest::Proxy;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Settings used to build every underlying `reqwest::Client`, whether it backs
/// a [`Session`] or a single one-off request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
            proxy_url: None,
            user_agent: concat!("neverbounce-rust/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Defaults, overridable through `NEVERBOUNCE_HTTP_TIMEOUT_SECS`,
    /// `NEVERBOUNCE_HTTP_POOL_MAX_IDLE_PER_HOST` and `NEVERBOUNCE_PROXY_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = env::var("NEVERBOUNCE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let pool_max_idle_per_host = env::var("NEVERBOUNCE_HTTP_POOL_MAX_IDLE_PER_HOST")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.pool_max_idle_per_host);

        Self {
            timeout,
            pool_max_idle_per_host,
            proxy_url: env::var("NEVERBOUNCE_PROXY_URL").ok().filter(|s| !s.is_empty()),
            ..defaults
        }
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(Some(self.pool_idle_timeout))
            .user_agent(self.user_agent.clone());

        if let Some(proxy_url) = &self.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(error = %e, "ignoring invalid proxy url"),
            }
        }

        builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))
    }
}

/// A persistent connection pool shared by every request issued while it is open.
///
/// A session may carry its own credential, used by a client that has none of
/// its own.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    auth: Option<Auth>,
}

impl Session {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_client()?,
            auth: None,
        })
    }

    pub fn with_auth(mut self, auth: impl IntoAuth) -> Self {
        self.auth = auth.into_auth();
        self
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Closes pooled connections. They are released when the last handle to
    /// the pool is dropped, which is this one.
    pub fn close(self) {
        drop(self.http);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
