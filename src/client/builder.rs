use crate::auth::{Auth, IntoAuth};
use crate::bulk::JobRunner;
use crate::client::api::NeverBounceClient;
use crate::client::core::{ApiCore, DEFAULT_BASE_URL};
use crate::transport::{HttpConfig, Session};
use crate::Result;
use std::time::Duration;

/// Builder for [`NeverBounceClient`].
///
/// Keep this surface area small and predictable; every knob has an env
/// counterpart read by [`ClientBuilder::from_env`].
pub struct ClientBuilder {
    auth: Option<Auth>,
    base_url: Option<String>,
    http: HttpConfig,
    open_session: bool,
    session_auth: Option<Auth>,
    results_per_page: Option<u32>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            auth: None,
            base_url: None,
            http: HttpConfig::default(),
            open_session: false,
            session_auth: None,
            results_per_page: None,
        }
    }

    /// Builder seeded from the environment:
    /// - `NEVERBOUNCE_API_KEY`
    /// - `NEVERBOUNCE_BASE_URL`
    /// - `NEVERBOUNCE_HTTP_TIMEOUT_SECS` (default 30)
    /// - `NEVERBOUNCE_HTTP_POOL_MAX_IDLE_PER_HOST` (default 8)
    /// - `NEVERBOUNCE_PROXY_URL`
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        builder.auth = std::env::var("NEVERBOUNCE_API_KEY").ok().into_auth();
        builder.base_url = std::env::var("NEVERBOUNCE_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty());
        builder.http = HttpConfig::from_env();
        builder
    }

    /// API key or a prepared strategy. Blank keys leave the client unauthenticated.
    pub fn auth(mut self, auth: impl IntoAuth) -> Self {
        self.auth = auth.into_auth();
        self
    }

    /// Override the API base URL (primarily for testing with mock servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.http.proxy_url = Some(url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http.user_agent = user_agent.into();
        self
    }

    pub fn http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Start with a persistent session already open.
    pub fn with_session(mut self) -> Self {
        self.open_session = true;
        self
    }

    /// Credential carried by the session, used when the client has none.
    /// Implies [`ClientBuilder::with_session`].
    pub fn session_auth(mut self, auth: impl IntoAuth) -> Self {
        self.open_session = true;
        self.session_auth = auth.into_auth();
        self
    }

    /// Page size used when fetching bulk results (1..=1000).
    pub fn results_per_page(mut self, n: u32) -> Self {
        self.results_per_page = Some(n);
        self
    }

    pub fn build(self) -> Result<NeverBounceClient> {
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let mut core = ApiCore::new(base_url, self.http)?;
        core.set_auth(self.auth);

        if self.open_session {
            let session = Session::new(core.http_config())?.with_auth(self.session_auth);
            core.set_session(session);
        }

        let mut jobs = JobRunner::new();
        if let Some(n) = self.results_per_page {
            jobs = jobs.with_results_per_page(n);
        }

        Ok(NeverBounceClient::from_parts(core, jobs))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
