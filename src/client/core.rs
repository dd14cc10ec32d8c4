use crate::auth::{Auth, IntoAuth, StaticTokenAuth};
use crate::client::response::{self, ApiResponse};
use crate::transport::{HttpConfig, Session, TransportError};
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.neverbounce.com/v4/";

/// Parameters of a single API call.
///
/// Sent as query parameters for `GET` and as a JSON body otherwise.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    fields: Map<String, Value>,
    auth: Option<Auth>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_opt(self, name: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Booleans travel as 0/1.
    pub fn flag(self, name: &str, value: bool) -> Self {
        self.with(name, u8::from(value))
    }

    /// Per-call credential; takes precedence over the client's and the session's.
    pub fn with_auth(mut self, auth: impl IntoAuth) -> Self {
        self.auth = auth.into_auth();
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the caller put a raw `key` field in the parameters.
    pub fn carries_key(&self) -> bool {
        self.fields.contains_key(StaticTokenAuth::QUERY_PARAM)
    }

    fn query_pairs(&self) -> Vec<(&str, String)> {
        self.fields
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => u8::from(*b).to_string(),
                    other => other.to_string(),
                };
                (k.as_str(), v)
            })
            .collect()
    }
}

/// Request plumbing shared by every endpoint: base URL, credential, optional
/// persistent session and response validation.
#[derive(Debug)]
pub struct ApiCore {
    base_url: Url,
    auth: Option<Auth>,
    session: Option<Session>,
    http: HttpConfig,
}

impl ApiCore {
    pub fn new(base_url: &str, http: HttpConfig) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid base URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(e.to_string()),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::configuration_with_context(
                "base URL cannot carry path segments",
                ErrorContext::new().with_field_path("base_url"),
            ));
        }
        Ok(Self {
            base_url,
            auth: None,
            session: None,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http_config(&self) -> &HttpConfig {
        &self.http
    }

    /// The client's own credential, without session fallback.
    pub fn own_auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn set_auth(&mut self, auth: impl IntoAuth) {
        self.auth = auth.into_auth();
    }

    pub fn clear_auth(&mut self) {
        self.auth = None;
    }

    /// Picks the credential for a request: the per-call override, else the
    /// client's own, else the session's.
    pub fn resolve_auth(&self, explicit: Option<&Auth>) -> Option<Auth> {
        explicit
            .or(self.auth.as_ref())
            .or_else(|| self.session.as_ref().and_then(Session::auth))
            .cloned()
    }

    /// The credential attached to a request with these parameters. A raw
    /// `key` field supplied by the caller suppresses it.
    fn request_auth(&self, params: &RequestParams) -> Option<Auth> {
        if params.carries_key() {
            None
        } else {
            self.resolve_auth(params.auth.as_ref())
        }
    }

    /// Whether a request with these parameters goes out with any credential.
    fn is_authenticated(&self, params: &RequestParams) -> bool {
        params.carries_key() || self.resolve_auth(params.auth.as_ref()).is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn set_session(&mut self, session: Session) {
        if let Some(old) = self.session.replace(session) {
            old.close();
        }
    }

    /// Opens a session unless one exists. Returns whether one was created.
    pub fn open_session(&mut self) -> Result<bool> {
        if self.session.is_some() {
            return Ok(false);
        }
        self.session = Some(Session::new(&self.http)?);
        debug!("session opened");
        Ok(true)
    }

    pub fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
            debug!("session closed");
        }
    }

    /// Base URL plus the given path segments, e.g. `["single", "check"]`.
    pub fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::configuration("base URL cannot carry path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request through the open session, or a one-off client when
    /// there is none. Transport errors are returned as they are.
    pub async fn issue_request(
        &self,
        method: Method,
        endpoint: &[&str],
        params: RequestParams,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint_url(endpoint)?;
        let auth = self.request_auth(&params);
        debug!(
            method = %method,
            endpoint = %endpoint.join("/"),
            authenticated = self.is_authenticated(&params),
            via_session = self.session.is_some(),
            "issuing request"
        );

        let one_off;
        let http = match &self.session {
            Some(session) => session.http(),
            None => {
                one_off = self.http.build_client()?;
                &one_off
            }
        };

        let mut request = http.request(method.clone(), url);
        request = if method == Method::GET {
            request.query(&params.query_pairs())
        } else {
            request.json(&params.fields)
        };
        if let Some(auth) = auth {
            request = auth.apply(request);
        }

        request
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    /// Validates a parsed response against the client's effective credential.
    pub fn check_response(&self, response: ApiResponse) -> Result<ApiResponse> {
        response::validate(response, self.resolve_auth(None).is_some())
    }

    /// Issues, parses and validates a JSON call.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &[&str],
        params: RequestParams,
    ) -> Result<ApiResponse> {
        let authenticated = self.is_authenticated(&params);
        let raw = self.issue_request(method, endpoint, params).await?;
        let response = ApiResponse::read(raw).await?;
        response::validate(response, authenticated)
    }

    /// Like [`ApiCore::call`] for endpoints that answer with a file on success.
    ///
    /// JSON bodies are validated as usual (and thus fail); anything else is
    /// returned as raw bytes.
    pub async fn call_bytes(
        &self,
        method: Method,
        endpoint: &[&str],
        params: RequestParams,
    ) -> Result<Bytes> {
        let authenticated = self.is_authenticated(&params);
        let raw = self
            .issue_request(method, endpoint, params)
            .await?
            .error_for_status()
            .map_err(TransportError::Http)?;
        let is_json = raw
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        if is_json {
            let response = ApiResponse::read(raw).await?;
            let checked = response::validate(response, authenticated)?;
            return Ok(Bytes::from(serde_json::to_vec(&checked.payload)?));
        }
        raw.bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }
}
