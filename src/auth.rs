//! Request authentication strategies.
//!
//! The API authenticates with a static key. [`StaticTokenAuth`] attaches it as
//! the `key` query parameter; other placements can be provided by implementing
//! [`AuthStrategy`] and wrapping the strategy in an [`Auth`] handle.

use reqwest::RequestBuilder;
use std::fmt;
use std::sync::Arc;

/// Something that knows how to authenticate an outgoing request.
pub trait AuthStrategy: fmt::Debug + Send + Sync {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Attaches a static API key as the `key` query parameter.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticTokenAuth {
    api_key: String,
}

impl StaticTokenAuth {
    pub const QUERY_PARAM: &'static str = "key";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

// Keys end up in logs through `{:?}` far too easily.
impl fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl AuthStrategy for StaticTokenAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[(Self::QUERY_PARAM, self.api_key.as_str())])
    }
}

/// Shared handle to an authentication strategy.
#[derive(Clone)]
pub struct Auth(Arc<dyn AuthStrategy>);

impl Auth {
    pub fn new<S: AuthStrategy + 'static>(strategy: S) -> Self {
        Self(Arc::new(strategy))
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        self.0.apply(request)
    }

    /// Whether two handles point at the same strategy instance.
    pub fn ptr_eq(&self, other: &Auth) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Conversion into an optional [`Auth`].
///
/// Raw keys are wrapped in [`StaticTokenAuth`], existing strategies pass
/// through unchanged and `None` (or a blank key) clears the credential.
pub trait IntoAuth {
    fn into_auth(self) -> Option<Auth>;
}

impl IntoAuth for Auth {
    fn into_auth(self) -> Option<Auth> {
        Some(self)
    }
}

impl IntoAuth for StaticTokenAuth {
    fn into_auth(self) -> Option<Auth> {
        if self.api_key.trim().is_empty() {
            return None;
        }
        Some(Auth::new(self))
    }
}

impl IntoAuth for String {
    fn into_auth(self) -> Option<Auth> {
        StaticTokenAuth::new(self).into_auth()
    }
}

impl IntoAuth for &str {
    fn into_auth(self) -> Option<Auth> {
        StaticTokenAuth::new(self).into_auth()
    }
}

impl<T: IntoAuth> IntoAuth for Option<T> {
    fn into_auth(self) -> Option<Auth> {
        self.and_then(IntoAuth::into_auth)
    }
}
