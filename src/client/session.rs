//! Scoped session lifecycle.

use crate::client::api::NeverBounceClient;
use crate::Result;
use std::ops::{Deref, DerefMut};

/// Keeps a persistent session open on a client for as long as it lives.
///
/// Dereferences to the client. Dropping the scope closes the session and
/// clears it, whether the scope ends normally, through `?` or by panicking.
#[must_use = "the session is closed as soon as the scope is dropped"]
pub struct SessionScope<'a> {
    client: &'a mut NeverBounceClient,
}

impl<'a> SessionScope<'a> {
    pub(crate) fn enter(client: &'a mut NeverBounceClient) -> Result<Self> {
        client.core_mut().open_session()?;
        Ok(Self { client })
    }
}

impl Deref for SessionScope<'_> {
    type Target = NeverBounceClient;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

impl DerefMut for SessionScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.client
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        self.client.core_mut().close_session();
    }
}
