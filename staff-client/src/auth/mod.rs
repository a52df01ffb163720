//! Auth provider boundary
//!
//! The identity provider owns the session lifecycle. The rest of the crate
//! only needs three things from it: a pull of the current session, a push
//! channel of session changes, and a re-validated user for mutations.

mod memory;
mod network;

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use shared::client::{AuthChangeEvent, AuthUser, Session};
use tokio::sync::broadcast;

use crate::ClientResult;

pub use memory::StaticAuthProvider;
pub use network::NetworkAuthClient;

/// Capacity of the auth event channel
pub(crate) const AUTH_EVENT_CAPACITY: usize = 64;

/// A session change pushed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

impl AuthStateChange {
    pub fn new(event: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

/// Identity provider seam
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session as held by the provider
    async fn get_session(&self) -> ClientResult<Option<Session>>;

    /// User of the current session, re-validated with the provider.
    ///
    /// `Ok(None)` when signed out or when the provider rejects the token.
    async fn get_user(&self) -> ClientResult<Option<AuthUser>>;

    /// Register for session change notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;

    async fn sign_out(&self) -> ClientResult<()>;
}

/// In-memory session slot shared by the auth client and the HTTP transport
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, session: Option<Session>) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    /// Clears the slot, returning what was there
    pub fn take(&self) -> Option<Session> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}
