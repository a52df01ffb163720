use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shared::client::{AuthChangeEvent, AuthUser, Session};
use tokio::sync::broadcast;

use super::{AUTH_EVENT_CAPACITY, AuthProvider, AuthStateChange, SessionStore};
use crate::ClientResult;

/// In-process auth provider
///
/// Sessions are minted locally; `sign_in` / `sign_out` / `revoke` drive the
/// same event channel the network client uses. Backs the offline demo and
/// the unit tests.
#[derive(Debug)]
pub struct StaticAuthProvider {
    store: SessionStore,
    events: broadcast::Sender<AuthStateChange>,
    user_lookups: AtomicUsize,
}

impl Default for StaticAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticAuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            store: SessionStore::new(),
            events,
            user_lookups: AtomicUsize::new(0),
        }
    }

    /// Provider that starts with `user` already signed in (no event emitted)
    pub fn signed_in(user: AuthUser) -> Self {
        let provider = Self::new();
        provider.store.set(Some(Self::mint(user)));
        provider
    }

    fn mint(user: AuthUser) -> Session {
        let now = chrono::Utc::now().timestamp();
        Session {
            access_token: format!("local-{}", user.id),
            token_type: "bearer".into(),
            expires_in: 3600,
            expires_at: now + 3600,
            user,
        }
    }

    pub fn sign_in(&self, user: AuthUser) -> Session {
        let session = Self::mint(user);
        self.store.set(Some(session.clone()));
        let _ = self
            .events
            .send(AuthStateChange::new(AuthChangeEvent::SignedIn, Some(session.clone())));
        session
    }

    /// Drops the session without notifying subscribers, like a token revoked
    /// server-side that nobody has looked at yet
    pub fn revoke(&self) {
        self.store.set(None);
    }

    /// Number of `get_user` calls served so far
    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn get_session(&self) -> ClientResult<Option<Session>> {
        Ok(self.store.get())
    }

    async fn get_user(&self) -> ClientResult<Option<AuthUser>> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.get().map(|s| s.user))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.store.set(None);
        let _ = self
            .events
            .send(AuthStateChange::new(AuthChangeEvent::SignedOut, None));
        Ok(())
    }
}
