use async_trait::async_trait;
use shared::client::{AuthChangeEvent, AuthUser, Session, SignInRequest};
use tokio::sync::broadcast;

use super::{AUTH_EVENT_CAPACITY, AuthProvider, AuthStateChange, SessionStore};
use crate::ClientResult;
use crate::http::NetworkHttpClient;

const TOKEN_PATH: &str = "auth/v1/token";
const USER_PATH: &str = "auth/v1/user";
const LOGOUT_PATH: &str = "auth/v1/logout";

/// Auth client talking to the backend's auth API
///
/// Holds the session in the [`SessionStore`] it shares with the HTTP
/// transport, and broadcasts every change it makes to that slot.
#[derive(Debug, Clone)]
pub struct NetworkAuthClient {
    http: NetworkHttpClient,
    events: broadcast::Sender<AuthStateChange>,
}

impl NetworkAuthClient {
    pub fn new(http: NetworkHttpClient) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { http, events }
    }

    fn store(&self) -> &SessionStore {
        self.http.sessions()
    }

    fn emit(&self, event: AuthChangeEvent, session: Option<Session>) {
        tracing::debug!(?event, "auth state change");
        // No subscribers is fine
        let _ = self.events.send(AuthStateChange::new(event, session));
    }

    /// Password sign-in
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<Session> {
        let req = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session: Session = self
            .http
            .post(TOKEN_PATH, &[("grant_type", "password")], &req)
            .await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.store().set(Some(session.clone()));
        self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Install a session restored from elsewhere (or none) and announce it
    pub fn restore(&self, session: Option<Session>) {
        self.store().set(session.clone());
        self.emit(AuthChangeEvent::InitialSession, session);
    }

    fn drop_session(&self, reason: &str) {
        if self.store().take().is_some() {
            tracing::warn!(reason, "Session dropped");
            self.emit(AuthChangeEvent::SignedOut, None);
        }
    }
}

#[async_trait]
impl AuthProvider for NetworkAuthClient {
    async fn get_session(&self) -> ClientResult<Option<Session>> {
        let Some(session) = self.store().get() else {
            return Ok(None);
        };
        if session.is_expired_at(chrono::Utc::now().timestamp()) {
            self.drop_session("access token expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn get_user(&self) -> ClientResult<Option<AuthUser>> {
        if self.store().access_token().is_none() {
            return Ok(None);
        }
        match self.http.get::<AuthUser>(USER_PATH, &[]).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_auth() => {
                self.drop_session("token rejected by provider");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> ClientResult<()> {
        if self.store().access_token().is_some()
            && let Err(e) = self.http.post_empty(LOGOUT_PATH).await
        {
            // The local session is cleared regardless
            if !e.is_auth() {
                tracing::warn!(error = %e, "Logout request failed");
            }
        }
        self.store().set(None);
        self.emit(AuthChangeEvent::SignedOut, None);
        tracing::info!("Signed out");
        Ok(())
    }
}
