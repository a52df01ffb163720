//! Session watcher
//!
//! The watcher is the single writer of the session value. Everything else
//! reads it through a [`SessionContext`]. Transition logic lives in the pure
//! [`SessionMachine`]; redirecting to sign-in is a side effect performed by
//! [`NavigationObserver`], which only looks at published transitions.
//!
//! Startup: the watcher registers for pushes first and then pulls the
//! current session once, so a change landing between the two is not lost.
//! Both paths write the same value; the last one received wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shared::client::{AuthChangeEvent, Session};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{AUTH_EVENT_CAPACITY, AuthProvider, AuthStateChange};

/// Room for a full burst of auth events plus the resync that follows it
const TRANSITION_CAPACITY: usize = AUTH_EVENT_CAPACITY * 2;

/// Who is signed in, as far as the screen is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: String,
    pub email: String,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
        }
    }
}

/// Where a session value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// The explicit pull made at startup
    Bootstrap,
    /// A pushed change
    Event(AuthChangeEvent),
    /// Pull made after the push channel dropped messages
    Resync,
}

impl TransitionOrigin {
    fn is_bootstrap(&self) -> bool {
        matches!(
            self,
            Self::Bootstrap | Self::Event(AuthChangeEvent::InitialSession)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTransition {
    pub origin: TransitionOrigin,
    pub previous: Option<SessionInfo>,
    pub current: Option<SessionInfo>,
    pub redirect_to_sign_in: bool,
}

impl SessionTransition {
    /// A session appeared, or a different user replaced the previous one
    pub fn acquired(&self) -> bool {
        match (&self.previous, &self.current) {
            (None, Some(_)) => true,
            (Some(prev), Some(cur)) => prev.user_id != cur.user_id,
            _ => false,
        }
    }

    pub fn lost(&self) -> bool {
        self.previous.is_some() && self.current.is_none()
    }
}

/// Pure session state machine
///
/// Redirect rule: every absent value redirects, except a bootstrap value
/// (startup pull or `InitialSession`) arriving before any session was ever
/// observed.
#[derive(Debug, Default)]
pub struct SessionMachine {
    current: Option<SessionInfo>,
    ever_observed: bool,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SessionInfo> {
        self.current.as_ref()
    }

    pub fn apply(
        &mut self,
        origin: TransitionOrigin,
        session: Option<SessionInfo>,
    ) -> SessionTransition {
        let redirect_to_sign_in =
            session.is_none() && !(origin.is_bootstrap() && !self.ever_observed);
        if session.is_some() {
            self.ever_observed = true;
        }
        let previous = std::mem::replace(&mut self.current, session.clone());
        SessionTransition {
            origin,
            previous,
            current: session,
            redirect_to_sign_in,
        }
    }
}

/// Read-only view of the current session
#[derive(Debug, Clone)]
pub struct SessionContext {
    rx: watch::Receiver<Option<SessionInfo>>,
}

impl SessionContext {
    pub fn current(&self) -> Option<SessionInfo> {
        self.rx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.rx.borrow().as_ref().map(|s| s.user_id.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Waits for the next change. `None` once the watcher is gone.
    pub async fn changed(&mut self) -> Option<Option<SessionInfo>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits until the session satisfies `f`. `None` once the watcher is gone.
    pub async fn wait_for(
        &mut self,
        f: impl FnMut(&Option<SessionInfo>) -> bool,
    ) -> Option<Option<SessionInfo>> {
        self.rx.wait_for(f).await.ok().map(|v| v.clone())
    }
}

/// Navigation side effect driven by session transitions
pub trait Navigator: Send + Sync {
    fn redirect_to_sign_in(&self);
}

/// Subscribes to auth changes and owns the session value
pub struct SessionWatcher {
    provider: Arc<dyn AuthProvider>,
    /// Moved into the task on start
    writer: Option<watch::Sender<Option<SessionInfo>>>,
    context: SessionContext,
    transitions: broadcast::Sender<SessionTransition>,
    cancel: CancellationToken,
    alive: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWatcher")
            .field("current", &self.context.current())
            .field("alive", &self.is_alive())
            .field("started", &self.task.is_some())
            .finish()
    }
}

impl SessionWatcher {
    /// Creates an idle watcher. Subscribe to transitions, then call `start`.
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (writer, rx) = watch::channel(None);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            provider,
            writer: Some(writer),
            context: SessionContext { rx },
            transitions,
            cancel: CancellationToken::new(),
            alive: Arc::new(AtomicBool::new(true)),
            task: None,
        }
    }

    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    pub fn subscribe_transitions(&self) -> broadcast::Receiver<SessionTransition> {
        self.transitions.subscribe()
    }

    /// Token cancelled when the watcher is torn down
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Registers for pushes, then pulls the current session once
    pub fn start(&mut self) {
        let Some(writer) = self.writer.take() else {
            tracing::warn!("Session watcher already started");
            return;
        };
        let pushes = self.provider.subscribe();
        let worker = WatchTask {
            provider: self.provider.clone(),
            writer,
            transitions: self.transitions.clone(),
            alive: self.alive.clone(),
            machine: SessionMachine::new(),
        };
        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(worker.run(pushes, cancel)));
        tracing::debug!("Session watcher started");
    }

    /// Deregisters the push subscription. Late completions are dropped.
    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Session watcher stopped");
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WatchTask {
    provider: Arc<dyn AuthProvider>,
    writer: watch::Sender<Option<SessionInfo>>,
    transitions: broadcast::Sender<SessionTransition>,
    alive: Arc<AtomicBool>,
    machine: SessionMachine,
}

impl WatchTask {
    async fn run(
        mut self,
        mut pushes: broadcast::Receiver<AuthStateChange>,
        cancel: CancellationToken,
    ) {
        let pulled = tokio::select! {
            _ = cancel.cancelled() => return,
            pulled = self.pull() => pulled,
        };
        if !self.is_alive() {
            return;
        }
        self.apply(TransitionOrigin::Bootstrap, pulled);

        loop {
            let change = tokio::select! {
                _ = cancel.cancelled() => break,
                change = pushes.recv() => change,
            };
            if !self.is_alive() {
                break;
            }
            match change {
                Ok(change) => {
                    let info = change.session.as_ref().map(SessionInfo::from);
                    self.apply(TransitionOrigin::Event(change.event), info);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth events dropped, resyncing session");
                    let pulled = tokio::select! {
                        _ = cancel.cancelled() => break,
                        pulled = self.pull() => pulled,
                    };
                    if !self.is_alive() {
                        break;
                    }
                    self.apply(TransitionOrigin::Resync, pulled);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Auth event channel closed");
                    break;
                }
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn pull(&self) -> Option<SessionInfo> {
        match self.provider.get_session().await {
            Ok(session) => session.as_ref().map(SessionInfo::from),
            Err(e) => {
                tracing::warn!(error = %e, "Session pull failed, treating as signed out");
                None
            }
        }
    }

    fn apply(&mut self, origin: TransitionOrigin, session: Option<SessionInfo>) {
        let transition = self.machine.apply(origin, session);
        tracing::debug!(
            ?origin,
            signed_in = transition.current.is_some(),
            redirect = transition.redirect_to_sign_in,
            "session transition"
        );
        self.writer.send_replace(transition.current.clone());
        let _ = self.transitions.send(transition);
    }
}

/// Turns transitions flagged for redirect into navigation
pub struct NavigationObserver;

impl NavigationObserver {
    pub fn spawn(
        mut transitions: broadcast::Receiver<SessionTransition>,
        navigator: Arc<dyn Navigator>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = transitions.recv() => next,
                };
                match next {
                    Ok(t) if t.redirect_to_sign_in => {
                        tracing::info!(origin = ?t.origin, "Session lost, redirecting to sign-in");
                        navigator.redirect_to_sign_in();
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Navigation observer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
