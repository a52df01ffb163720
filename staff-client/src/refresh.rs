//! Refresh orchestration
//!
//! One task owns every call to [`RecordListLoader::load`]. Mutations ask for
//! a refresh through a [`RefreshHandle`] and get back a [`RefreshTicket`]
//! that resolves once the refetch has finished. Session acquisition triggers
//! a load on its own; losing or switching the user clears the list first.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::loader::RecordListLoader;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Created,
    Updated,
    Deleted,
    SessionAcquired,
    Manual,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::SessionAcquired => "session_acquired",
            Self::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Completion of one refresh demand
#[derive(Debug)]
#[must_use = "await the ticket to observe the refreshed list"]
pub struct RefreshTicket {
    rx: oneshot::Receiver<()>,
}

impl RefreshTicket {
    /// Waits for the refetch. `false` if the orchestrator went away first.
    pub async fn wait(self) -> bool {
        self.rx.await.is_ok()
    }
}

struct Demand {
    reason: RefreshReason,
    done: oneshot::Sender<()>,
}

/// Sending side of the refresh queue
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<Demand>,
    cancel: CancellationToken,
}

impl fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl RefreshHandle {
    pub fn request(&self, reason: RefreshReason) -> RefreshTicket {
        let (done, rx) = oneshot::channel();
        if self.tx.send(Demand { reason, done }).is_err() {
            tracing::warn!(%reason, "Refresh requested after orchestrator stopped");
        }
        RefreshTicket { rx }
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct RefreshOrchestrator {
    loader: Arc<RecordListLoader>,
    session: SessionContext,
    demands: mpsc::UnboundedReceiver<Demand>,
    cancel: CancellationToken,
}

impl RefreshOrchestrator {
    /// Starts the orchestrator task. It runs until `cancel` fires or every
    /// handle is dropped.
    pub fn spawn(
        loader: Arc<RecordListLoader>,
        session: SessionContext,
        cancel: CancellationToken,
    ) -> RefreshHandle {
        let (tx, demands) = mpsc::unbounded_channel();
        let orchestrator = Self {
            loader,
            session,
            demands,
            cancel: cancel.clone(),
        };
        tokio::spawn(orchestrator.run());
        RefreshHandle { tx, cancel }
    }

    async fn run(mut self) {
        let mut watching = true;
        let mut last_user = self.session.user_id();
        if last_user.is_some() {
            self.refresh(RefreshReason::SessionAcquired).await;
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                demand = self.demands.recv() => {
                    let Some(demand) = demand else { break };
                    self.refresh(demand.reason).await;
                    let _ = demand.done.send(());
                }
                change = self.session.changed(), if watching => match change {
                    Some(current) => {
                        let user = current.map(|s| s.user_id);
                        if user == last_user {
                            continue;
                        }
                        if last_user.is_some() {
                            tracing::debug!("Signed-in user changed, clearing employee list");
                            self.loader.reset();
                        }
                        last_user = user;
                        if last_user.is_some() {
                            self.refresh(RefreshReason::SessionAcquired).await;
                        }
                    }
                    None => watching = false,
                },
            }
        }
        tracing::debug!("Refresh orchestrator stopped");
    }

    async fn refresh(&self, reason: RefreshReason) {
        tracing::debug!(%reason, "Refreshing employee list");
        // Failures are already reported by the loader
        let _ = self.loader.load().await;
    }
}
