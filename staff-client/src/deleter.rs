//! Record deleter

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::editor::{InFlightGuard, MutationContext};
use crate::notify::{Notification, messages};
use crate::refresh::{RefreshReason, RefreshTicket};
use crate::{ClientError, ClientResult};

/// Interactive yes/no prompt
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmation(pub bool);

#[async_trait]
impl Confirmation for FixedConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "Confirmation answered");
        self.0
    }
}

#[derive(Debug)]
pub enum DeleteOutcome {
    /// Declined at the prompt, nothing sent
    Cancelled,
    Deleted { refresh: RefreshTicket },
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

pub struct RecordDeleter {
    ctx: MutationContext,
    confirmation: Arc<dyn Confirmation>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for RecordDeleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordDeleter")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl RecordDeleter {
    pub fn new(ctx: MutationContext, confirmation: Arc<dyn Confirmation>) -> Self {
        Self {
            ctx,
            confirmation,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Deletes `id` once the user confirms
    ///
    /// No optimistic removal: the list only changes through the refresh.
    pub async fn delete(&self, id: &str) -> ClientResult<DeleteOutcome> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ClientError::SubmitInFlight)?;

        match self.ctx.auth.get_user().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(id, "Delete without a session");
                self.ctx.notifier.notify(Notification::login_required());
                return Err(ClientError::NotAuthenticated);
            }
            Err(e) => return Err(self.delete_failed(id, e)),
        }

        if !self.confirmation.confirm(messages::DELETE_PROMPT).await {
            tracing::debug!(id, "Delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.ctx.store.delete(id).await {
            Ok(()) => {
                tracing::info!(id, "Employee deleted");
                self.ctx
                    .notifier
                    .notify(Notification::success(messages::EMPLOYEE_DELETED));
                let refresh = self.ctx.refresh.request(RefreshReason::Deleted);
                Ok(DeleteOutcome::Deleted { refresh })
            }
            Err(e) => Err(self.delete_failed(id, e)),
        }
    }

    fn delete_failed(&self, id: &str, e: ClientError) -> ClientError {
        tracing::error!(id, error = %e, "Error deleting employee");
        self.ctx
            .notifier
            .notify(Notification::error(messages::DELETE_FAILED));
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuthProvider;
    use crate::loader::RecordListLoader;
    use crate::notify::RecordingNotifier;
    use crate::refresh::RefreshOrchestrator;
    use crate::session::SessionWatcher;
    use crate::store::{EmployeeStore, InMemoryEmployeeStore};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::client::AuthUser;
    use shared::models::EmployeePayload;
    use std::sync::atomic::AtomicUsize;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        store: Arc<InMemoryEmployeeStore>,
        auth: Arc<StaticAuthProvider>,
        notifier: Arc<RecordingNotifier>,
        loader: Arc<RecordListLoader>,
        deleter: RecordDeleter,
        _watcher: SessionWatcher,
    }

    async fn harness(names: &[&str], confirmation: Arc<dyn Confirmation>) -> Harness {
        let store = Arc::new(InMemoryEmployeeStore::new());
        for name in names {
            store
                .insert(&EmployeePayload {
                    name: name.to_string(),
                    email: format!("{}@x.com", name.to_lowercase()),
                    designation: "Engineer".into(),
                    department: "R&D".into(),
                    salary: Decimal::from(1000),
                    date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                    last_day_of_working: None,
                    user_id: "u-ana".into(),
                })
                .await
                .unwrap();
        }
        let auth = Arc::new(StaticAuthProvider::signed_in(AuthUser {
            id: "u-ana".into(),
            email: "ana@x.com".into(),
        }));
        let notifier = Arc::new(RecordingNotifier::new());
        let loader = Arc::new(RecordListLoader::new(store.clone(), notifier.clone()));
        let watcher = SessionWatcher::new(auth.clone());
        let refresh =
            RefreshOrchestrator::spawn(loader.clone(), watcher.context(), CancellationToken::new());
        let ctx = MutationContext {
            auth: auth.clone(),
            store: store.clone(),
            notifier: notifier.clone(),
            refresh,
        };
        let deleter = RecordDeleter::new(ctx, confirmation);
        Harness {
            store,
            auth,
            notifier,
            loader,
            deleter,
            _watcher: watcher,
        }
    }

    #[derive(Default)]
    struct CountingConfirmation {
        asked: AtomicUsize,
    }

    #[async_trait]
    impl Confirmation for CountingConfirmation {
        async fn confirm(&self, prompt: &str) -> bool {
            assert_eq!(prompt, "Are you sure you want to delete this employee?");
            self.asked.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_that_row() {
        let h = harness(&["Ana", "Ben"], Arc::new(FixedConfirmation(true))).await;
        let ana_id = h.store.rows()[0].id.clone();

        let outcome = h.deleter.delete(&ana_id).await.unwrap();
        let DeleteOutcome::Deleted { refresh } = outcome else {
            panic!("expected a delete");
        };
        assert!(refresh.wait().await);

        let names: Vec<_> = h
            .loader
            .snapshot()
            .employees
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Ben"]);
        assert_eq!(
            h.notifier.take(),
            vec![Notification::success(messages::EMPLOYEE_DELETED)]
        );
    }

    #[tokio::test]
    async fn test_declined_delete_is_silent() {
        let h = harness(&["Ana"], Arc::new(FixedConfirmation(false))).await;
        let id = h.store.rows()[0].id.clone();

        let outcome = h.deleter.delete(&id).await.unwrap();
        assert!(!outcome.is_deleted());
        assert_eq!(h.store.calls().deletes, 0);
        assert!(h.notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_no_session_skips_prompt_and_request() {
        let confirmation = Arc::new(CountingConfirmation::default());
        let h = harness(&["Ana"], confirmation.clone()).await;
        h.auth.revoke();
        let id = h.store.rows()[0].id.clone();

        let err = h.deleter.delete(&id).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert_eq!(confirmation.asked.load(Ordering::SeqCst), 0);
        assert_eq!(h.store.calls().deletes, 0);
        assert_eq!(h.notifier.take(), vec![Notification::login_required()]);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_list() {
        let confirmation = Arc::new(CountingConfirmation::default());
        let h = harness(&["Ana"], confirmation.clone()).await;
        h.loader.load().await.unwrap();
        h.store.set_fail_writes(true);
        let id = h.store.rows()[0].id.clone();

        assert!(h.deleter.delete(&id).await.is_err());
        assert_eq!(confirmation.asked.load(Ordering::SeqCst), 1);
        assert_eq!(h.loader.snapshot().employees.len(), 1);
        assert_eq!(
            h.notifier.take(),
            vec![Notification::error(messages::DELETE_FAILED)]
        );
        assert!(!h.deleter.in_flight());
    }
}
