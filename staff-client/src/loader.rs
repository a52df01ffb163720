//! Record list loader
//!
//! Owns the list state shown by the screen. A failed fetch never clears the
//! list; it only raises a notification.

use std::sync::Arc;

use shared::models::Employee;
use tokio::sync::watch;

use crate::ClientResult;
use crate::notify::{Notification, Notifier, messages};
use crate::store::EmployeeStore;

/// Current list and whether a fetch is running
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub employees: Vec<Employee>,
    pub loading: bool,
}

impl Default for ListState {
    /// The screen starts loading until the first fetch lands
    fn default() -> Self {
        Self {
            employees: Vec::new(),
            loading: true,
        }
    }
}

pub struct RecordListLoader {
    store: Arc<dyn EmployeeStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ListState>,
}

impl std::fmt::Debug for RecordListLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("RecordListLoader")
            .field("employees", &state.employees.len())
            .field("loading", &state.loading)
            .finish()
    }
}

impl RecordListLoader {
    pub fn new(store: Arc<dyn EmployeeStore>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            store,
            notifier,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Forgets the current rows and goes back to the initial loading state
    ///
    /// Called when the signed-in user goes away or changes, so rows fetched
    /// for one user are never kept on screen for another.
    pub fn reset(&self) {
        self.state.send_if_modified(|s| {
            let cleared = ListState::default();
            if *s == cleared {
                return false;
            }
            *s = cleared;
            true
        });
    }

    /// Fetches every row in scope and replaces the list
    ///
    /// Errors are reported through the notifier and returned; the previous
    /// list stays in place.
    pub async fn load(&self) -> ClientResult<usize> {
        self.state.send_modify(|s| s.loading = true);
        let result = self.store.list().await;
        match result {
            Ok(employees) => {
                let count = employees.len();
                tracing::debug!(count, "Employee list loaded");
                self.state.send_modify(|s| {
                    s.employees = employees;
                    s.loading = false;
                });
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching employees");
                self.notifier.notify(Notification::error(messages::FETCH_FAILED));
                self.state.send_modify(|s| s.loading = false);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::InMemoryEmployeeStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::models::EmployeePayload;

    fn payload(name: &str) -> EmployeePayload {
        EmployeePayload {
            name: name.into(),
            email: format!("{}@x.com", name.to_lowercase()),
            designation: "Engineer".into(),
            department: "R&D".into(),
            salary: Decimal::from(90000),
            date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            last_day_of_working: None,
            user_id: "u-1".into(),
        }
    }

    fn setup() -> (Arc<InMemoryEmployeeStore>, Arc<RecordingNotifier>, RecordListLoader) {
        let store = Arc::new(InMemoryEmployeeStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let loader = RecordListLoader::new(store.clone(), notifier.clone());
        (store, notifier, loader)
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let (_, _, loader) = setup();
        let state = loader.snapshot();
        assert!(state.loading);
        assert!(state.employees.is_empty());
    }

    #[tokio::test]
    async fn test_load_replaces_list() {
        let (store, notifier, loader) = setup();
        store.insert(&payload("Ana")).await.unwrap();
        store.insert(&payload("Ben")).await.unwrap();

        assert_eq!(loader.load().await.unwrap(), 2);
        let state = loader.snapshot();
        assert!(!state.loading);
        assert_eq!(state.employees[0].name, "Ben");
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_list() {
        let (store, notifier, loader) = setup();
        for name in ["Ana", "Ben", "Cid"] {
            store.insert(&payload(name)).await.unwrap();
        }
        loader.load().await.unwrap();

        store.set_fail_reads(true);
        assert!(loader.load().await.is_err());

        let state = loader.snapshot();
        assert_eq!(state.employees.len(), 3);
        assert!(!state.loading);
        let seen = notifier.take();
        assert_eq!(seen, vec![Notification::error(messages::FETCH_FAILED)]);
    }

    #[tokio::test]
    async fn test_reset_clears_rows() {
        let (store, _, loader) = setup();
        store.insert(&payload("Ana")).await.unwrap();
        loader.load().await.unwrap();

        loader.reset();
        assert_eq!(loader.snapshot(), ListState::default());

        // A failed read after a reset leaves the list empty
        store.set_fail_reads(true);
        assert!(loader.load().await.is_err());
        let state = loader.snapshot();
        assert!(state.employees.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let (store, _, loader) = setup();
        let mut rx = loader.subscribe();
        store.insert(&payload("Ana")).await.unwrap();
        loader.load().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().employees.len(), 1);
    }
}
