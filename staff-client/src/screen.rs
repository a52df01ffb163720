//! Employee screen
//!
//! Wires the watcher, loader, orchestrator and mutation flows together and
//! keeps the route. This is the only type a front end needs to hold.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use shared::models::Employee;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthProvider;
use crate::deleter::{Confirmation, DeleteOutcome, RecordDeleter};
use crate::editor::{EmployeeForm, MutationContext, MutationOutcome, RecordEditor};
use crate::loader::{ListState, RecordListLoader};
use crate::notify::{Notification, Notifier};
use crate::refresh::{RefreshHandle, RefreshOrchestrator, RefreshReason};
use crate::session::{
    NavigationObserver, Navigator, SessionContext, SessionTransition, SessionWatcher,
    TransitionOrigin,
};
use crate::store::EmployeeStore;
use crate::view::{FormView, ListView, ScreenView, SignInView};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    /// `editing` is the id of the record being edited, `None` when creating
    Form { editing: Option<String> },
}

#[derive(Debug)]
struct ScreenState {
    route: Route,
    editor: Option<Arc<RecordEditor>>,
}

impl ScreenState {
    fn close_form(&mut self) {
        self.route = Route::List;
        self.editor = None;
    }
}

type SharedState = Arc<Mutex<ScreenState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, ScreenState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sends the screen back to the list and counts redirects to sign-in
#[derive(Debug)]
pub struct RouteNavigator {
    state: SharedState,
    redirects: AtomicUsize,
}

impl RouteNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RouteNavigator {
    fn redirect_to_sign_in(&self) {
        lock(&self.state).close_form();
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct EmployeeScreen {
    watcher: Mutex<SessionWatcher>,
    session: SessionContext,
    loader: Arc<RecordListLoader>,
    refresh: RefreshHandle,
    ctx: MutationContext,
    deleter: RecordDeleter,
    state: SharedState,
    navigator: Arc<RouteNavigator>,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for EmployeeScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeScreen")
            .field("route", &self.route())
            .field("signed_in", &self.session.is_signed_in())
            .finish()
    }
}

impl EmployeeScreen {
    /// Builds and starts the screen. Must run inside a Tokio runtime.
    pub fn start(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn EmployeeStore>,
        notifier: Arc<dyn Notifier>,
        confirmation: Arc<dyn Confirmation>,
    ) -> Self {
        let mut watcher = SessionWatcher::new(auth.clone());
        let session = watcher.context();
        let state: SharedState = Arc::new(Mutex::new(ScreenState {
            route: Route::List,
            editor: None,
        }));
        let navigator = Arc::new(RouteNavigator {
            state: state.clone(),
            redirects: AtomicUsize::new(0),
        });

        let observer = NavigationObserver::spawn(
            watcher.subscribe_transitions(),
            navigator.clone(),
            watcher.cancellation(),
        );
        let notice = spawn_auth_notice(
            watcher.subscribe_transitions(),
            notifier.clone(),
            watcher.cancellation(),
        );

        let loader = Arc::new(RecordListLoader::new(store.clone(), notifier.clone()));
        let refresh =
            RefreshOrchestrator::spawn(loader.clone(), watcher.context(), watcher.cancellation());

        let ctx = MutationContext {
            auth,
            store,
            notifier,
            refresh: refresh.clone(),
        };
        let deleter = RecordDeleter::new(ctx.clone(), confirmation);

        watcher.start();
        tracing::info!("Employee screen started");

        Self {
            watcher: Mutex::new(watcher),
            session,
            loader,
            refresh,
            ctx,
            deleter,
            state,
            navigator,
            tasks: vec![observer, notice],
        }
    }

    pub fn session(&self) -> SessionContext {
        self.session.clone()
    }

    pub fn list(&self) -> watch::Receiver<ListState> {
        self.loader.subscribe()
    }

    pub fn route(&self) -> Route {
        lock(&self.state).route.clone()
    }

    pub fn navigator(&self) -> &RouteNavigator {
        &self.navigator
    }

    pub fn open_create_form(&self) {
        let editor = RecordEditor::create(self.ctx.clone());
        let mut state = lock(&self.state);
        state.route = Route::Form { editing: None };
        state.editor = Some(Arc::new(editor));
    }

    /// Opens the form pre-filled with the listed record `id`
    pub fn open_edit_form(&self, id: &str) -> ClientResult<()> {
        let employee = self
            .find(id)
            .ok_or_else(|| ClientError::NotFound(format!("Employee {}", id)))?;
        let editor = RecordEditor::edit(self.ctx.clone(), &employee);
        let mut state = lock(&self.state);
        state.route = Route::Form {
            editing: Some(employee.id),
        };
        state.editor = Some(Arc::new(editor));
        Ok(())
    }

    pub fn cancel_form(&self) {
        lock(&self.state).close_form();
    }

    /// Applies `f` to the open form. `false` when no form is open.
    pub fn update_form(&self, f: impl FnOnce(&mut EmployeeForm)) -> bool {
        match self.editor() {
            Some(editor) => {
                editor.update_form(f);
                true
            }
            None => false,
        }
    }

    /// Submits the open form, returns to the list and waits for the refresh
    pub async fn submit_form(&self) -> ClientResult<MutationOutcome> {
        let editor = self
            .editor()
            .ok_or_else(|| ClientError::Validation("no form is open".into()))?;
        let submitted = editor.submit().await?;
        {
            let mut state = lock(&self.state);
            if state
                .editor
                .as_ref()
                .is_some_and(|open| Arc::ptr_eq(open, &editor))
            {
                state.close_form();
            }
        }
        submitted.refresh.wait().await;
        Ok(submitted.outcome)
    }

    /// Deletes after confirmation. `true` once the row is gone and the list
    /// has been refreshed, `false` when the user declined.
    pub async fn delete(&self, id: &str) -> ClientResult<bool> {
        match self.deleter.delete(id).await? {
            DeleteOutcome::Cancelled => Ok(false),
            DeleteOutcome::Deleted { refresh } => {
                refresh.wait().await;
                Ok(true)
            }
        }
    }

    /// Requests a reload and waits for it
    pub async fn reload(&self) -> bool {
        self.refresh.request(RefreshReason::Manual).wait().await
    }

    pub async fn sign_out(&self) -> ClientResult<()> {
        self.ctx.auth.sign_out().await
    }

    pub fn view(&self) -> ScreenView {
        if !self.session.is_signed_in() {
            return ScreenView::SignIn(SignInView::default());
        }
        let (route, editor) = {
            let state = lock(&self.state);
            (state.route.clone(), state.editor.clone())
        };
        match (route, editor) {
            (Route::Form { .. }, Some(editor)) => ScreenView::Form(FormView::build(
                &editor.form(),
                editor.is_editing(),
                editor.in_flight(),
            )),
            _ => ScreenView::List(ListView::build(&self.loader.snapshot())),
        }
    }

    /// Stops the watcher and every background task
    pub fn shutdown(&self) {
        self.watcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .stop();
        self.refresh.shutdown();
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("Employee screen stopped");
    }

    fn editor(&self) -> Option<Arc<RecordEditor>> {
        lock(&self.state).editor.clone()
    }

    fn find(&self, id: &str) -> Option<Employee> {
        self.loader
            .snapshot()
            .employees
            .into_iter()
            .find(|e| e.id == id)
    }
}

impl Drop for EmployeeScreen {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Raises "Authentication Required" once if the startup pull finds no session
fn spawn_auth_notice(
    mut transitions: broadcast::Receiver<SessionTransition>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return,
                next = transitions.recv() => next,
            };
            match next {
                Ok(t) if t.origin == TransitionOrigin::Bootstrap => {
                    if t.current.is_none() {
                        notifier.notify(Notification::auth_required());
                    }
                    return;
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    })
}
