//! Record editor
//!
//! Create and update share one flow. The form keeps what the user typed;
//! it is only parsed into an [`EmployeePayload`] at submit time, after the
//! acting user has been re-resolved with the auth provider.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{Employee, EmployeePayload};

use crate::auth::AuthProvider;
use crate::notify::{Notification, Notifier, messages};
use crate::refresh::{RefreshHandle, RefreshReason, RefreshTicket};
use crate::store::EmployeeStore;
use crate::{ClientError, ClientResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Collaborators shared by every mutation
#[derive(Clone)]
pub struct MutationContext {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn EmployeeStore>,
    pub notifier: Arc<dyn Notifier>,
    pub refresh: RefreshHandle,
}

/// Form fields in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    Designation,
    Department,
    Salary,
    DateOfJoining,
    LastDayOfWorking,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Name,
        FormField::Email,
        FormField::Designation,
        FormField::Department,
        FormField::Salary,
        FormField::DateOfJoining,
        FormField::LastDayOfWorking,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Designation => "Designation",
            Self::Department => "Department",
            Self::Salary => "Salary",
            Self::DateOfJoining => "Date of Joining",
            Self::LastDayOfWorking => "Last Day of Working (Optional)",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, Self::LastDayOfWorking)
    }
}

/// Raw form input, one string per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeForm {
    pub name: String,
    pub email: String,
    pub designation: String,
    pub department: String,
    pub salary: String,
    pub date_of_joining: String,
    pub last_day_of_working: String,
}

impl EmployeeForm {
    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            name: employee.name.clone(),
            email: employee.email.clone(),
            designation: employee.designation.clone(),
            department: employee.department.clone(),
            salary: employee.salary.normalize().to_string(),
            date_of_joining: employee.date_of_joining.format(DATE_FORMAT).to_string(),
            last_day_of_working: employee
                .last_day_of_working
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Email => &self.email,
            FormField::Designation => &self.designation,
            FormField::Department => &self.department,
            FormField::Salary => &self.salary,
            FormField::DateOfJoining => &self.date_of_joining,
            FormField::LastDayOfWorking => &self.last_day_of_working,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Name => &mut self.name,
            FormField::Email => &mut self.email,
            FormField::Designation => &mut self.designation,
            FormField::Department => &mut self.department,
            FormField::Salary => &mut self.salary,
            FormField::DateOfJoining => &mut self.date_of_joining,
            FormField::LastDayOfWorking => &mut self.last_day_of_working,
        };
        *slot = value.into();
    }

    /// Builds the write body, stamping `user_id` as the owner
    ///
    /// Text fields go out as typed. An empty last day becomes `None`.
    pub fn to_payload(&self, user_id: &str) -> ClientResult<EmployeePayload> {
        for field in FormField::ALL {
            if field.is_required() && self.get(field).trim().is_empty() {
                return Err(ClientError::Validation(format!("{} is required", field.label())));
            }
        }

        let salary = Decimal::from_str(self.salary.trim()).map_err(|_| {
            ClientError::Validation(format!("{} must be a number", FormField::Salary.label()))
        })?;
        if salary < Decimal::ZERO {
            return Err(ClientError::Validation(format!(
                "{} must not be negative",
                FormField::Salary.label()
            )));
        }

        let date_of_joining = parse_date(FormField::DateOfJoining, &self.date_of_joining)?;
        let last_day_of_working = match self.last_day_of_working.trim() {
            "" => None,
            _ => Some(parse_date(
                FormField::LastDayOfWorking,
                &self.last_day_of_working,
            )?),
        };

        Ok(EmployeePayload {
            name: self.name.clone(),
            email: self.email.clone(),
            designation: self.designation.clone(),
            department: self.department.clone(),
            salary,
            date_of_joining,
            last_day_of_working,
            user_id: user_id.to_string(),
        })
    }
}

fn parse_date(field: FormField, value: &str) -> ClientResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ClientError::Validation(format!("{} must be a date (YYYY-MM-DD)", field.label()))
    })
}

/// Set while a request is running, cleared on drop
pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created(Employee),
    Updated(Employee),
}

impl MutationOutcome {
    pub fn employee(&self) -> &Employee {
        match self {
            Self::Created(e) | Self::Updated(e) => e,
        }
    }
}

/// Successful submit, with the pending list refresh
#[derive(Debug)]
pub struct Submitted {
    pub outcome: MutationOutcome,
    pub refresh: RefreshTicket,
}

/// Create/update form bound to at most one existing record
pub struct RecordEditor {
    ctx: MutationContext,
    editing: Option<String>,
    form: Mutex<EmployeeForm>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for RecordEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordEditor")
            .field("editing", &self.editing)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl RecordEditor {
    /// Blank form, submit inserts
    pub fn create(ctx: MutationContext) -> Self {
        Self {
            ctx,
            editing: None,
            form: Mutex::new(EmployeeForm::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Form pre-filled from `employee`, submit updates that id
    pub fn edit(ctx: MutationContext, employee: &Employee) -> Self {
        Self {
            ctx,
            editing: Some(employee.id.clone()),
            form: Mutex::new(EmployeeForm::from_employee(employee)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn form(&self) -> EmployeeForm {
        self.lock_form().clone()
    }

    pub fn update_form(&self, f: impl FnOnce(&mut EmployeeForm)) {
        f(&mut self.lock_form());
    }

    pub fn set_field(&self, field: FormField, value: impl Into<String>) {
        self.lock_form().set(field, value);
    }

    fn lock_form(&self) -> MutexGuard<'_, EmployeeForm> {
        self.form.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates and saves the form
    ///
    /// The form is left untouched on every failure path.
    pub async fn submit(&self) -> ClientResult<Submitted> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ClientError::SubmitInFlight)?;

        let user = match self.ctx.auth.get_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Submit without a session");
                self.ctx.notifier.notify(Notification::login_required());
                return Err(ClientError::NotAuthenticated);
            }
            Err(e) => return Err(self.save_failed(e)),
        };

        let payload = match self.form().to_payload(&user.id) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "Employee form rejected");
                self.ctx.notifier.notify(Notification::error(e.to_string()));
                return Err(e);
            }
        };

        let result = match &self.editing {
            Some(id) => self
                .ctx
                .store
                .update(id, &payload)
                .await
                .map(MutationOutcome::Updated),
            None => self
                .ctx
                .store
                .insert(&payload)
                .await
                .map(MutationOutcome::Created),
        };

        match result {
            Ok(outcome) => {
                let (message, reason) = match &outcome {
                    MutationOutcome::Created(_) => (messages::EMPLOYEE_ADDED, RefreshReason::Created),
                    MutationOutcome::Updated(_) => (messages::EMPLOYEE_UPDATED, RefreshReason::Updated),
                };
                tracing::info!(id = %outcome.employee().id, %reason, "Employee saved");
                self.ctx.notifier.notify(Notification::success(message));
                let refresh = self.ctx.refresh.request(reason);
                Ok(Submitted { outcome, refresh })
            }
            Err(e) => Err(self.save_failed(e)),
        }
    }

    fn save_failed(&self, e: ClientError) -> ClientError {
        tracing::error!(error = %e, editing = ?self.editing, "Error saving employee");
        self.ctx.notifier.notify(Notification::error(messages::SAVE_FAILED));
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
    use crate::store::InMemoryEmployeeStore;
    use async_trait::async_trait;
    use shared::client::AuthUser;
    use shared::models::EmploymentStatus;
    use tokio::sync::Semaphore;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        store: Arc<InMemoryEmployeeStore>,
        auth: Arc<StaticAuthProvider>,
        notifier: Arc<RecordingNotifier>,
        loader: Arc<RecordListLoader>,
        ctx: MutationContext,
        _watcher: SessionWatcher,
    }

    fn ana() -> AuthUser {
        AuthUser {
            id: "u-ana".into(),
            email: "ana@x.com".into(),
        }
    }

    fn harness_with(store: Arc<dyn EmployeeStore>, mem: Arc<InMemoryEmployeeStore>) -> Harness {
        let auth = Arc::new(StaticAuthProvider::signed_in(ana()));
        let notifier = Arc::new(RecordingNotifier::new());
        let loader = Arc::new(RecordListLoader::new(store.clone(), notifier.clone()));
        let watcher = SessionWatcher::new(auth.clone());
        let refresh =
            RefreshOrchestrator::spawn(loader.clone(), watcher.context(), CancellationToken::new());
        let ctx = MutationContext {
            auth: auth.clone(),
            store,
            notifier: notifier.clone(),
            refresh,
        };
        Harness {
            store: mem,
            auth,
            notifier,
            loader,
            ctx,
            _watcher: watcher,
        }
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryEmployeeStore::new());
        harness_with(store.clone(), store)
    }

    fn ana_form() -> EmployeeForm {
        EmployeeForm {
            name: "Ana Ruiz".into(),
            email: "ana@x.com".into(),
            designation: "Engineer".into(),
            department: "R&D".into(),
            salary: "90000".into(),
            date_of_joining: "2024-01-15".into(),
            last_day_of_working: String::new(),
        }
    }

    #[test]
    fn test_form_to_payload_normalizes_last_day() {
        let payload = ana_form().to_payload("u-ana").unwrap();
        assert_eq!(payload.last_day_of_working, None);
        assert_eq!(payload.salary, Decimal::from(90000));
        assert_eq!(payload.user_id, "u-ana");
        assert_eq!(
            EmploymentStatus::from_last_day(payload.last_day_of_working),
            EmploymentStatus::Active
        );
    }

    #[test]
    fn test_form_text_is_sent_as_typed() {
        let mut form = ana_form();
        form.name = " Ana Ruiz ".into();
        form.department = "R&D  ".into();
        let payload = form.to_payload("u-ana").unwrap();
        assert_eq!(payload.name, " Ana Ruiz ");
        assert_eq!(payload.department, "R&D  ");
    }

    #[test]
    fn test_form_requires_fields() {
        let mut form = ana_form();
        form.department = "  ".into();
        let err = form.to_payload("u-ana").unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m == "Department is required"));

        let mut form = ana_form();
        form.salary = "-5".into();
        assert!(form.to_payload("u-ana").is_err());

        let mut form = ana_form();
        form.date_of_joining = "15/01/2024".into();
        assert!(form.to_payload("u-ana").is_err());
    }

    #[test]
    fn test_form_round_trips_existing_record() {
        let payload = {
            let mut form = ana_form();
            form.last_day_of_working = "2024-06-01".into();
            form.to_payload("u-ana").unwrap()
        };
        let employee = Employee {
            id: "emp-1".into(),
            name: payload.name.clone(),
            email: payload.email.clone(),
            designation: payload.designation.clone(),
            department: payload.department.clone(),
            salary: payload.salary,
            date_of_joining: payload.date_of_joining,
            last_day_of_working: payload.last_day_of_working,
            user_id: payload.user_id.clone(),
            created_at: chrono::Utc::now(),
        };
        let form = EmployeeForm::from_employee(&employee);
        assert_eq!(form.salary, "90000");
        assert_eq!(form.last_day_of_working, "2024-06-01");
        assert_eq!(form.to_payload("u-ana").unwrap(), payload);
    }

    #[tokio::test]
    async fn test_create_inserts_once_and_refreshes() {
        let h = harness();
        let editor = RecordEditor::create(h.ctx.clone());
        editor.update_form(|f| *f = ana_form());

        let submitted = editor.submit().await.unwrap();
        assert!(matches!(submitted.outcome, MutationOutcome::Created(_)));
        assert!(submitted.refresh.wait().await);

        assert_eq!(h.store.calls().inserts, 1);
        assert_eq!(h.store.calls().updates, 0);
        let list = h.loader.snapshot().employees;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].user_id, "u-ana");
        assert_eq!(
            h.notifier.take(),
            vec![Notification::success(messages::EMPLOYEE_ADDED)]
        );
    }

    #[tokio::test]
    async fn test_edit_updates_that_id_only() {
        let h = harness();
        let existing = h
            .store
            .insert(&ana_form().to_payload("u-ana").unwrap())
            .await
            .unwrap();

        let editor = RecordEditor::edit(h.ctx.clone(), &existing);
        assert_eq!(editor.form(), ana_form());
        editor.set_field(FormField::LastDayOfWorking, "2024-06-01");
        let submitted = editor.submit().await.unwrap();
        submitted.refresh.wait().await;

        let calls = h.store.calls();
        assert_eq!((calls.inserts, calls.updates), (1, 1));
        let list = h.loader.snapshot().employees;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, existing.id);
        assert_eq!(list[0].status(), EmploymentStatus::Inactive);
    }

    #[tokio::test]
    async fn test_submit_without_session_sends_nothing() {
        let h = harness();
        h.auth.revoke();
        let editor = RecordEditor::create(h.ctx.clone());
        editor.update_form(|f| *f = ana_form());

        let err = editor.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert_eq!(h.store.calls().writes(), 0);
        assert_eq!(h.notifier.take(), vec![Notification::login_required()]);
        assert_eq!(editor.form(), ana_form());
        assert!(!editor.in_flight());
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let h = harness();
        let editor = RecordEditor::create(h.ctx.clone());
        editor.update_form(|f| {
            *f = ana_form();
            f.name.clear();
        });

        let err = editor.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(h.store.calls().writes(), 0);
        assert!(h.notifier.all()[0].is_error());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_form() {
        let h = harness();
        h.store.set_fail_writes(true);
        let editor = RecordEditor::create(h.ctx.clone());
        editor.update_form(|f| *f = ana_form());

        assert!(editor.submit().await.is_err());
        assert_eq!(editor.form(), ana_form());
        assert!(!editor.in_flight());
        assert_eq!(
            h.notifier.take(),
            vec![Notification::error(messages::SAVE_FAILED)]
        );
        assert_eq!(h.store.calls().lists, 0);
    }

    /// Holds inserts until a permit is released
    struct GatedStore {
        inner: Arc<InMemoryEmployeeStore>,
        gate: Semaphore,
    }

    #[async_trait]
    impl EmployeeStore for GatedStore {
        async fn list(&self) -> ClientResult<Vec<Employee>> {
            self.inner.list().await
        }

        async fn insert(&self, payload: &EmployeePayload) -> ClientResult<Employee> {
            let _permit = self.gate.acquire().await;
            self.inner.insert(payload).await
        }

        async fn update(&self, id: &str, payload: &EmployeePayload) -> ClientResult<Employee> {
            self.inner.update(id, payload).await
        }

        async fn delete(&self, id: &str) -> ClientResult<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_double_submit_is_rejected() {
        let mem = Arc::new(InMemoryEmployeeStore::new());
        let gated = Arc::new(GatedStore {
            inner: mem.clone(),
            gate: Semaphore::new(0),
        });
        let h = harness_with(gated.clone(), mem);
        let editor = Arc::new(RecordEditor::create(h.ctx.clone()));
        editor.update_form(|f| *f = ana_form());

        let first = tokio::spawn({
            let editor = editor.clone();
            async move { editor.submit().await.map(|s| s.outcome) }
        });
        while !editor.in_flight() {
            tokio::task::yield_now().await;
        }

        let err = editor.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::SubmitInFlight));

        gated.gate.add_permits(1);
        assert!(first.await.unwrap().is_ok());
        assert_eq!(h.store.calls().inserts, 1);
        assert!(!editor.in_flight());
    }
}
