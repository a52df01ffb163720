//! Staff Client - employee records screen over a hosted row/auth API
//!
//! Session gating, list loading with refetch-on-write, and the create/edit/
//! delete flows, exposed as view models a front end can render.

pub mod auth;
pub mod config;
pub mod deleter;
pub mod editor;
pub mod error;
pub mod http;
pub mod loader;
pub mod notify;
pub mod refresh;
pub mod screen;
pub mod session;
pub mod store;
pub mod view;

pub use auth::{AuthProvider, AuthStateChange, NetworkAuthClient, SessionStore, StaticAuthProvider};
pub use config::ClientConfig;
pub use deleter::{Confirmation, DeleteOutcome, FixedConfirmation, RecordDeleter};
pub use editor::{EmployeeForm, FormField, MutationContext, MutationOutcome, RecordEditor, Submitted};
pub use error::{ClientError, ClientResult};
pub use http::NetworkHttpClient;
pub use loader::{ListState, RecordListLoader};
pub use notify::{ChannelNotifier, Notification, NotificationVariant, Notifier, TracingNotifier};
pub use refresh::{RefreshHandle, RefreshOrchestrator, RefreshReason, RefreshTicket};
pub use screen::{EmployeeScreen, Route, RouteNavigator};
pub use session::{NavigationObserver, Navigator, SessionContext, SessionInfo, SessionWatcher};
pub use store::{EmployeeStore, InMemoryEmployeeStore, RestEmployeeStore};
pub use view::ScreenView;

// Re-export shared types for convenience
pub use shared::client::{AuthChangeEvent, AuthUser, Session};
pub use shared::models::{Employee, EmployeePayload, EmploymentStatus};
