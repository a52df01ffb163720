//! Shared types for the Staff Desk workspace
//!
//! Wire types used by both the client library and the mock backend:
//! employee records, auth DTOs and the unified error system.

pub mod client;
pub mod error;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use client::{AuthChangeEvent, AuthUser, Session, SignInRequest};
pub use error::{AppError, AppResult, ErrorBody, ErrorCode};
pub use models::{Employee, EmployeePayload, EmploymentStatus};
