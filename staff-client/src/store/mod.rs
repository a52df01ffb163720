//! Employee row access
//!
//! [`EmployeeStore`] is the boundary with the records collection. The
//! backend filters rows by access scope; the client never filters locally.

mod memory;
mod rest;

use async_trait::async_trait;
use shared::models::{Employee, EmployeePayload};

use crate::ClientResult;

pub use memory::{InMemoryEmployeeStore, StoreCalls};
pub use rest::RestEmployeeStore;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Every row in scope, newest `created_at` first, no limit
    async fn list(&self) -> ClientResult<Vec<Employee>>;

    async fn insert(&self, payload: &EmployeePayload) -> ClientResult<Employee>;

    /// Full-record overwrite of the row with `id`
    async fn update(&self, id: &str, payload: &EmployeePayload) -> ClientResult<Employee>;

    async fn delete(&self, id: &str) -> ClientResult<()>;
}
