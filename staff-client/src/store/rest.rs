use async_trait::async_trait;
use shared::models::{Employee, EmployeePayload};

use super::EmployeeStore;
use crate::http::NetworkHttpClient;
use crate::{ClientConfig, ClientError, ClientResult};

/// Row API client for the employees collection
#[derive(Debug, Clone)]
pub struct RestEmployeeStore {
    http: NetworkHttpClient,
    path: String,
}

impl RestEmployeeStore {
    pub fn new(config: &ClientConfig, http: NetworkHttpClient) -> Self {
        Self {
            http,
            path: format!("rest/v1/{}", config.table),
        }
    }

    fn first(rows: Vec<Employee>, what: &str) -> ClientResult<Employee> {
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse(format!("{} returned no row", what)))
    }
}

#[async_trait]
impl EmployeeStore for RestEmployeeStore {
    async fn list(&self) -> ClientResult<Vec<Employee>> {
        self.http
            .get(&self.path, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    async fn insert(&self, payload: &EmployeePayload) -> ClientResult<Employee> {
        let rows: Vec<Employee> = self
            .http
            .post(&self.path, &[], std::slice::from_ref(payload))
            .await?;
        Self::first(rows, "insert")
    }

    async fn update(&self, id: &str, payload: &EmployeePayload) -> ClientResult<Employee> {
        let filter = format!("eq.{}", id);
        let rows: Vec<Employee> = self
            .http
            .patch(&self.path, &[("id", filter.as_str())], payload)
            .await?;
        // An empty result means nothing in scope matched the id
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(format!("Employee {}", id)))
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        let filter = format!("eq.{}", id);
        let rows: Vec<Employee> = self
            .http
            .delete(&self.path, &[("id", filter.as_str())])
            .await?;
        if rows.is_empty() {
            tracing::warn!(id, "Delete matched no row");
        }
        Ok(())
    }
}
