use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use shared::models::{Employee, EmployeePayload};

use super::EmployeeStore;
use crate::{ClientError, ClientResult};

/// Request counters, for asserting what actually reached the store
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreCalls {
    pub lists: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl StoreCalls {
    pub fn writes(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

/// Process-local employee store
///
/// Same ordering contract as the backend (newest first). Reads and writes
/// can be switched to fail, to exercise the error paths.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    rows: Mutex<Vec<Employee>>,
    next_id: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    lists: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            lists: self.lists.load(Ordering::SeqCst),
            inserts: self.inserts.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Rows in storage order (oldest first)
    pub fn rows(&self) -> Vec<Employee> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Employee>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writes(&self) -> ClientResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("write rejected by store".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn list(&self) -> ClientResult<Vec<Employee>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("read rejected by store".into()));
        }
        let mut rows = self.rows();
        // Reverse first so equal timestamps still come out newest first
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, payload: &EmployeePayload) -> ClientResult<Employee> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let employee = Employee {
            id: format!("emp-{}", n),
            name: payload.name.clone(),
            email: payload.email.clone(),
            designation: payload.designation.clone(),
            department: payload.department.clone(),
            salary: payload.salary,
            date_of_joining: payload.date_of_joining,
            last_day_of_working: payload.last_day_of_working,
            user_id: payload.user_id.clone(),
            created_at: Utc::now(),
        };
        self.lock().push(employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: &str, payload: &EmployeePayload) -> ClientResult<Employee> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        let mut rows = self.lock();
        let row = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Employee {}", id)))?;
        if row.user_id != payload.user_id {
            return Err(ClientError::Forbidden("record owner cannot be changed".into()));
        }
        row.name = payload.name.clone();
        row.email = payload.email.clone();
        row.designation = payload.designation.clone();
        row.department = payload.department.clone();
        row.salary = payload.salary;
        row.date_of_joining = payload.date_of_joining;
        row.last_day_of_working = payload.last_day_of_working;
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        self.lock().retain(|e| e.id != id);
        Ok(())
    }
}
