//! Shared server state
//!
//! Everything lives in memory: accounts, issued-token revocations and the
//! employee rows. Locks are std locks held only for synchronous sections.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use shared::models::Employee;

use crate::auth::JwtKeys;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: String,
    pub email: String,
    password: String,
}

pub struct AppState {
    pub config: Config,
    pub jwt: JwtKeys,
    users: Vec<MockUser>,
    employees: RwLock<Vec<Employee>>,
    revoked: Mutex<HashSet<String>>,
    last_created: Mutex<Option<DateTime<Utc>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("users", &self.users.len())
            .field("employees", &self.read_rows().len())
            .finish()
    }
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let users = config
            .seed_users
            .iter()
            .map(|seed| MockUser {
                id: uuid::Uuid::new_v4().to_string(),
                email: seed.email.clone(),
                password: seed.password.clone(),
            })
            .collect();
        Self {
            jwt: JwtKeys::new(&config.jwt_secret, config.token_ttl_secs),
            config,
            users,
            employees: RwLock::new(Vec::new()),
            revoked: Mutex::new(HashSet::new()),
            last_created: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Option<&MockUser> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
    }

    pub fn user(&self, id: &str) -> Option<&MockUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn revoke(&self, token: &str) {
        self.revoked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.to_string());
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(token)
    }

    pub fn read_rows(&self) -> RwLockReadGuard<'_, Vec<Employee>> {
        self.employees
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write_rows(&self) -> RwLockWriteGuard<'_, Vec<Employee>> {
        self.employees
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creation timestamp, strictly increasing across rows
    pub fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self
            .last_created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut now = Utc::now();
        if let Some(prev) = *last
            && now <= prev
        {
            now = prev + chrono::Duration::microseconds(1);
        }
        *last = Some(now);
        now
    }

    // ========== Fault injection ==========

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) -> bool {
        self.fail_reads.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) -> bool {
        self.fail_writes.load(Ordering::SeqCst)
    }
}
