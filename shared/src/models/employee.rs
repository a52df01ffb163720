//! Employee Model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Employee record as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Backend-assigned id, immutable
    pub id: String,
    pub name: String,
    pub email: String,
    pub designation: String,
    pub department: String,
    pub salary: Decimal,
    pub date_of_joining: NaiveDate,
    #[serde(default)]
    pub last_day_of_working: Option<NaiveDate>,
    /// Owning principal, stamped once at creation
    pub user_id: String,
    /// Backend-assigned, only used for default ordering
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Derived employment status, never stored
    pub fn status(&self) -> EmploymentStatus {
        EmploymentStatus::from_last_day(self.last_day_of_working)
    }

    /// Write body carrying this record's current values
    pub fn to_payload(&self) -> EmployeePayload {
        EmployeePayload {
            name: self.name.clone(),
            email: self.email.clone(),
            designation: self.designation.clone(),
            department: self.department.clone(),
            salary: self.salary,
            date_of_joining: self.date_of_joining,
            last_day_of_working: self.last_day_of_working,
            user_id: self.user_id.clone(),
        }
    }
}

/// Insert/update body (full-record overwrite)
///
/// `last_day_of_working` is always serialized, `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayload {
    pub name: String,
    pub email: String,
    pub designation: String,
    pub department: String,
    pub salary: Decimal,
    pub date_of_joining: NaiveDate,
    pub last_day_of_working: Option<NaiveDate>,
    pub user_id: String,
}

/// Active while no last working day is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    Active,
    Inactive,
}

impl EmploymentStatus {
    pub fn from_last_day(last_day_of_working: Option<NaiveDate>) -> Self {
        match last_day_of_working {
            Some(_) => Self::Inactive,
            None => Self::Active,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
