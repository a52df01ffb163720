//! Data models shared between the client and the backend

pub mod employee;

pub use employee::{Employee, EmployeePayload, EmploymentStatus};
