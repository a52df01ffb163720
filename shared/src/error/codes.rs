//! Unified error codes
//!
//! `u16` on the wire. The thousands digit is the category:
//! 0 general, 1 auth, 2 permission, 8 employee, 9 system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares `ErrorCode` together with its default messages and the reverse
/// `u16` lookup, so the three never drift apart.
macro_rules! error_codes {
    ($( $variant:ident = $value:literal => $message:literal, )+) => {
        /// Unified error code enum
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u16", try_from = "u16")]
        #[repr(u16)]
        pub enum ErrorCode {
            $( $variant = $value, )+
        }

        impl ErrorCode {
            /// Every known code, in declaration order
            pub const ALL: &'static [ErrorCode] = &[$( ErrorCode::$variant, )+];

            /// Developer-facing default message
            pub const fn message(&self) -> &'static str {
                match self {
                    $( ErrorCode::$variant => $message, )+
                }
            }
        }

        impl TryFrom<u16> for ErrorCode {
            type Error = InvalidErrorCode;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(ErrorCode::$variant), )+
                    _ => Err(InvalidErrorCode(value)),
                }
            }
        }
    };
}

error_codes! {
    // General
    Success = 0 => "Operation completed successfully",
    Unknown = 1 => "An unknown error occurred",
    ValidationFailed = 2 => "Validation failed",
    NotFound = 3 => "Resource not found",
    AlreadyExists = 4 => "Resource already exists",
    InvalidRequest = 5 => "Invalid request",
    InvalidFormat = 6 => "Invalid format",
    RequiredField = 7 => "Required field is missing",
    ValueOutOfRange = 8 => "Value is out of range",

    // Auth
    NotAuthenticated = 1001 => "User is not authenticated",
    InvalidCredentials = 1002 => "Invalid email or password",
    TokenExpired = 1003 => "Authentication token has expired",
    TokenInvalid = 1004 => "Authentication token is invalid",
    SessionExpired = 1005 => "Session has expired",

    // Permission
    PermissionDenied = 2001 => "Permission denied",
    OwnerImmutable = 2006 => "Record owner cannot be changed",

    // Employee
    EmployeeNotFound = 8001 => "Employee not found",
    EmployeeInvalidSalary = 8006 => "Salary must not be negative",

    // System
    InternalError = 9001 => "Internal server error",
    DatabaseError = 9002 => "Database error",
    NetworkError = 9003 => "Network error",
    TimeoutError = 9004 => "Operation timed out",
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A `u16` this build has no code for
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);
