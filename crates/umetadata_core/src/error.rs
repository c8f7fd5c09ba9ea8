//! Crate-wide error classification.
//!
//! # Responsibility
//! - Give every layer (model, db, repo, service) one shared vocabulary for
//!   failure categories.
//!
//! # Invariants
//! - Each concrete error type maps to exactly one `ErrorKind`.
//! - Duplicate inserts are not errors and have no kind.

use std::fmt::{Display, Formatter};

/// Coarse failure category callers can branch on without matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A field value was rejected at assignment time.
    InvalidArgument,
    /// A required field was read before it was assigned.
    NotSet,
    /// Export or persistence was attempted on an incomplete entity.
    Incomplete,
    /// Backing store (or its schema) is missing.
    NotFound,
    /// The backing store cannot be written or opened with the requested mode.
    PermissionDenied,
    /// The backing store exists but its schema is corrupt or unsupported.
    SchemaInvalid,
    /// Any other IO or engine failure.
    Io,
}

impl ErrorKind {
    /// Stable snake_case code used in log lines and service envelopes.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotSet => "not_set",
            Self::Incomplete => "incomplete",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::SchemaInvalid => "schema_invalid",
            Self::Io => "io_error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
