//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open SQLite connections in read-only or read-write mode.
//! - Create/upgrade the schema (read-write) or verify it (read-only).
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Opening and schema creation are separate, individually callable steps.
//! - Core code must not read/write metadata before the schema is ready.

use crate::error::ErrorKind;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_connection, open_db, open_db_in_memory, verify_schema};

pub const STATION_TABLE: &str = "station";
pub const CHANNEL_TABLE: &str = "channel";

pub type DbResult<T> = Result<T, DbError>;

/// Access mode requested when opening a metadata database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Serve queries only; the file and schema must already exist.
    ReadOnly,
    /// Create the file, parent directories and schema when missing.
    ReadWrite,
}

impl OpenMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::ReadWrite => "read_write",
        }
    }
}

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    NotFound {
        path: PathBuf,
    },
    MissingTable {
        table: &'static str,
    },
    SchemaInvalid(String),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    ReadOnly,
    Closed,
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(err) => sqlite_error_kind(err),
            Self::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                _ => ErrorKind::Io,
            },
            Self::NotFound { .. } | Self::MissingTable { .. } => ErrorKind::NotFound,
            Self::SchemaInvalid(_) | Self::UnsupportedSchemaVersion { .. } => {
                ErrorKind::SchemaInvalid
            }
            Self::ReadOnly => ErrorKind::PermissionDenied,
            Self::Closed => ErrorKind::Io,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::NotFound { path } => write!(f, "database `{}` does not exist", path.display()),
            Self::MissingTable { table } => write!(f, "required table `{table}` does not exist"),
            Self::SchemaInvalid(message) => write!(f, "invalid database schema: {message}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::ReadOnly => write!(f, "database was opened read-only"),
            Self::Closed => write!(f, "database handle is closed"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::NotFound { .. }
            | Self::MissingTable { .. }
            | Self::SchemaInvalid(_)
            | Self::UnsupportedSchemaVersion { .. }
            | Self::ReadOnly
            | Self::Closed => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

fn sqlite_error_kind(err: &rusqlite::Error) -> ErrorKind {
    match err.sqlite_error_code() {
        Some(ErrorCode::PermissionDenied | ErrorCode::ReadOnly) => ErrorKind::PermissionDenied,
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => ErrorKind::SchemaInvalid,
        _ => ErrorKind::Io,
    }
}
