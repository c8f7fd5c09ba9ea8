//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections with the requested mode.
//! - Configure connection pragmas required by core behavior.
//! - Prepare (read-write) or verify (read-only) the schema.
//!
//! # Invariants
//! - Read-only opens never create files, directories or tables.
//! - Connections returned by `open_db` are ready for queries.

use super::migrations::{apply_migrations, current_user_version, latest_version};
use super::{DbError, DbResult, OpenMode, CHANNEL_TABLE, STATION_TABLE};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a database file and prepares its schema for `mode`.
///
/// # Side effects
/// - Read-write: creates missing parent directories, the file and schema.
/// - Emits `db_open` logging events with duration and status.
///
/// # Errors
/// - `NotFound` when a read-only target or its tables are missing.
/// - `SchemaInvalid` for foreign, corrupt or newer-than-supported files.
pub fn open_db(path: impl AsRef<Path>, mode: OpenMode) -> DbResult<Connection> {
    let started_at = Instant::now();
    let path = path.as_ref();
    info!(
        "event=db_open module=db status=start mode=file access={}",
        mode.as_str()
    );

    let result = open_connection(path, mode).and_then(|mut conn| {
        match mode {
            OpenMode::ReadWrite => apply_migrations(&mut conn)?,
            OpenMode::ReadOnly => verify_schema(&conn)?,
        }
        Ok(conn)
    });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode=file access={} duration_ms={}",
            mode.as_str(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode=file access={} duration_ms={} error_code={} error={}",
            mode.as_str(),
            started_at.elapsed().as_millis(),
            err.kind(),
            err
        ),
    }
    result
}

/// Opens an in-memory database with the schema applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory access=read_write");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            configure_connection(&conn)?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode=memory access=read_write duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode=memory duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.kind(),
            err
        ),
    }
    result
}

/// Opens a raw connection without touching the schema.
///
/// Read-write mode creates the file and its parent directories when
/// missing; read-only mode requires the file to exist.
pub fn open_connection(path: &Path, mode: OpenMode) -> DbResult<Connection> {
    let flags = match mode {
        OpenMode::ReadOnly => {
            ensure_exists(path)?;
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI
        }
        OpenMode::ReadWrite => {
            create_parent_dirs(path)?;
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI
        }
    };

    let conn = Connection::open_with_flags(path, flags)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Checks that the schema is present and at the version this build expects.
///
/// Used for read-only handles, which cannot migrate.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    let version = current_user_version(conn)?;
    let latest = latest_version();
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }

    for table in [STATION_TABLE, CHANNEL_TABLE] {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingTable { table });
        }
    }

    if version < latest {
        return Err(DbError::SchemaInvalid(format!(
            "schema version {version} is older than {latest}; open read-write to migrate"
        )));
    }
    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn configure_connection(conn: &Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn ensure_exists(path: &Path) -> DbResult<()> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(DbError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(DbError::Io {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}

fn create_parent_dirs(path: &Path) -> DbResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    info!(
        "event=db_create_dir module=db status=start dir={}",
        parent.display()
    );
    std::fs::create_dir_all(parent).map_err(|err| DbError::Io {
        path: parent.to_path_buf(),
        source: err,
    })
}
