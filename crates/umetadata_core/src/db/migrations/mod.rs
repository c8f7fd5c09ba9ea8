//! Schema versions for the metadata database.
//!
//! Version 1 creates `station`, version 2 adds `channel`. The version a file
//! is at lives in `PRAGMA user_version`; read-write opens bring it up to
//! [`latest_version`] in one transaction, read-only opens only compare.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    sql: &'static str,
}

/// Ordered by `version`, starting at 1 with no gaps.
const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        sql: include_str!("0001_station.sql"),
    },
    SchemaStep {
        version: 2,
        sql: include_str!("0002_channel.sql"),
    },
];

/// Schema version this build writes and expects.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings a read-write connection up to [`latest_version`].
///
/// A file already at the latest version is left untouched.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = current_user_version(conn)?;
    let latest = latest_version();

    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }
    if found == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > found) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        found, latest
    );
    Ok(())
}

/// Schema version recorded in the file; 0 for a fresh database.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, current_user_version, latest_version, SCHEMA_STEPS};
    use rusqlite::Connection;

    #[test]
    fn steps_are_contiguous_from_one() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn version_one_database_gains_channel_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_STEPS[0].sql).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        apply_migrations(&mut conn).unwrap();

        assert_eq!(current_user_version(&conn).unwrap(), 2);
        let channels: i64 = conn
            .query_row("SELECT COUNT(*) FROM channel;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(channels, 0);
    }
}
