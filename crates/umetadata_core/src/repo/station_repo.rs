//! Station repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist stations behind the validity-window overlap rule.
//! - Answer "active at instant" queries over the `station` table.
//!
//! # Invariants
//! - A station whose window overlaps a stored window for the same key is
//!   skipped, not stored and not reported as an error. Windows that only
//!   touch (`[a, b)` then `[b, c)`) count as overlapping.
//! - Overlap check and INSERT run in one `IMMEDIATE` transaction.
//! - Bulk reads skip undecodable rows with a warning instead of failing.

use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::station::{Station, StationKey};
use crate::model::time::{fractional_seconds_to_micros, micros_to_fractional_seconds};
use crate::model::validate::ModelError;
use log::{debug, warn};
use rusqlite::types::FromSql;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const STATION_SELECT_SQL: &str = "SELECT
    network,
    name,
    description,
    latitude,
    longitude,
    elevation,
    start_time,
    end_time,
    last_modified
FROM station";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for metadata persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelError),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::Db(err) => err.kind(),
            Self::InvalidData(_) => ErrorKind::SchemaInvalid,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted metadata: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelError> for RepoError {
    fn from(value: ModelError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a single insert that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An overlapping record already exists for the same key.
    DuplicateSkipped,
}

/// One element of a bulk insert that failed outright.
#[derive(Debug)]
pub struct BulkInsertFailure {
    /// Position in the input slice.
    pub index: usize,
    pub error: RepoError,
}

/// Per-element accounting for `insert_*s` bulk calls.
#[derive(Debug, Default)]
pub struct BulkInsertSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failures: Vec<BulkInsertFailure>,
}

impl BulkInsertSummary {
    pub(crate) fn record(&mut self, index: usize, result: RepoResult<InsertOutcome>) {
        match result {
            Ok(InsertOutcome::Inserted) => self.inserted += 1,
            Ok(InsertOutcome::DuplicateSkipped) => self.skipped += 1,
            Err(error) => self.failures.push(BulkInsertFailure { index, error }),
        }
    }

    /// Number of elements that were neither inserted nor skipped.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Repository interface for station metadata.
pub trait StationRepository {
    /// Persists one station, stamping `last_modified` with `now_micros` when
    /// the caller cleared it.
    fn insert_station(&self, station: &Station, now_micros: i64) -> RepoResult<InsertOutcome>;

    /// Returns every station whose window contains `at` (epoch seconds).
    /// Order is unspecified.
    fn active_stations(&self, at: i64) -> RepoResult<Vec<Station>>;

    /// Returns the station for `key` whose window contains `at`, if any.
    fn active_station(&self, key: &StationKey, at: i64) -> RepoResult<Option<Station>>;

    /// Inserts each station independently; one failure never aborts the rest.
    fn insert_stations(&self, stations: &[Station], now_micros: i64) -> BulkInsertSummary {
        let mut summary = BulkInsertSummary::default();
        for (index, station) in stations.iter().enumerate() {
            let result = self.insert_station(station, now_micros);
            if let Err(err) = &result {
                warn!(
                    "event=station_insert module=repo status=error index={} error_code={} error={}",
                    index,
                    err.kind(),
                    err
                );
            }
            summary.record(index, result);
        }
        summary
    }
}

/// SQLite-backed station repository.
pub struct SqliteStationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StationRepository for SqliteStationRepository<'_> {
    fn insert_station(&self, station: &Station, now_micros: i64) -> RepoResult<InsertOutcome> {
        station.check_complete()?;
        let key = station.key()?;
        let (valid_from, valid_until) = station.validity()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if overlapping_station_exists(&tx, &key, valid_from, valid_until)? {
            warn!(
                "event=station_insert module=repo status=skipped key={} valid_from={} valid_until={} reason=overlap",
                key, valid_from, valid_until
            );
            return Ok(InsertOutcome::DuplicateSkipped);
        }

        let last_modified = station.last_modified().unwrap_or(now_micros);
        tx.execute(
            "INSERT INTO station (
                network,
                name,
                description,
                latitude,
                longitude,
                elevation,
                start_time,
                end_time,
                last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                key.network,
                key.name,
                station.description(),
                station.latitude()?,
                station.longitude()?,
                station.elevation()?,
                valid_from,
                valid_until,
                micros_to_fractional_seconds(last_modified),
            ],
        )?;
        tx.commit()?;

        debug!(
            "event=station_insert module=repo status=ok key={} valid_from={} valid_until={}",
            key, valid_from, valid_until
        );
        Ok(InsertOutcome::Inserted)
    }

    fn active_stations(&self, at: i64) -> RepoResult<Vec<Station>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STATION_SELECT_SQL}
             WHERE start_time <= ?1 AND ?1 < end_time;"
        ))?;

        let mut rows = stmt.query([at])?;
        let mut stations = Vec::new();
        while let Some(row) = rows.next()? {
            match parse_station_row(row) {
                Ok(station) => stations.push(station),
                Err(err) => log_skipped_row("station", &err),
            }
        }

        Ok(stations)
    }

    fn active_station(&self, key: &StationKey, at: i64) -> RepoResult<Option<Station>> {
        // Several active rows can only exist if the overlap rule was bypassed;
        // the latest start wins.
        let mut stmt = self.conn.prepare(&format!(
            "{STATION_SELECT_SQL}
             WHERE network = ?1
               AND name = ?2
               AND start_time <= ?3 AND ?3 < end_time
             ORDER BY start_time DESC, rowid DESC;"
        ))?;

        let mut rows = stmt.query(params![key.network, key.name, at])?;
        while let Some(row) = rows.next()? {
            match parse_station_row(row) {
                Ok(station) => return Ok(Some(station)),
                Err(err) => log_skipped_row("station", &err),
            }
        }

        Ok(None)
    }
}

fn overlapping_station_exists(
    conn: &Connection,
    key: &StationKey,
    valid_from: i64,
    valid_until: i64,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM station
            WHERE network = ?1
              AND name = ?2
              AND start_time <= ?4
              AND ?3 <= end_time
        );",
        params![key.network, key.name, valid_from, valid_until],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_station_row(row: &Row<'_>) -> RepoResult<Station> {
    let mut station = Station::new();
    station.set_network(&column::<String>(row, "network")?)?;
    station.set_name(&column::<String>(row, "name")?)?;
    if let Some(description) = column::<Option<String>>(row, "description")? {
        station.set_description(description);
    }
    station.set_latitude(column(row, "latitude")?)?;
    station.set_longitude(column(row, "longitude")?);
    station.set_elevation(column(row, "elevation")?)?;
    station.set_validity(column(row, "start_time")?, column(row, "end_time")?)?;
    station.set_last_modified(fractional_seconds_to_micros(column(row, "last_modified")?));
    Ok(station)
}

/// Reads one column, reporting type mismatches as row-local `InvalidData`.
pub(crate) fn column<T: FromSql>(row: &Row<'_>, name: &str) -> RepoResult<T> {
    row.get::<_, T>(name)
        .map_err(|err| RepoError::InvalidData(format!("column `{name}`: {err}")))
}

pub(crate) fn log_skipped_row(table: &str, err: &RepoError) {
    warn!(
        "event=row_decode module=repo status=skipped table={} error_code={} error={}",
        table,
        err.kind(),
        err
    );
}
