//! Metadata store handle.
//!
//! # Responsibility
//! - Own one SQLite connection opened read-only or read-write.
//! - Expose station/channel inserts and temporal queries, defaulting the
//!   instant of interest to "now".
//!
//! # Invariants
//! - Writes through a read-only handle fail with `PermissionDenied`.
//! - Query inputs are canonicalized before they reach SQL.
//! - `close()` is idempotent; dropping the handle closes it as well.
//! - No retries: IO failures are surfaced to the caller.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult, OpenMode};
use crate::model::channel::{Channel, ChannelKey};
use crate::model::station::{Station, StationKey};
use crate::model::time::{now_epoch_micros, now_epoch_seconds};
use crate::repo::channel_repo::{ChannelRepository, SqliteChannelRepository};
use crate::repo::station_repo::{
    BulkInsertSummary, InsertOutcome, RepoResult, SqliteStationRepository, StationRepository,
};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Handle over one metadata database.
///
/// The handle is `Send` but not `Sync`: share it across workers behind a
/// lock, or open one read-only handle per worker.
pub struct MetadataStore {
    conn: Option<Connection>,
    mode: OpenMode,
    location: Option<PathBuf>,
}

impl MetadataStore {
    /// Opens (and in read-write mode creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path, mode)?;
        Ok(Self {
            conn: Some(conn),
            mode,
            location: Some(path.to_path_buf()),
        })
    }

    /// Opens a private read-write in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: Some(open_db_in_memory()?),
            mode: OpenMode::ReadWrite,
            location: None,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// File backing this handle; `None` for in-memory stores.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Inserts one station; overlapping duplicates are skipped.
    pub fn insert_station(&self, station: &Station) -> RepoResult<InsertOutcome> {
        let conn = self.writable()?;
        SqliteStationRepository::new(conn).insert_station(station, now_epoch_micros())
    }

    /// Inserts each station independently.
    pub fn insert_stations(&self, stations: &[Station]) -> RepoResult<BulkInsertSummary> {
        let conn = self.writable()?;
        let summary = SqliteStationRepository::new(conn).insert_stations(stations, now_epoch_micros());
        info!(
            "event=station_bulk_insert module=store status=ok total={} inserted={} skipped={} failed={}",
            stations.len(),
            summary.inserted,
            summary.skipped,
            summary.failed()
        );
        Ok(summary)
    }

    /// Stations active right now.
    pub fn active_stations(&self) -> RepoResult<Vec<Station>> {
        self.active_stations_at(now_epoch_seconds())
    }

    pub fn active_stations_at(&self, at: i64) -> RepoResult<Vec<Station>> {
        let stations = SqliteStationRepository::new(self.readable()?).active_stations(at)?;
        debug!(
            "event=station_query module=store status=ok at={} count={}",
            at,
            stations.len()
        );
        Ok(stations)
    }

    /// The station `network.name` active right now.
    ///
    /// # Errors
    /// - `InvalidArgument` when either code is blank.
    pub fn active_station(&self, network: &str, name: &str) -> RepoResult<Option<Station>> {
        self.active_station_at(network, name, now_epoch_seconds())
    }

    pub fn active_station_at(
        &self,
        network: &str,
        name: &str,
        at: i64,
    ) -> RepoResult<Option<Station>> {
        let key = StationKey::new(network, name)?;
        SqliteStationRepository::new(self.readable()?).active_station(&key, at)
    }

    pub fn insert_channel(&self, channel: &Channel) -> RepoResult<InsertOutcome> {
        let conn = self.writable()?;
        SqliteChannelRepository::new(conn).insert_channel(channel, now_epoch_micros())
    }

    pub fn insert_channels(&self, channels: &[Channel]) -> RepoResult<BulkInsertSummary> {
        let conn = self.writable()?;
        let summary = SqliteChannelRepository::new(conn).insert_channels(channels, now_epoch_micros());
        info!(
            "event=channel_bulk_insert module=store status=ok total={} inserted={} skipped={} failed={}",
            channels.len(),
            summary.inserted,
            summary.skipped,
            summary.failed()
        );
        Ok(summary)
    }

    pub fn active_channels(&self) -> RepoResult<Vec<Channel>> {
        self.active_channels_at(now_epoch_seconds())
    }

    pub fn active_channels_at(&self, at: i64) -> RepoResult<Vec<Channel>> {
        SqliteChannelRepository::new(self.readable()?).active_channels(at)
    }

    /// Channels of station `network.station` active at `at`.
    pub fn active_station_channels_at(
        &self,
        network: &str,
        station: &str,
        at: i64,
    ) -> RepoResult<Vec<Channel>> {
        let key = StationKey::new(network, station)?;
        SqliteChannelRepository::new(self.readable()?).active_station_channels(&key, at)
    }

    pub fn active_channel_at(
        &self,
        network: &str,
        station: &str,
        name: &str,
        location_code: &str,
        at: i64,
    ) -> RepoResult<Option<Channel>> {
        let key = ChannelKey::new(network, station, name, location_code)?;
        SqliteChannelRepository::new(self.readable()?).active_channel(&key, at)
    }

    /// Releases the connection. Calling it again is a no-op.
    pub fn close(&mut self) -> DbResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                info!(
                    "event=db_close module=store status=ok access={}",
                    self.mode.as_str()
                );
                Ok(())
            }
            Err((_conn, err)) => {
                warn!(
                    "event=db_close module=store status=error access={} error={}",
                    self.mode.as_str(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn readable(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    fn writable(&self) -> DbResult<&Connection> {
        let conn = self.readable()?;
        if self.mode == OpenMode::ReadOnly {
            return Err(DbError::ReadOnly);
        }
        Ok(conn)
    }
}
