//! Channel repository contracts and SQLite implementation.
//!
//! # Invariants
//! - The overlap rule is keyed on `(network, station, name, location_code)`.
//! - Same transaction and row-skipping policy as the station repository.

use crate::model::channel::{Channel, ChannelKey};
use crate::model::station::StationKey;
use crate::model::time::{fractional_seconds_to_micros, micros_to_fractional_seconds};
use crate::repo::station_repo::{
    column, log_skipped_row, BulkInsertSummary, InsertOutcome, RepoResult,
};
use log::{debug, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CHANNEL_SELECT_SQL: &str = "SELECT
    network,
    station,
    name,
    location_code,
    latitude,
    longitude,
    elevation,
    sampling_rate,
    azimuth,
    dip,
    start_time,
    end_time,
    last_modified
FROM channel";

/// Repository interface for channel metadata.
pub trait ChannelRepository {
    fn insert_channel(&self, channel: &Channel, now_micros: i64) -> RepoResult<InsertOutcome>;

    /// Every channel active at `at`, unordered.
    fn active_channels(&self, at: i64) -> RepoResult<Vec<Channel>>;

    /// Channels of one station active at `at`, unordered.
    fn active_station_channels(&self, station: &StationKey, at: i64) -> RepoResult<Vec<Channel>>;

    fn active_channel(&self, key: &ChannelKey, at: i64) -> RepoResult<Option<Channel>>;

    fn insert_channels(&self, channels: &[Channel], now_micros: i64) -> BulkInsertSummary {
        let mut summary = BulkInsertSummary::default();
        for (index, channel) in channels.iter().enumerate() {
            let result = self.insert_channel(channel, now_micros);
            if let Err(err) = &result {
                warn!(
                    "event=channel_insert module=repo status=error index={} error_code={} error={}",
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

/// SQLite-backed channel repository.
pub struct SqliteChannelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChannelRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ChannelRepository for SqliteChannelRepository<'_> {
    fn insert_channel(&self, channel: &Channel, now_micros: i64) -> RepoResult<InsertOutcome> {
        channel.check_complete()?;
        let key = channel.key()?;
        let (valid_from, valid_until) = channel.validity()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if overlapping_channel_exists(&tx, &key, valid_from, valid_until)? {
            warn!(
                "event=channel_insert module=repo status=skipped key={} valid_from={} valid_until={} reason=overlap",
                key, valid_from, valid_until
            );
            return Ok(InsertOutcome::DuplicateSkipped);
        }

        let last_modified = channel.last_modified().unwrap_or(now_micros);
        tx.execute(
            "INSERT INTO channel (
                network,
                station,
                name,
                location_code,
                latitude,
                longitude,
                elevation,
                sampling_rate,
                azimuth,
                dip,
                start_time,
                end_time,
                last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                key.network,
                key.station,
                key.name,
                key.location_code,
                channel.latitude()?,
                channel.longitude()?,
                channel.elevation()?,
                channel.sampling_rate()?,
                channel.azimuth()?,
                channel.dip()?,
                valid_from,
                valid_until,
                micros_to_fractional_seconds(last_modified),
            ],
        )?;
        tx.commit()?;

        debug!(
            "event=channel_insert module=repo status=ok key={} valid_from={} valid_until={}",
            key, valid_from, valid_until
        );
        Ok(InsertOutcome::Inserted)
    }

    fn active_channels(&self, at: i64) -> RepoResult<Vec<Channel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHANNEL_SELECT_SQL}
             WHERE start_time <= ?1 AND ?1 < end_time;"
        ))?;
        let mut rows = stmt.query([at])?;
        collect_channels(&mut rows)
    }

    fn active_station_channels(&self, station: &StationKey, at: i64) -> RepoResult<Vec<Channel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHANNEL_SELECT_SQL}
             WHERE network = ?1
               AND station = ?2
               AND start_time <= ?3 AND ?3 < end_time;"
        ))?;
        let mut rows = stmt.query(params![station.network, station.name, at])?;
        collect_channels(&mut rows)
    }

    fn active_channel(&self, key: &ChannelKey, at: i64) -> RepoResult<Option<Channel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHANNEL_SELECT_SQL}
             WHERE network = ?1
               AND station = ?2
               AND name = ?3
               AND location_code = ?4
               AND start_time <= ?5 AND ?5 < end_time
             ORDER BY start_time DESC, rowid DESC;"
        ))?;

        let mut rows = stmt.query(params![
            key.network,
            key.station,
            key.name,
            key.location_code,
            at
        ])?;
        while let Some(row) = rows.next()? {
            match parse_channel_row(row) {
                Ok(channel) => return Ok(Some(channel)),
                Err(err) => log_skipped_row("channel", &err),
            }
        }

        Ok(None)
    }
}

fn overlapping_channel_exists(
    conn: &Connection,
    key: &ChannelKey,
    valid_from: i64,
    valid_until: i64,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM channel
            WHERE network = ?1
              AND station = ?2
              AND name = ?3
              AND location_code = ?4
              AND start_time <= ?6
              AND ?5 <= end_time
        );",
        params![
            key.network,
            key.station,
            key.name,
            key.location_code,
            valid_from,
            valid_until
        ],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn collect_channels(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Channel>> {
    let mut channels = Vec::new();
    while let Some(row) = rows.next()? {
        match parse_channel_row(row) {
            Ok(channel) => channels.push(channel),
            Err(err) => log_skipped_row("channel", &err),
        }
    }
    Ok(channels)
}

fn parse_channel_row(row: &Row<'_>) -> RepoResult<Channel> {
    let mut channel = Channel::new();
    channel.set_network(&column::<String>(row, "network")?)?;
    channel.set_station(&column::<String>(row, "station")?)?;
    channel.set_name(&column::<String>(row, "name")?)?;
    channel.set_location_code(&column::<String>(row, "location_code")?);
    channel.set_latitude(column(row, "latitude")?)?;
    channel.set_longitude(column(row, "longitude")?);
    channel.set_elevation(column(row, "elevation")?)?;
    channel.set_sampling_rate(column(row, "sampling_rate")?)?;
    channel.set_azimuth(column(row, "azimuth")?)?;
    channel.set_dip(column(row, "dip")?)?;
    channel.set_validity(column(row, "start_time")?, column(row, "end_time")?)?;
    channel.set_last_modified(fractional_seconds_to_micros(column(row, "last_modified")?));
    Ok(channel)
}
