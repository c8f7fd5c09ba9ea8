//! Transport-agnostic facade over the metadata store.
//!
//! # Responsibility
//! - Map store reads onto "list active stations" / "get active station"
//!   request handlers that speak wire records.
//! - Provide the bulk write entry point used by operator tooling.
//! - Collapse internal failures into client-safe status codes.
//!
//! # Invariants
//! - Invalid input maps to `InvalidArgument`, a missing record to
//!   `NotFound`, everything else to `Internal` with a generic message.
//! - Internal error details are logged, never returned.
//! - Read handlers never write.

use crate::error::ErrorKind;
use crate::model::channel::{Channel, ChannelRecord};
use crate::model::station::{Station, StationRecord};
use crate::model::time::now_epoch_seconds;
use crate::model::validate::ModelResult;
use crate::repo::station_repo::{BulkInsertSummary, RepoError, RepoResult};
use crate::store::MetadataStore;
use log::{error, info, warn};
use std::fmt::{Display, Formatter};

const INTERNAL_MESSAGE: &str = "server-side query failed";

/// Read side of the store as seen by request handlers.
pub trait MetadataSource {
    fn active_stations_at(&self, at: i64) -> RepoResult<Vec<Station>>;
    fn active_station_at(&self, network: &str, name: &str, at: i64)
        -> RepoResult<Option<Station>>;
}

/// Write side of the store for operator tooling.
pub trait MetadataSink {
    fn insert_stations(&self, stations: &[Station]) -> RepoResult<BulkInsertSummary>;
    fn insert_channels(&self, channels: &[Channel]) -> RepoResult<BulkInsertSummary>;
}

impl MetadataSource for MetadataStore {
    fn active_stations_at(&self, at: i64) -> RepoResult<Vec<Station>> {
        MetadataStore::active_stations_at(self, at)
    }

    fn active_station_at(
        &self,
        network: &str,
        name: &str,
        at: i64,
    ) -> RepoResult<Option<Station>> {
        MetadataStore::active_station_at(self, network, name, at)
    }
}

impl MetadataSink for MetadataStore {
    fn insert_stations(&self, stations: &[Station]) -> RepoResult<BulkInsertSummary> {
        MetadataStore::insert_stations(self, stations)
    }

    fn insert_channels(&self, channels: &[Channel]) -> RepoResult<BulkInsertSummary> {
        MetadataStore::insert_channels(self, channels)
    }
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn active_stations_at(&self, at: i64) -> RepoResult<Vec<Station>> {
        (**self).active_stations_at(at)
    }

    fn active_station_at(
        &self,
        network: &str,
        name: &str,
        at: i64,
    ) -> RepoResult<Option<Station>> {
        (**self).active_station_at(network, name, at)
    }
}

impl<T: MetadataSink + ?Sized> MetadataSink for &T {
    fn insert_stations(&self, stations: &[Station]) -> RepoResult<BulkInsertSummary> {
        (**self).insert_stations(stations)
    }

    fn insert_channels(&self, channels: &[Channel]) -> RepoResult<BulkInsertSummary> {
        (**self).insert_channels(channels)
    }
}

/// Client-visible failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCode {
    InvalidArgument,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: ServiceCode,
    pub message: String,
}

impl ServiceError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ServiceCode::NotFound,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            code: ServiceCode::Internal,
            message: INTERNAL_MESSAGE.to_string(),
        }
    }

    fn from_repo(operation: &str, err: &RepoError) -> Self {
        match err.kind() {
            ErrorKind::InvalidArgument => Self {
                code: ServiceCode::InvalidArgument,
                message: err.to_string(),
            },
            kind => {
                error!(
                    "event={} module=service status=error error_code={} error={}",
                    operation, kind, err
                );
                Self::internal()
            }
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Read-only request handlers for station metadata.
pub struct MetadataService<S: MetadataSource> {
    source: S,
}

impl<S: MetadataSource> MetadataService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Lists every station active now.
    pub fn all_active_stations(&self) -> ServiceResult<Vec<StationRecord>> {
        self.all_active_stations_at(now_epoch_seconds())
    }

    pub fn all_active_stations_at(&self, at: i64) -> ServiceResult<Vec<StationRecord>> {
        let stations = self
            .source
            .active_stations_at(at)
            .map_err(|err| ServiceError::from_repo("get_all_active_stations", &err))?;
        stations
            .iter()
            .map(|station| export("get_all_active_stations", station.to_record()))
            .collect()
    }

    /// Gets the station `network.name` active now.
    pub fn active_station(&self, network: &str, name: &str) -> ServiceResult<StationRecord> {
        self.active_station_at(network, name, now_epoch_seconds())
    }

    pub fn active_station_at(
        &self,
        network: &str,
        name: &str,
        at: i64,
    ) -> ServiceResult<StationRecord> {
        let station = self
            .source
            .active_station_at(network, name, at)
            .map_err(|err| ServiceError::from_repo("get_active_station", &err))?
            .ok_or_else(|| {
                ServiceError::not_found(format!("no active station for {network}.{name}"))
            })?;
        export("get_active_station", station.to_record())
    }
}

/// A wire record rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub index: usize,
    pub message: String,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: Vec<RejectedRecord>,
}

/// Bulk write entry point for operator tooling.
pub struct MetadataAdminService<S: MetadataSink> {
    sink: S,
}

impl<S: MetadataSink> MetadataAdminService<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Validates and inserts station records; re-running is idempotent.
    pub fn load_stations(&self, records: &[StationRecord]) -> ServiceResult<LoadReport> {
        let decoded = decode_all(records, Station::from_record);
        let summary = self
            .sink
            .insert_stations(&decoded.entities)
            .map_err(|err| ServiceError::from_repo("load_stations", &err))?;
        Ok(decoded.finish("load_stations", summary))
    }

    /// Validates and inserts channel records; re-running is idempotent.
    pub fn load_channels(&self, records: &[ChannelRecord]) -> ServiceResult<LoadReport> {
        let decoded = decode_all(records, Channel::from_record);
        let summary = self
            .sink
            .insert_channels(&decoded.entities)
            .map_err(|err| ServiceError::from_repo("load_channels", &err))?;
        Ok(decoded.finish("load_channels", summary))
    }
}

struct Decoded<E> {
    entities: Vec<E>,
    /// Input position of each entry in `entities`.
    positions: Vec<usize>,
    rejected: Vec<RejectedRecord>,
}

impl<E> Decoded<E> {
    fn finish(mut self, operation: &str, summary: BulkInsertSummary) -> LoadReport {
        for failure in summary.failures {
            let index = self
                .positions
                .get(failure.index)
                .copied()
                .unwrap_or(failure.index);
            self.rejected.push(RejectedRecord {
                index,
                message: failure.error.to_string(),
            });
        }
        self.rejected.sort_by_key(|record| record.index);

        info!(
            "event={} module=service status=ok inserted={} skipped={} rejected={}",
            operation,
            summary.inserted,
            summary.skipped,
            self.rejected.len()
        );
        LoadReport {
            inserted: summary.inserted,
            skipped: summary.skipped,
            rejected: self.rejected,
        }
    }
}

fn decode_all<R, E>(records: &[R], decode: impl Fn(&R) -> ModelResult<E>) -> Decoded<E> {
    let mut decoded = Decoded {
        entities: Vec::with_capacity(records.len()),
        positions: Vec::with_capacity(records.len()),
        rejected: Vec::new(),
    };
    for (index, record) in records.iter().enumerate() {
        match decode(record) {
            Ok(entity) => {
                decoded.entities.push(entity);
                decoded.positions.push(index);
            }
            Err(err) => {
                warn!(
                    "event=record_decode module=service status=skipped index={} error={}",
                    index, err
                );
                decoded.rejected.push(RejectedRecord {
                    index,
                    message: err.to_string(),
                });
            }
        }
    }
    decoded
}

fn export<T>(operation: &str, result: ModelResult<T>) -> ServiceResult<T> {
    result.map_err(|err| {
        error!(
            "event={} module=service status=error error_code={} error={}",
            operation,
            err.kind(),
            err
        );
        ServiceError::internal()
    })
}
