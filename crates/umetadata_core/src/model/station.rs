//! Station domain model.
//!
//! # Responsibility
//! - Represent one physical station deployment over one validity window.
//! - Enforce field ranges at assignment time and completeness at export.
//!
//! # Invariants
//! - `network` and `name` are stored canonicalized (no whitespace, uppercase).
//! - `latitude` is in `[-90, 90]`, `elevation` in `[-10000, 8600]` meters.
//! - `longitude` is stored wrapped into `[-180, 180)`.
//! - `valid_from < valid_until`.
//! - Fields are private; every write goes through a validating setter.
//! - `last_modified` defaults to construction time.

use super::time::{now_epoch_micros, WireTimestamp, YEAR_3000_EPOCH_SECONDS};
use super::validate::{
    canonical_code, check_elevation, check_latitude, check_validity, for_export,
    normalize_longitude, required, ModelError, ModelResult,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Canonical identity of a station, independent of its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationKey {
    pub network: String,
    pub name: String,
}

impl StationKey {
    /// Builds a key from raw codes, applying the same canonicalization as
    /// `Station::set_network` / `Station::set_name`.
    pub fn new(network: &str, name: &str) -> ModelResult<Self> {
        Ok(Self {
            network: canonical_code("network", network)?,
            name: canonical_code("name", name)?,
        })
    }
}

impl Display for StationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.network, self.name)
    }
}

/// External wire shape of a station.
///
/// Timestamps are wall-clock values: window ends in whole seconds,
/// `last_modified` as seconds + nanos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub network: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub start_time: i64,
    #[serde(default = "default_end_time")]
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<WireTimestamp>,
}

pub(crate) fn default_end_time() -> i64 {
    YEAR_3000_EPOCH_SECONDS
}

/// A seismic station valid over `[valid_from, valid_until)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    network: Option<String>,
    name: Option<String>,
    description: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    elevation: Option<f64>,
    validity: Option<(i64, i64)>,
    last_modified: Option<i64>,
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}

impl Station {
    /// Creates an empty station; every required field starts unset and
    /// `last_modified` starts at the current time.
    pub fn new() -> Self {
        Self {
            network: None,
            name: None,
            description: None,
            latitude: None,
            longitude: None,
            elevation: None,
            validity: None,
            last_modified: Some(now_epoch_micros()),
        }
    }

    pub fn set_network(&mut self, network: &str) -> ModelResult<()> {
        self.network = Some(canonical_code("network", network)?);
        Ok(())
    }

    pub fn network(&self) -> ModelResult<&str> {
        self.network
            .as_deref()
            .ok_or(ModelError::NotSet { field: "network" })
    }

    pub fn has_network(&self) -> bool {
        self.network.is_some()
    }

    pub fn set_name(&mut self, name: &str) -> ModelResult<()> {
        self.name = Some(canonical_code("name", name)?);
        Ok(())
    }

    pub fn name(&self) -> ModelResult<&str> {
        self.name
            .as_deref()
            .ok_or(ModelError::NotSet { field: "name" })
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Free text; stored verbatim.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    /// Sets latitude in degrees.
    ///
    /// # Errors
    /// - `InvalidArgument` outside `[-90, 90]`; the previous value is kept.
    pub fn set_latitude(&mut self, latitude: f64) -> ModelResult<()> {
        self.latitude = Some(check_latitude(latitude)?);
        Ok(())
    }

    pub fn latitude(&self) -> ModelResult<f64> {
        required(self.latitude, "latitude")
    }

    pub fn has_latitude(&self) -> bool {
        self.latitude.is_some()
    }

    /// Sets longitude in degrees, positive east. Never fails; the value is
    /// wrapped into `[-180, 180)`.
    pub fn set_longitude(&mut self, longitude: f64) {
        self.longitude = Some(normalize_longitude(longitude));
    }

    pub fn longitude(&self) -> ModelResult<f64> {
        required(self.longitude, "longitude")
    }

    pub fn has_longitude(&self) -> bool {
        self.longitude.is_some()
    }

    /// Sets elevation in meters above sea level.
    pub fn set_elevation(&mut self, elevation: f64) -> ModelResult<()> {
        self.elevation = Some(check_elevation(elevation)?);
        Ok(())
    }

    pub fn elevation(&self) -> ModelResult<f64> {
        required(self.elevation, "elevation")
    }

    pub fn has_elevation(&self) -> bool {
        self.elevation.is_some()
    }

    /// Sets the validity window `[valid_from, valid_until)` in epoch seconds.
    pub fn set_validity(&mut self, valid_from: i64, valid_until: i64) -> ModelResult<()> {
        self.validity = Some(check_validity(valid_from, valid_until)?);
        Ok(())
    }

    /// Opens a window at `valid_from` that runs until the year-3000 sentinel.
    pub fn set_valid_from(&mut self, valid_from: i64) -> ModelResult<()> {
        self.set_validity(valid_from, YEAR_3000_EPOCH_SECONDS)
    }

    pub fn validity(&self) -> ModelResult<(i64, i64)> {
        required(self.validity, "validity")
    }

    pub fn valid_from(&self) -> ModelResult<i64> {
        self.validity().map(|(from, _)| from)
    }

    pub fn valid_until(&self) -> ModelResult<i64> {
        self.validity().map(|(_, until)| until)
    }

    pub fn has_validity(&self) -> bool {
        self.validity.is_some()
    }

    /// Whether `at` (epoch seconds) falls inside the validity window.
    /// Returns `false` while the window is unset.
    pub fn is_active_at(&self, at: i64) -> bool {
        self.validity
            .is_some_and(|(from, until)| from <= at && at < until)
    }

    /// Sets the bookkeeping timestamp in epoch microseconds.
    pub fn set_last_modified(&mut self, epoch_micros: i64) {
        self.last_modified = Some(epoch_micros);
    }

    /// Drops the bookkeeping timestamp so the store stamps it at insert.
    pub fn clear_last_modified(&mut self) {
        self.last_modified = None;
    }

    /// Epoch microseconds; `None` only after `clear_last_modified`.
    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    /// Canonical key of this station.
    pub fn key(&self) -> ModelResult<StationKey> {
        Ok(StationKey {
            network: self.network()?.to_string(),
            name: self.name()?.to_string(),
        })
    }

    /// Reports the first unset required field, if any.
    pub fn check_complete(&self) -> ModelResult<()> {
        self.to_record_at(0).map(|_| ())
    }

    /// Builds a station from a wire record, validating every field.
    pub fn from_record(record: &StationRecord) -> ModelResult<Self> {
        let mut station = Self::new();
        station.set_network(&record.network)?;
        station.set_name(&record.name)?;
        if let Some(description) = &record.description {
            station.set_description(description.as_str());
        }
        station.set_latitude(record.latitude)?;
        station.set_longitude(record.longitude);
        station.set_elevation(record.elevation)?;
        station.set_validity(record.start_time, record.end_time)?;
        station.set_last_modified(
            record
                .last_modified
                .map_or_else(now_epoch_micros, WireTimestamp::to_micros),
        );
        Ok(station)
    }

    /// Exports to the wire shape; an unset `last_modified` is exported as now.
    ///
    /// # Errors
    /// - `Incomplete` naming the first unset required field.
    pub fn to_record(&self) -> ModelResult<StationRecord> {
        self.to_record_at(now_epoch_micros())
    }

    fn to_record_at(&self, now_micros: i64) -> ModelResult<StationRecord> {
        let (start_time, end_time) = for_export(self.validity())?;
        Ok(StationRecord {
            network: for_export(self.network())?.to_string(),
            name: for_export(self.name())?.to_string(),
            description: self.description.clone(),
            latitude: for_export(self.latitude())?,
            longitude: for_export(self.longitude())?,
            elevation: for_export(self.elevation())?,
            start_time,
            end_time,
            last_modified: Some(WireTimestamp::from_micros(
                self.last_modified.unwrap_or(now_micros),
            )),
        })
    }
}

impl TryFrom<StationRecord> for Station {
    type Error = ModelError;

    fn try_from(record: StationRecord) -> Result<Self, Self::Error> {
        Self::from_record(&record)
    }
}

impl Serialize for Station {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.to_record().map_err(serde::ser::Error::custom)?;
        record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Station {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = StationRecord::deserialize(deserializer)?;
        Self::from_record(&record).map_err(serde::de::Error::custom)
    }
}

