//! Channel domain model.
//!
//! # Responsibility
//! - Represent one sensor component (e.g. `UU.CTU.HHZ.01`) over one
//!   validity window.
//!
//! # Invariants
//! - `network`, `station`, `name` and `location_code` are canonicalized.
//! - A blank location code is stored as `--`.
//! - `sampling_rate > 0`, `azimuth` in `[0, 360)`, `dip` in `[-90, 90]`.
//! - Position and window rules match `Station`.

use super::station::default_end_time;
use super::time::{now_epoch_micros, WireTimestamp, YEAR_3000_EPOCH_SECONDS};
use super::validate::{
    canonical_code, canonical_location_code, check_azimuth, check_dip, check_elevation,
    check_latitude, check_sampling_rate, check_validity, for_export, normalize_longitude,
    required, ModelError, ModelResult,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Canonical identity of a channel: `NET.STA.CHA.LOC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey {
    pub network: String,
    pub station: String,
    pub name: String,
    pub location_code: String,
}

impl ChannelKey {
    pub fn new(network: &str, station: &str, name: &str, location_code: &str) -> ModelResult<Self> {
        Ok(Self {
            network: canonical_code("network", network)?,
            station: canonical_code("station", station)?,
            name: canonical_code("name", name)?,
            location_code: canonical_location_code(location_code),
        })
    }
}

impl Display for ChannelKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.network, self.station, self.name, self.location_code
        )
    }
}

/// External wire shape of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub network: String,
    pub station: String,
    pub name: String,
    #[serde(default)]
    pub location_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub sampling_rate: f64,
    pub azimuth: f64,
    pub dip: f64,
    pub start_time: i64,
    #[serde(default = "default_end_time")]
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<WireTimestamp>,
}

/// A single data channel valid over `[valid_from, valid_until)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    network: Option<String>,
    station: Option<String>,
    name: Option<String>,
    location_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    elevation: Option<f64>,
    sampling_rate: Option<f64>,
    azimuth: Option<f64>,
    dip: Option<f64>,
    validity: Option<(i64, i64)>,
    last_modified: Option<i64>,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    pub fn new() -> Self {
        Self {
            network: None,
            station: None,
            name: None,
            location_code: None,
            latitude: None,
            longitude: None,
            elevation: None,
            sampling_rate: None,
            azimuth: None,
            dip: None,
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

    /// Sets the code of the station this channel belongs to.
    pub fn set_station(&mut self, station: &str) -> ModelResult<()> {
        self.station = Some(canonical_code("station", station)?);
        Ok(())
    }

    pub fn station(&self) -> ModelResult<&str> {
        self.station
            .as_deref()
            .ok_or(ModelError::NotSet { field: "station" })
    }

    pub fn has_station(&self) -> bool {
        self.station.is_some()
    }

    /// Sets the channel code, e.g. `HHZ`.
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

    /// Sets the location code; blank input is stored as `--`.
    pub fn set_location_code(&mut self, location_code: &str) {
        self.location_code = Some(canonical_location_code(location_code));
    }

    pub fn location_code(&self) -> ModelResult<&str> {
        self.location_code
            .as_deref()
            .ok_or(ModelError::NotSet {
                field: "location_code",
            })
    }

    pub fn has_location_code(&self) -> bool {
        self.location_code.is_some()
    }

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

    pub fn set_longitude(&mut self, longitude: f64) {
        self.longitude = Some(normalize_longitude(longitude));
    }

    pub fn longitude(&self) -> ModelResult<f64> {
        required(self.longitude, "longitude")
    }

    pub fn has_longitude(&self) -> bool {
        self.longitude.is_some()
    }

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

    /// Sets the nominal sampling rate in Hz.
    pub fn set_sampling_rate(&mut self, sampling_rate: f64) -> ModelResult<()> {
        self.sampling_rate = Some(check_sampling_rate(sampling_rate)?);
        Ok(())
    }

    pub fn sampling_rate(&self) -> ModelResult<f64> {
        required(self.sampling_rate, "sampling_rate")
    }

    pub fn has_sampling_rate(&self) -> bool {
        self.sampling_rate.is_some()
    }

    /// Sets the azimuth in degrees east of north; `360` itself is rejected.
    pub fn set_azimuth(&mut self, azimuth: f64) -> ModelResult<()> {
        self.azimuth = Some(check_azimuth(azimuth)?);
        Ok(())
    }

    pub fn azimuth(&self) -> ModelResult<f64> {
        required(self.azimuth, "azimuth")
    }

    pub fn has_azimuth(&self) -> bool {
        self.azimuth.is_some()
    }

    /// Sets the dip in degrees down from horizontal (`-90` is up).
    pub fn set_dip(&mut self, dip: f64) -> ModelResult<()> {
        self.dip = Some(check_dip(dip)?);
        Ok(())
    }

    pub fn dip(&self) -> ModelResult<f64> {
        required(self.dip, "dip")
    }

    pub fn has_dip(&self) -> bool {
        self.dip.is_some()
    }

    pub fn set_validity(&mut self, valid_from: i64, valid_until: i64) -> ModelResult<()> {
        self.validity = Some(check_validity(valid_from, valid_until)?);
        Ok(())
    }

    pub fn set_valid_from(&mut self, valid_from: i64) -> ModelResult<()> {
        self.set_validity(valid_from, YEAR_3000_EPOCH_SECONDS)
    }

    pub fn validity(&self) -> ModelResult<(i64, i64)> {
        required(self.validity, "validity")
    }

    pub fn has_validity(&self) -> bool {
        self.validity.is_some()
    }

    pub fn is_active_at(&self, at: i64) -> bool {
        self.validity
            .is_some_and(|(from, until)| from <= at && at < until)
    }

    pub fn set_last_modified(&mut self, epoch_micros: i64) {
        self.last_modified = Some(epoch_micros);
    }

    pub fn clear_last_modified(&mut self) {
        self.last_modified = None;
    }

    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    pub fn key(&self) -> ModelResult<ChannelKey> {
        Ok(ChannelKey {
            network: self.network()?.to_string(),
            station: self.station()?.to_string(),
            name: self.name()?.to_string(),
            location_code: self.location_code()?.to_string(),
        })
    }

    pub fn check_complete(&self) -> ModelResult<()> {
        self.to_record_at(0).map(|_| ())
    }

    /// Builds a channel from a wire record, validating every field.
    pub fn from_record(record: &ChannelRecord) -> ModelResult<Self> {
        let mut channel = Self::new();
        channel.set_network(&record.network)?;
        channel.set_station(&record.station)?;
        channel.set_name(&record.name)?;
        channel.set_location_code(&record.location_code);
        channel.set_latitude(record.latitude)?;
        channel.set_longitude(record.longitude);
        channel.set_elevation(record.elevation)?;
        channel.set_sampling_rate(record.sampling_rate)?;
        channel.set_azimuth(record.azimuth)?;
        channel.set_dip(record.dip)?;
        channel.set_validity(record.start_time, record.end_time)?;
        channel.set_last_modified(
            record
                .last_modified
                .map_or_else(now_epoch_micros, WireTimestamp::to_micros),
        );
        Ok(channel)
    }

    /// Exports to the wire shape.
    ///
    /// # Errors
    /// - `Incomplete` naming the first unset required field.
    pub fn to_record(&self) -> ModelResult<ChannelRecord> {
        self.to_record_at(now_epoch_micros())
    }

    fn to_record_at(&self, now_micros: i64) -> ModelResult<ChannelRecord> {
        let (start_time, end_time) = for_export(self.validity())?;
        Ok(ChannelRecord {
            network: for_export(self.network())?.to_string(),
            station: for_export(self.station())?.to_string(),
            name: for_export(self.name())?.to_string(),
            location_code: for_export(self.location_code())?.to_string(),
            latitude: for_export(self.latitude())?,
            longitude: for_export(self.longitude())?,
            elevation: for_export(self.elevation())?,
            sampling_rate: for_export(self.sampling_rate())?,
            azimuth: for_export(self.azimuth())?,
            dip: for_export(self.dip())?,
            start_time,
            end_time,
            last_modified: Some(WireTimestamp::from_micros(
                self.last_modified.unwrap_or(now_micros),
            )),
        })
    }
}

impl TryFrom<ChannelRecord> for Channel {
    type Error = ModelError;

    fn try_from(record: ChannelRecord) -> Result<Self, Self::Error> {
        Self::from_record(&record)
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.to_record().map_err(serde::ser::Error::custom)?;
        record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = ChannelRecord::deserialize(deserializer)?;
        Self::from_record(&record).map_err(serde::de::Error::custom)
    }
}
