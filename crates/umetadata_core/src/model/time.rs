//! Epoch time helpers shared by the entity model and the store.
//!
//! Validity windows are whole seconds since the Unix epoch; bookkeeping
//! timestamps (`last_modified`) are microseconds since the epoch.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// 3000-01-01T00:00:00Z, the default end of an open validity window.
pub const YEAR_3000_EPOCH_SECONDS: i64 = 32_503_680_000;

const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_MICRO: i64 = 1_000;

/// Current wall-clock time in whole seconds since the epoch.
pub fn now_epoch_seconds() -> i64 {
    now_epoch_micros().div_euclid(MICROS_PER_SECOND)
}

/// Current wall-clock time in microseconds since the epoch.
///
/// Clocks set before 1970 yield negative values instead of failing.
pub fn now_epoch_micros() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX),
        Err(before_epoch) => {
            -i64::try_from(before_epoch.duration().as_micros()).unwrap_or(i64::MAX)
        }
    }
}

/// Converts epoch microseconds to fractional epoch seconds.
pub fn micros_to_fractional_seconds(micros: i64) -> f64 {
    micros as f64 * 1.0e-6
}

/// Converts fractional epoch seconds back to epoch microseconds.
///
/// Rounds to the nearest microsecond so a value written by
/// `micros_to_fractional_seconds` reads back unchanged.
pub fn fractional_seconds_to_micros(seconds: f64) -> i64 {
    (seconds * 1.0e6).round() as i64
}

/// Seconds + nanoseconds wall-clock timestamp used by wire records.
///
/// `nanos` is always in `[0, 1_000_000_000)`, also for pre-epoch instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl WireTimestamp {
    /// Builds a wire timestamp from epoch microseconds.
    pub fn from_micros(micros: i64) -> Self {
        let seconds = micros.div_euclid(MICROS_PER_SECOND);
        let sub_second_micros = micros.rem_euclid(MICROS_PER_SECOND);
        Self {
            seconds,
            nanos: (sub_second_micros * NANOS_PER_MICRO) as i32,
        }
    }

    /// Collapses the timestamp to epoch microseconds; sub-microsecond
    /// precision is truncated.
    pub fn to_micros(self) -> i64 {
        self.seconds
            .saturating_mul(MICROS_PER_SECOND)
            .saturating_add(i64::from(self.nanos) / NANOS_PER_MICRO)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        fractional_seconds_to_micros, micros_to_fractional_seconds, now_epoch_micros,
        now_epoch_seconds, WireTimestamp,
    };

    #[test]
    fn wire_timestamp_splits_negative_micros_with_positive_nanos() {
        let ts = WireTimestamp::from_micros(-1_500_000);
        assert_eq!(ts.seconds, -2);
        assert_eq!(ts.nanos, 500_000_000);
        assert_eq!(ts.to_micros(), -1_500_000);
    }

    #[test]
    fn fractional_seconds_read_back_to_same_micros() {
        let micros = 1_727_969_872_123_456;
        let seconds = micros_to_fractional_seconds(micros);
        assert_eq!(fractional_seconds_to_micros(seconds), micros);
    }

    #[test]
    fn now_helpers_agree_on_the_second() {
        let seconds = now_epoch_seconds();
        let micros = now_epoch_micros();
        assert!((micros / 1_000_000 - seconds).abs() <= 1);
    }
}
