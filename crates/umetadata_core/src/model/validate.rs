//! Field validation and normalization rules shared by stations and channels.
//!
//! # Responsibility
//! - Own every range check and canonicalization rule in one place, so
//!   manual assignment and wire decoding cannot drift apart.
//!
//! # Invariants
//! - Every function here is pure.
//! - Range checks reject NaN.
//! - Longitude is never rejected, only wrapped.

use crate::error::ErrorKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const LATITUDE_MIN: f64 = -90.0;
pub const LATITUDE_MAX: f64 = 90.0;
pub const ELEVATION_MIN_METERS: f64 = -10_000.0;
pub const ELEVATION_MAX_METERS: f64 = 8_600.0;
pub const DIP_MIN: f64 = -90.0;
pub const DIP_MAX: f64 = 90.0;
pub const AZIMUTH_MIN: f64 = 0.0;
pub const AZIMUTH_LIMIT: f64 = 360.0;

/// Placeholder stored for a blank SEED location code.
pub const BLANK_LOCATION_CODE: &str = "--";

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by entity field assignment, access and export.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    InvalidArgument {
        field: &'static str,
        message: String,
    },
    NotSet {
        field: &'static str,
    },
    Incomplete {
        field: &'static str,
    },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotSet { .. } => ErrorKind::NotSet,
            Self::Incomplete { .. } => ErrorKind::Incomplete,
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidArgument { field, .. }
            | Self::NotSet { field }
            | Self::Incomplete { field } => field,
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { field, message } => write!(f, "invalid {field}: {message}"),
            Self::NotSet { field } => write!(f, "{field} not set"),
            Self::Incomplete { field } => {
                write!(f, "entity is incomplete: required field {field} not set")
            }
        }
    }
}

impl Error for ModelError {}

/// Strips every whitespace character and uppercases the remainder.
pub fn canonicalize(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Canonicalizes a required code field, rejecting values that end up empty.
pub fn canonical_code(field: &'static str, input: &str) -> ModelResult<String> {
    let code = canonicalize(input);
    if code.is_empty() {
        return Err(ModelError::invalid(
            field,
            format!("`{input}` is empty after removing whitespace"),
        ));
    }
    Ok(code)
}

/// Canonicalizes a location code; blank input maps to `--`.
pub fn canonical_location_code(input: &str) -> String {
    let code = canonicalize(input);
    if code.is_empty() {
        BLANK_LOCATION_CODE.to_string()
    } else {
        code
    }
}

/// Wraps a longitude into `[-180, 180)`.
///
/// Inputs already in range are returned bit-for-bit. Non-finite inputs
/// yield NaN.
pub fn normalize_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        return longitude;
    }
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative offsets.
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn check_latitude(latitude: f64) -> ModelResult<f64> {
    check_closed("latitude", latitude, LATITUDE_MIN, LATITUDE_MAX)
}

pub fn check_elevation(elevation: f64) -> ModelResult<f64> {
    check_closed(
        "elevation",
        elevation,
        ELEVATION_MIN_METERS,
        ELEVATION_MAX_METERS,
    )
}

pub fn check_dip(dip: f64) -> ModelResult<f64> {
    check_closed("dip", dip, DIP_MIN, DIP_MAX)
}

/// Azimuth is half-open: `[0, 360)`.
pub fn check_azimuth(azimuth: f64) -> ModelResult<f64> {
    if (AZIMUTH_MIN..AZIMUTH_LIMIT).contains(&azimuth) {
        return Ok(azimuth);
    }
    Err(ModelError::invalid(
        "azimuth",
        format!("{azimuth} must be in range [{AZIMUTH_MIN}, {AZIMUTH_LIMIT})"),
    ))
}

pub fn check_sampling_rate(sampling_rate: f64) -> ModelResult<f64> {
    if sampling_rate > 0.0 && sampling_rate.is_finite() {
        return Ok(sampling_rate);
    }
    Err(ModelError::invalid(
        "sampling_rate",
        format!("{sampling_rate} must be a positive number of Hz"),
    ))
}

/// Validates a `[valid_from, valid_until)` window in epoch seconds.
pub fn check_validity(valid_from: i64, valid_until: i64) -> ModelResult<(i64, i64)> {
    if valid_from >= valid_until {
        return Err(ModelError::invalid(
            "validity",
            format!("valid_from ({valid_from}) must be less than valid_until ({valid_until})"),
        ));
    }
    Ok((valid_from, valid_until))
}

/// Returns the value of a required field or `NotSet`.
pub(crate) fn required<T: Copy>(value: Option<T>, field: &'static str) -> ModelResult<T> {
    value.ok_or(ModelError::NotSet { field })
}

/// Maps a `NotSet` read into `Incomplete` for export paths.
pub(crate) fn for_export<T>(result: ModelResult<T>) -> ModelResult<T> {
    result.map_err(|err| match err {
        ModelError::NotSet { field } => ModelError::Incomplete { field },
        other => other,
    })
}

fn check_closed(field: &'static str, value: f64, min: f64, max: f64) -> ModelResult<f64> {
    if (min..=max).contains(&value) {
        return Ok(value);
    }
    Err(ModelError::invalid(
        field,
        format!("{value} must be in range [{min}, {max}]"),
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        canonical_code, canonical_location_code, canonicalize, check_azimuth, check_dip,
        check_elevation, check_latitude, check_sampling_rate, check_validity,
        normalize_longitude, ModelError,
    };
    use crate::error::ErrorKind;

    #[test]
    fn canonicalize_strips_whitespace_and_uppercases() {
        assert_eq!(canonicalize(" u u\t"), "UU");
        assert_eq!(canonicalize("hhz\n"), "HHZ");
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for input in ["", "  ", "uU", " c t u ", "ß", "yNp\r\n", "b206"] {
            let once = canonicalize(input);
            assert_eq!(canonicalize(&once), once, "input `{input}`");
        }
    }

    #[test]
    fn canonical_code_rejects_blank_values() {
        let err = canonical_code("network", " \t ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.field(), "network");
    }

    #[test]
    fn blank_location_code_uses_placeholder() {
        assert_eq!(canonical_location_code(""), "--");
        assert_eq!(canonical_location_code("  "), "--");
        assert_eq!(canonical_location_code(" 01 "), "01");
    }

    #[test]
    fn longitude_in_range_is_unchanged() {
        assert_eq!(normalize_longitude(-111.75034), -111.75034);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(0.0), 0.0);
    }

    #[test]
    fn longitude_wraps_into_half_open_range() {
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(540.0), -180.0);
        assert!((normalize_longitude(-111.75034 + 360.0) - -111.75034).abs() < 1.0e-8);
        assert!((normalize_longitude(-111.75034 - 720.0) - -111.75034).abs() < 1.0e-8);
        assert!((normalize_longitude(190.0) - -170.0).abs() < 1.0e-12);
    }

    #[test]
    fn longitude_wrap_terminates_for_extreme_values() {
        for input in [1.0e300, -1.0e300, f64::MAX, f64::MIN, -1.0e-300 - 180.0] {
            let wrapped = normalize_longitude(input);
            assert!((-180.0..180.0).contains(&wrapped), "{input} -> {wrapped}");
        }
    }

    #[test]
    fn closed_ranges_accept_bounds() {
        assert!(check_latitude(90.0).is_ok());
        assert!(check_latitude(-90.0).is_ok());
        assert!(check_elevation(8600.0).is_ok());
        assert!(check_elevation(-10000.0).is_ok());
        assert!(check_dip(90.0).is_ok());
        assert!(check_dip(-90.0).is_ok());
    }

    #[test]
    fn range_checks_reject_out_of_range_and_nan() {
        assert!(check_latitude(90.000_001).is_err());
        assert!(check_latitude(f64::NAN).is_err());
        assert!(check_elevation(8600.5).is_err());
        assert!(check_dip(90.0001).is_err());
        assert!(check_azimuth(360.0).is_err());
        assert!(check_azimuth(-0.1).is_err());
        assert!(check_sampling_rate(0.0).is_err());
        assert!(check_sampling_rate(f64::INFINITY).is_err());
    }

    #[test]
    fn validity_requires_strictly_increasing_window() {
        assert!(check_validity(10, 11).is_ok());
        let err = check_validity(10, 10).unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument { field: "validity", .. }));
    }
}
