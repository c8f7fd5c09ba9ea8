//! Seismic metadata entity model.
//!
//! # Responsibility
//! - Define station and channel value types independent of storage and wire.
//! - Keep field validation and normalization in one shared module.
//!
//! # Invariants
//! - An invalid value is rejected at assignment and never stored.
//! - Reading an unset required field is an error, never a silent default.
//! - History is append-only: corrections are new records with a later window.

pub mod channel;
pub mod station;
pub mod time;
pub mod validate;
