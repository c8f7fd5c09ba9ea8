//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity kind.
//! - Isolate SQLite query details from the store handle and services.
//!
//! # Invariants
//! - Write paths require complete entities and never mutate stored history.
//! - Overlapping inserts are reported as `InsertOutcome::DuplicateSkipped`.
//! - "Active" means `start_time <= at < end_time`.

pub mod channel_repo;
pub mod station_repo;
