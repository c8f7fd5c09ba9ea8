//! Core of the station metadata store.
//! This crate is the single source of truth for metadata invariants.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use db::{DbError, DbResult, OpenMode};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::channel::{Channel, ChannelKey, ChannelRecord};
pub use model::station::{Station, StationKey, StationRecord};
pub use model::time::{WireTimestamp, YEAR_3000_EPOCH_SECONDS};
pub use model::validate::{ModelError, ModelResult};
pub use repo::station_repo::{
    BulkInsertFailure, BulkInsertSummary, InsertOutcome, RepoError, RepoResult,
};
pub use service::metadata_service::{
    LoadReport, MetadataAdminService, MetadataService, RejectedRecord, ServiceCode, ServiceError,
    ServiceResult,
};
pub use store::MetadataStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
