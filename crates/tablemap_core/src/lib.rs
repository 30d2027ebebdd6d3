//! Minimal object-relational mapping over SQLite.
//! Models declare their fields statically; repositories turn them into
//! parameterized CRUD and bulk statements.

pub mod collection;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use collection::{Collection, CollectionError};
pub use config::TablemapConfig;
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::schema::{Model, ModelError};
pub use model::snapshot::Snapshot;
pub use model::value::{FieldValue, FieldValueError, FromFieldValue};
pub use repo::error::{RepoError, RepoResult};
pub use repo::repository::{Repository, SaveOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
