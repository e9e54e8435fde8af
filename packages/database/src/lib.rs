#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database connection, crime grid queries, and migrations.
//!
//! Uses `switchy_database` for raw parameterized queries and
//! `switchy_schema` for embedded SQL migrations. Crime counts live in one
//! table per weekday (`grid_monday` .. `grid_sunday`) plus `grid_all`.

pub mod db;
pub mod queries;
pub mod store;

pub use store::DatabaseCrimeStore;

use include_dir::{Dir, include_dir};
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

/// Grid table migrations from the workspace `migrations/` directory.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors from grid table queries and migrations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A grid query failed.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// A grid table migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// A grid row has a column of the wrong type.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Creates any missing `grid_*` tables and indexes.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Crime grid tables are up to date");
    Ok(())
}
