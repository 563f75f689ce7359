//! Cadence Storage
//!
//! `SQLite` persistence for the track library: tracks, playlists, and the
//! ordered membership between them.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: `tracks` and `playlists` each own their queries
//! - **Embedded Migrations**: schema ships inside the binary
//! - **Repository Trait**: `LocalStorageContext` implements
//!   `cadence_core::StorageContext` by delegating to the slices
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_storage::{LocalStorageContext, create_pool, run_migrations};
//! use cadence_core::storage::StorageContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://cadence.db").await?;
//! run_migrations(&pool).await?;
//!
//! let storage = LocalStorageContext::new(pool);
//! let tracks = storage.get_all_tracks().await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod playlists;
pub mod tracks;

pub use context::LocalStorageContext;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the pool is handed to a `LocalStorageContext`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://cadence.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    // Every connection to an in-memory database is a separate database
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        5
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
