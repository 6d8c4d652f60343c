//! Schema migrations for the SQLite backend
//!
//! The schema is versioned through a single-row `schema_version` table. Each
//! entry in [`MIGRATIONS`] moves the schema forward by one version, and
//! [`apply_migrations`] runs every pending entry in order inside one
//! transaction.
//!
//! # Adding a migration
//!
//! Append a new entry with the next version number:
//!
//! ```rust,ignore
//! Migration {
//!     version: 2,
//!     up: "ALTER TABLE todos ADD COLUMN notes TEXT;",
//! }
//! ```
//!
//! Versions must be strictly increasing. A migration is never edited once
//! released; fix mistakes with a follow-up version.

use super::StorageError;
use rusqlite::{Connection, OptionalExtension, Transaction};

/// One forward schema change
#[derive(Debug)]
pub struct Migration {
    /// The version the schema is at after this migration runs
    pub version: i32,
    /// SQL statements to apply this migration
    pub up: &'static str,
}

/// All migrations in order of application
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up: r#"
        CREATE TABLE IF NOT EXISTS lists (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS todos (
            list_id INTEGER NOT NULL,
            id INTEGER NOT NULL,
            name TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT 0,
            PRIMARY KEY (list_id, id),
            FOREIGN KEY (list_id) REFERENCES lists(id) ON DELETE CASCADE
        );
    "#,
}];

pub fn latest_version() -> i32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

fn ensure_version_table(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| StorageError::Storage(format!("Failed to create schema_version table: {}", e)))?;

    let existing: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    if existing.is_none() {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
    }
    Ok(())
}

/// Get the current schema version from the database
pub fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version: i32 = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .map_err(|e| StorageError::Storage(format!("Failed to get schema version: {}", e)))?;
    Ok(version)
}

/// Brings the database up to [`latest_version`].
///
/// A database written by a newer build is refused rather than touched.
pub fn apply_migrations(conn: &mut Connection) -> Result<(), StorageError> {
    ensure_version_table(conn)?;
    let current_version = get_current_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(StorageError::Storage(format!(
            "Database schema version {} is newer than supported version {}",
            current_version, latest
        )));
    }

    if current_version < latest {
        tracing::info!(from = current_version, to = latest, "migrating database schema");
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Storage(format!("Failed to start transaction: {}", e)))?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
            apply_migration(&tx, migration)?;
        }

        tx.commit()
            .map_err(|e| StorageError::Storage(format!("Failed to commit transaction: {}", e)))?;
    }

    Ok(())
}

fn apply_migration(tx: &Transaction, migration: &Migration) -> Result<(), StorageError> {
    tx.execute_batch(migration.up).map_err(|e| {
        StorageError::Storage(format!(
            "Failed to apply migration {}: {}",
            migration.version, e
        ))
    })?;

    tx.execute(
        "UPDATE schema_version SET version = ?1",
        [migration.version],
    )
    .map_err(|e| {
        StorageError::Storage(format!(
            "Failed to update schema version to {}: {}",
            migration.version, e
        ))
    })?;

    Ok(())
}
