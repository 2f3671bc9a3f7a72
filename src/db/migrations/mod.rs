//! SQL schema versioning using rusqlite_migration.
//!
//! This covers the layout of the database file itself (the `kv` table). The
//! shape of the JSON documents stored inside it is versioned separately by
//! `db::legacy`.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;
use rusqlite_migration::{Migrations, SchemaVersion, M};

/// Number of SQL migrations below. Keep in sync when adding one.
const MIGRATION_COUNT: usize = 1;

/// All migrations, in order. Each migration brings the schema from version N to N+1.
/// The `user_version` pragma is used automatically by rusqlite_migration to track
/// which migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("v001_kv_store.sql"))])
}

/// Open the database, running any pending migrations.
/// Backs up the database before applying migrations if it already exists.
pub fn open_and_migrate(db_path: &Path) -> Result<Connection> {
    let db_exists = db_path.exists();

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let m = migrations();
    let current_version = m
        .current_version(&conn)
        .context("Failed to check current schema version")?;

    let needs_migration = match current_version {
        SchemaVersion::NoneSet => true,
        SchemaVersion::Inside(v) => v.get() < MIGRATION_COUNT,
        SchemaVersion::Outside(_) => false,
    };

    if needs_migration && db_exists && !matches!(current_version, SchemaVersion::NoneSet) {
        backup_database(db_path)?;
        eprintln!("[kbv] Applying database migration(s)...");
    } else if needs_migration && !db_exists {
        info!("Creating new database at {}", db_path.display());
    }

    m.to_latest(&mut conn)
        .context("Failed to apply database migrations")?;

    Ok(conn)
}

/// Open a fresh in-memory database with the latest schema.
#[cfg(test)]
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    migrations()
        .to_latest(&mut conn)
        .context("Failed to apply database migrations")?;
    Ok(conn)
}

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> Result<usize> {
    let version = migrations()
        .current_version(conn)
        .context("Failed to get schema version")?;

    Ok(match version {
        SchemaVersion::NoneSet => 0,
        SchemaVersion::Inside(v) => v.get(),
        SchemaVersion::Outside(v) => v.get(),
    })
}

/// Create a backup of the database file before migrations.
fn backup_database(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Ok(());
    }

    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    let backup_path = db_path.with_extension(format!("db.backup.{}", timestamp));

    std::fs::copy(db_path, &backup_path)
        .with_context(|| format!("Failed to backup database to {}", backup_path.display()))?;

    eprintln!("[kbv] Backed up database to {}", backup_path.display());
    Ok(())
}
