use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;
use rusqlite::Connection;

use crate::db::migrations;

/// Get the default database path.
/// All data is stored in a single database file.
pub fn default_db_path() -> Result<PathBuf> {
    let data_dir = crate::platform::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join("kbv.db"))
}

/// Resolve the database path from an optional override.
pub fn resolve_db_path(db_path: Option<&Path>) -> Result<PathBuf> {
    match db_path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_db_path(),
    }
}

/// Open a database at `path`, creating it if needed.
/// Uses the migration system to ensure the schema is up-to-date.
pub fn open_db_at_path(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Opening database at {}", path.display());
    let conn = migrations::open_and_migrate(path)?;
    let version = migrations::get_schema_version(&conn).unwrap_or(0);
    debug!("Database opened (schema version {})", version);
    Ok(conn)
}
