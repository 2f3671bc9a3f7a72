//! Typed JSON key/value access over the `kv` table.
//!
//! Every write is persisted immediately. A stored value that cannot be parsed
//! is replaced with the caller's default and logged; it never fails the read.

use chrono::Utc;
use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    pub fn new(conn: Connection) -> Self {
        KvStore { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    #[cfg(test)]
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Raw JSON text stored under `key`, if any.
    pub fn get_raw(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
    }

    /// Read `key`, initializing it with `default()` when absent or unreadable.
    pub fn read<T, F>(&self, key: &str, default: F) -> rusqlite::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.get_raw(key)? {
            Some(text) => match serde_json::from_str::<T>(&text) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("Stored value for \"{}\" is unreadable ({}); resetting to default", key, e);
                    let value = default();
                    self.write(key, &value)?;
                    Ok(value)
                }
            },
            None => {
                debug!("Initializing \"{}\" with its default value", key);
                let value = default();
                self.write(key, &value)?;
                Ok(value)
            }
        }
    }

    /// Serialize `value` and store it under `key`, overwriting any previous value.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> rusqlite::Result<()> {
        let text = to_json_text(key, value)?;
        upsert(&self.conn, key, &text)
    }

    /// Write several keys in a single transaction.
    pub fn write_batch(&self, entries: &[(&str, serde_json::Value)]) -> rusqlite::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            let text = to_json_text(key, value)?;
            upsert(&tx, key, &text)?;
        }
        tx.commit()
    }

    /// All keys with the byte length of their stored value, ordered by key.
    pub fn entries(&self) -> rusqlite::Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare("SELECT key, length(value) FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as usize)))?;
        rows.collect()
    }
}

fn to_json_text<T: Serialize + ?Sized>(key: &str, value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(format!("serialize \"{}\": {}", key, e).into())
    })
}

fn upsert(conn: &Connection, key: &str, text: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, text, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
