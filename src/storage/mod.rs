//! Key-value persistence over an embedded SQLite database.
//!
//! The whole store lives in one `kv(key, value)` table; every value is an
//! independently JSON-serialized entity. Schema setup follows the
//! `user_version` pragma so a future layout change has a migration seam.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

const SCHEMA_VERSION: i32 = 1;

pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create store directory {}", parent.display())
            })?;
        }
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }

    ensure_schema(&mut conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory store")?;
    ensure_schema(&mut conn)?;
    Ok(conn)
}

fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > SCHEMA_VERSION {
        bail!(
            "store schema ({}) is newer than supported ({})",
            version,
            SCHEMA_VERSION
        );
    }

    if version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open schema transaction")?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .context("failed to create kv table")?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit schema setup")?;

    Ok(())
}

/// Borrowed view over the kv table. Store operations construct one per
/// locked connection or transaction, so multi-key writes share one
/// transactional scope.
pub struct Kv<'a> {
    conn: &'a Connection,
}

impl<'a> Kv<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read {key}"))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("failed to write {key}"))?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("failed to delete {key}"))?;
        Ok(removed > 0)
    }

    /// Remove every entry under the given namespace prefix.
    pub fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for key in self.keys_with_prefix(prefix)? {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv")
            .context("failed to prepare key scan")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to scan keys")?;
        Ok(keys
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    /// Sum of key length + serialized value length over the namespace.
    pub fn usage_bytes(&self, prefix: &str) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM kv")
            .context("failed to prepare usage scan")?;
        let mut rows = stmt.query([]).context("failed to scan usage")?;

        let mut total = 0u64;
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            if !key.starts_with(prefix) {
                continue;
            }
            let value: String = row.get(1)?;
            total += (key.len() + value.len()) as u64;
        }
        Ok(total)
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("failed to serialize {key}"))?;
        self.put(key, &raw)
    }

    /// Like `get_json`, but a malformed value is logged and read as absent
    /// instead of failing the caller.
    pub fn get_json_or_absent<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    warn!("corrupt data under {key}, treating as absent: {err}");
                    Ok(None)
                }
            },
        }
    }
}
