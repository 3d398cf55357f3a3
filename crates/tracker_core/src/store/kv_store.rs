//! SQLite-backed [`KeyValueStore`].

use super::{KeyValueStore, KvWrite, StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Mutex, MutexGuard};

/// Namespace used when configuration does not override it.
pub const DEFAULT_NAMESPACE: &str = "tracker";

/// Builds the full stored key for one slot, e.g. `tracker-tasks`.
pub fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{namespace}-{key}")
}

/// Key/value store over the `kv_entries` table.
///
/// The connection sits behind a mutex so concurrent callers serialize.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
    namespace: String,
}

impl SqliteKvStore {
    /// Wraps a migrated connection. The namespace must be non-blank and may
    /// contain neither whitespace nor `-`, so no namespace is a key prefix of
    /// another.
    pub fn new(conn: Connection, namespace: &str) -> StoreResult<Self> {
        let namespace = namespace.trim();
        let invalid_char = |ch: char| ch.is_whitespace() || ch == '-';
        if namespace.is_empty() || namespace.contains(invalid_char) {
            return Err(StoreError::InvalidNamespace(namespace.to_string()));
        }
        Ok(Self {
            conn: Mutex::new(conn),
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        namespaced_key(&self.namespace, key)
    }

    fn prefix(&self) -> String {
        namespaced_key(&self.namespace, "")
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [self.full_key(key)],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        upsert(&conn, &self.full_key(key), value)?;
        debug!(
            "event=kv_set module=store status=ok key={} bytes={}",
            key,
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM kv_entries WHERE key = ?1;",
            [self.full_key(key)],
        )?;
        debug!("event=kv_remove module=store status=ok key={key}");
        Ok(())
    }

    fn write_batch(&self, writes: &[KvWrite]) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for write in writes {
            match write {
                KvWrite::Set { key, value } => upsert(&tx, &self.full_key(key), value)?,
                KvWrite::Remove { key } => {
                    tx.execute(
                        "DELETE FROM kv_entries WHERE key = ?1;",
                        [self.full_key(key)],
                    )?;
                }
            }
        }
        tx.commit()?;
        debug!(
            "event=kv_batch module=store status=ok writes={}",
            writes.len()
        );
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let prefix = self.prefix();
        let mut stmt = conn.prepare(
            "SELECT key FROM kv_entries
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key ASC;",
        )?;
        let mut rows = stmt.query([prefix.as_str()])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            let full: String = row.get(0)?;
            if let Some(short) = full.strip_prefix(prefix.as_str()) {
                keys.push(short.to_string());
            }
        }
        Ok(keys)
    }

    fn clear_namespace(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM kv_entries WHERE substr(key, 1, length(?1)) = ?1;",
            [self.prefix()],
        )?;
        Ok(removed)
    }
}

fn upsert(conn: &Connection, full_key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![full_key, value],
    )?;
    Ok(())
}
