//! Persistence adapter: a synchronous, namespaced key/value store.
//!
//! # Responsibility
//! - Hand raw stored text to repositories without interpreting it.
//! - Scope every key under one namespace so a whole tracker can be cleared.
//!
//! # Invariants
//! - Values are opaque text; parsing belongs to the repositories.
//! - Batch writes are all-or-nothing.

mod kv_store;

pub use kv_store::{namespaced_key, SqliteKvStore, DEFAULT_NAMESPACE};

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the key/value adapter.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidNamespace(String),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidNamespace(value) => write!(f, "invalid store namespace: `{value}`"),
            Self::LockPoisoned => write!(f, "store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidNamespace(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One write inside a [`KeyValueStore::write_batch`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl KvWrite {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }
}

/// Namespaced key/value contract used by every repository.
///
/// Keys passed in are short slot names (`tasks`, `settings`); implementations
/// prefix them with their namespace.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    /// Applies every write or none of them.
    fn write_batch(&self, writes: &[KvWrite]) -> StoreResult<()>;
    /// Lists slot names (without namespace prefix) currently stored.
    fn keys(&self) -> StoreResult<Vec<String>>;
    /// Removes every key under this store's namespace and returns the count.
    fn clear_namespace(&self) -> StoreResult<usize>;
}
