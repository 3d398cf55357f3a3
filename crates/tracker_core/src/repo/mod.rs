//! Domain repositories over the key/value adapter.
//!
//! # Responsibility
//! - Own one collection each, cache it in memory and persist it whole on
//!   every mutation.
//! - Assign identifiers and run validation before anything is written.
//!
//! # Invariants
//! - A failed write leaves both storage and the cache unchanged.
//! - Operations on a missing id return `RepoError::NotFound` and write nothing.
//! - Malformed stored text degrades to an empty collection instead of failing.

mod collection;
pub mod habit_repo;
pub mod note_repo;
pub mod settings_repo;
pub mod task_repo;

pub use collection::Entity;

use crate::model::id::EntityId;
use crate::model::validation::ValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::MutexGuard;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Store(StoreError),
    NotFound(EntityId),
    Serialize(serde_json::Error),
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::Serialize(err) => write!(f, "failed to serialize collection: {err}"),
            Self::LockPoisoned => write!(f, "repository lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::NotFound(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Picks what a caller should select after `removed` was deleted.
///
/// When the removed entity was the current selection, the first remaining
/// entity (or nothing) takes its place. Any other selection is kept while it
/// still exists.
pub fn reselect_after_remove<E: Entity>(
    remaining: &[E],
    current: Option<&EntityId>,
    removed: &EntityId,
) -> Option<EntityId> {
    match current {
        None => None,
        Some(id) if id == removed => remaining.first().map(|entity| entity.id().clone()),
        Some(id) => remaining
            .iter()
            .any(|entity| entity.id() == id)
            .then(|| id.clone()),
    }
}

/// Exclusive hold on one repository cache while storage is replaced under it.
///
/// Mutations on the same repository block until the hold is dropped.
pub(crate) struct CacheReset<'a, T>(MutexGuard<'a, Option<T>>);

impl<'a, T> CacheReset<'a, T> {
    pub(crate) fn new(guard: MutexGuard<'a, Option<T>>) -> Self {
        Self(guard)
    }

    /// Forgets the cached value; the next access re-reads storage.
    pub(crate) fn reset(&mut self) {
        *self.0 = None;
    }
}
