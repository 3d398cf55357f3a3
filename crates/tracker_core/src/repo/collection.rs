//! Shared load/mutate/persist engine behind the domain repositories.

use crate::clock::Clock;
use crate::events::{EventBus, StoreEvent};
use crate::model::id::EntityId;
use crate::model::validation::ValidationError;
use crate::model::CollectionKind;
use crate::repo::{CacheReset, RepoError, RepoResult};
use crate::store::KeyValueStore;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// A record owned by one collection repository.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + 'static {
    /// Slot the collection is persisted under.
    const KIND: CollectionKind;
    /// Creation input, without an id.
    type Draft;
    /// Partial update input.
    type Patch;

    fn id(&self) -> &EntityId;

    /// Builds a validated entity. Must not have side effects.
    fn from_draft(
        id: EntityId,
        draft: Self::Draft,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError>;

    /// Merges `patch` in. Must validate before touching `self`.
    fn apply_patch(&mut self, patch: Self::Patch, clock: &dyn Clock)
        -> Result<(), ValidationError>;
}

/// Cached collection of `E` persisted whole under `E::KIND`.
///
/// The cache mutex is held across load, mutation and persist, so concurrent
/// callers cannot lose each other's updates.
pub(crate) struct Collection<E, S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    cache: Mutex<Option<Vec<E>>>,
}

impl<E: Entity, S: KeyValueStore> Collection<E, S> {
    pub(crate) fn new(store: Arc<S>, clock: Arc<dyn Clock>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            clock,
            events,
            cache: Mutex::new(None),
        }
    }

    pub(crate) fn list(&self) -> RepoResult<Vec<E>> {
        let mut guard = self.lock()?;
        Ok(self.loaded(&mut guard)?.clone())
    }

    pub(crate) fn get(&self, id: &EntityId) -> RepoResult<Option<E>> {
        let mut guard = self.lock()?;
        Ok(self
            .loaded(&mut guard)?
            .iter()
            .find(|entity| entity.id() == id)
            .cloned())
    }

    pub(crate) fn add(&self, draft: E::Draft) -> RepoResult<E> {
        self.mutate("entity_add", |items, clock| {
            let id = fresh_id(items);
            let entity = E::from_draft(id, draft, clock)?;
            items.push(entity.clone());
            Ok(entity)
        })
    }

    pub(crate) fn update(&self, id: &EntityId, patch: E::Patch) -> RepoResult<E> {
        self.modify("entity_update", id, |entity, clock| {
            entity.apply_patch(patch, clock)?;
            Ok(())
        })
    }

    /// Runs `f` on the entity with `id` and persists the result.
    pub(crate) fn modify<F>(&self, op: &'static str, id: &EntityId, f: F) -> RepoResult<E>
    where
        F: FnOnce(&mut E, &dyn Clock) -> RepoResult<()>,
    {
        self.mutate(op, |items, clock| {
            let entity = items
                .iter_mut()
                .find(|entity| entity.id() == id)
                .ok_or_else(|| RepoError::NotFound(id.clone()))?;
            f(entity, clock)?;
            Ok(entity.clone())
        })
    }

    pub(crate) fn remove(&self, id: &EntityId) -> RepoResult<E> {
        self.mutate("entity_remove", |items, _| {
            let index = items
                .iter()
                .position(|entity| entity.id() == id)
                .ok_or_else(|| RepoError::NotFound(id.clone()))?;
            Ok(items.remove(index))
        })
    }

    /// Forgets the cache; the next access re-reads storage.
    pub(crate) fn reload(&self) -> RepoResult<()> {
        *self.lock()? = None;
        Ok(())
    }

    /// Blocks mutations until the returned hold is dropped.
    pub(crate) fn lock_for_replace(&self) -> RepoResult<CacheReset<'_, Vec<E>>> {
        Ok(CacheReset::new(self.lock()?))
    }

    fn mutate<R, F>(&self, op: &'static str, f: F) -> RepoResult<R>
    where
        F: FnOnce(&mut Vec<E>, &dyn Clock) -> RepoResult<R>,
    {
        let mut guard = self.lock()?;
        let current = self.loaded(&mut guard)?;

        let mut next = current.clone();
        let output = f(&mut next, self.clock.as_ref())?;
        if let Err(err) = self.persist(&next) {
            error!(
                "event={op} module=repo status=error collection={} error={}",
                E::KIND,
                err
            );
            return Err(err);
        }

        let size = next.len();
        *current = next;
        drop(guard);

        info!(
            "event={op} module=repo status=ok collection={} size={size}",
            E::KIND
        );
        self.events.emit(StoreEvent::Changed(E::KIND));
        Ok(output)
    }

    fn persist(&self, items: &[E]) -> RepoResult<()> {
        let raw = serde_json::to_string(items)?;
        self.store.set(E::KIND.slot(), &raw)?;
        Ok(())
    }

    fn load(&self) -> RepoResult<Vec<E>> {
        let Some(raw) = self.store.get(E::KIND.slot())? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<E>>(&raw) {
            Ok(items) => {
                debug!(
                    "event=collection_load module=repo status=ok collection={} size={}",
                    E::KIND,
                    items.len()
                );
                Ok(items)
            }
            Err(err) => {
                warn!(
                    "event=collection_load module=repo status=error collection={} error_code=parse_failed error={}",
                    E::KIND,
                    err
                );
                Ok(Vec::new())
            }
        }
    }

    fn loaded<'g>(&self, slot: &'g mut Option<Vec<E>>) -> RepoResult<&'g mut Vec<E>> {
        if slot.is_none() {
            *slot = Some(self.load()?);
        }
        Ok(slot.get_or_insert_with(Vec::new))
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Option<Vec<E>>>> {
        self.cache.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

fn fresh_id<E: Entity>(items: &[E]) -> EntityId {
    loop {
        let id = EntityId::generate();
        if items.iter().all(|entity| entity.id() != &id) {
            return id;
        }
    }
}
