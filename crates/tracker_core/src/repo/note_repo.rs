//! Note repository.
//!
//! # Invariants
//! - Saved titles are never blank (`Untitled Note` fallback).
//! - Every save stamps `updated_at` from the clock, never earlier than
//!   `created_at`.

use crate::clock::Clock;
use crate::events::EventBus;
use crate::model::id::EntityId;
use crate::model::note::{normalize_title, Note, NoteDraft, NotePatch};
use crate::model::validation::ValidationError;
use crate::model::CollectionKind;
use crate::repo::collection::{Collection, Entity};
use crate::repo::{CacheReset, RepoResult};
use crate::store::KeyValueStore;
use std::sync::Arc;

impl Entity for Note {
    const KIND: CollectionKind = CollectionKind::Notes;
    type Draft = NoteDraft;
    type Patch = NotePatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(
        id: EntityId,
        draft: NoteDraft,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        let now = clock.now();
        Ok(Self {
            id,
            title: normalize_title(&draft.title),
            content: draft.content,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(
        &mut self,
        patch: NotePatch,
        clock: &dyn Clock,
    ) -> Result<(), ValidationError> {
        if let Some(title) = patch.title {
            self.title = normalize_title(&title);
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        self.updated_at = clock.now().max(self.created_at);
        Ok(())
    }
}

/// Persisted note collection.
pub struct NoteRepository<S> {
    notes: Collection<Note, S>,
}

impl<S: KeyValueStore> NoteRepository<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, events: Arc<EventBus>) -> Self {
        Self {
            notes: Collection::new(store, clock, events),
        }
    }

    pub fn list(&self) -> RepoResult<Vec<Note>> {
        self.notes.list()
    }

    pub fn get(&self, id: &EntityId) -> RepoResult<Option<Note>> {
        self.notes.get(id)
    }

    pub fn add(&self, draft: NoteDraft) -> RepoResult<Note> {
        self.notes.add(draft)
    }

    /// Saves title and/or content; `updated_at` is refreshed either way.
    pub fn update(&self, id: &EntityId, patch: NotePatch) -> RepoResult<Note> {
        self.notes.update(id, patch)
    }

    pub fn remove(&self, id: &EntityId) -> RepoResult<Note> {
        self.notes.remove(id)
    }

    pub fn reload(&self) -> RepoResult<()> {
        self.notes.reload()
    }

    pub(crate) fn lock_for_replace(&self) -> RepoResult<CacheReset<'_, Vec<Note>>> {
        self.notes.lock_for_replace()
    }
}
