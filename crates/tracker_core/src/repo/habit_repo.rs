//! Habit repository.
//!
//! # Invariants
//! - Habit names are trimmed and non-empty on every write path.
//! - Toggling the same date twice restores the original date set.

use crate::clock::Clock;
use crate::events::EventBus;
use crate::model::habit::{Habit, HabitDraft, HabitPatch};
use crate::model::id::EntityId;
use crate::model::validation::{required_text, ValidationError};
use crate::model::CollectionKind;
use crate::repo::collection::{Collection, Entity};
use crate::repo::{CacheReset, RepoResult};
use crate::store::KeyValueStore;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

impl Entity for Habit {
    const KIND: CollectionKind = CollectionKind::Habits;
    type Draft = HabitDraft;
    type Patch = HabitPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(
        id: EntityId,
        draft: HabitDraft,
        _clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: required_text(&draft.name, ValidationError::EmptyHabitName)?,
            completed_dates: BTreeSet::new(),
        })
    }

    fn apply_patch(
        &mut self,
        patch: HabitPatch,
        _clock: &dyn Clock,
    ) -> Result<(), ValidationError> {
        let name = patch
            .name
            .map(|name| required_text(&name, ValidationError::EmptyHabitName))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(dates) = patch.completed_dates {
            self.completed_dates = dates;
        }
        Ok(())
    }
}

/// Persisted habit collection.
pub struct HabitRepository<S> {
    habits: Collection<Habit, S>,
}

impl<S: KeyValueStore> HabitRepository<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, events: Arc<EventBus>) -> Self {
        Self {
            habits: Collection::new(store, clock, events),
        }
    }

    pub fn list(&self) -> RepoResult<Vec<Habit>> {
        self.habits.list()
    }

    pub fn get(&self, id: &EntityId) -> RepoResult<Option<Habit>> {
        self.habits.get(id)
    }

    pub fn add(&self, draft: HabitDraft) -> RepoResult<Habit> {
        self.habits.add(draft)
    }

    pub fn update(&self, id: &EntityId, patch: HabitPatch) -> RepoResult<Habit> {
        self.habits.update(id, patch)
    }

    pub fn remove(&self, id: &EntityId) -> RepoResult<Habit> {
        self.habits.remove(id)
    }

    /// Adds `date` to the habit's completions, or removes it when present.
    pub fn toggle_date_completion(&self, id: &EntityId, date: NaiveDate) -> RepoResult<Habit> {
        self.habits.modify("habit_toggle", id, |habit, _| {
            habit.toggle(date);
            Ok(())
        })
    }

    pub fn reload(&self) -> RepoResult<()> {
        self.habits.reload()
    }

    pub(crate) fn lock_for_replace(&self) -> RepoResult<CacheReset<'_, Vec<Habit>>> {
        self.habits.lock_for_replace()
    }
}
