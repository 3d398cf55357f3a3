//! Task repository.
//!
//! # Invariants
//! - Task text is trimmed and non-empty on every write path.
//! - List order is insertion order.

use crate::clock::Clock;
use crate::events::EventBus;
use crate::model::id::EntityId;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::model::validation::{required_text, ValidationError};
use crate::model::CollectionKind;
use crate::repo::collection::{Collection, Entity};
use crate::repo::{CacheReset, RepoResult};
use crate::store::KeyValueStore;
use std::sync::Arc;

impl Entity for Task {
    const KIND: CollectionKind = CollectionKind::Tasks;
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(
        id: EntityId,
        draft: TaskDraft,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            text: required_text(&draft.text, ValidationError::EmptyTaskText)?,
            completed: false,
            due_date: draft.due_date.unwrap_or_else(|| clock.today()),
            priority: draft.priority.unwrap_or_default(),
            category: draft.category.unwrap_or_default(),
        })
    }

    fn apply_patch(
        &mut self,
        patch: TaskPatch,
        _clock: &dyn Clock,
    ) -> Result<(), ValidationError> {
        let text = patch
            .text
            .map(|text| required_text(&text, ValidationError::EmptyTaskText))
            .transpose()?;

        if let Some(text) = text {
            self.text = text;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        Ok(())
    }
}

/// Persisted task collection.
pub struct TaskRepository<S> {
    tasks: Collection<Task, S>,
}

impl<S: KeyValueStore> TaskRepository<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, events: Arc<EventBus>) -> Self {
        Self {
            tasks: Collection::new(store, clock, events),
        }
    }

    pub fn list(&self) -> RepoResult<Vec<Task>> {
        self.tasks.list()
    }

    pub fn get(&self, id: &EntityId) -> RepoResult<Option<Task>> {
        self.tasks.get(id)
    }

    /// Validates and appends a new task with a fresh id.
    pub fn add(&self, draft: TaskDraft) -> RepoResult<Task> {
        self.tasks.add(draft)
    }

    pub fn update(&self, id: &EntityId, patch: TaskPatch) -> RepoResult<Task> {
        self.tasks.update(id, patch)
    }

    pub fn remove(&self, id: &EntityId) -> RepoResult<Task> {
        self.tasks.remove(id)
    }

    /// Flips `completed` and returns the updated task.
    pub fn toggle_completed(&self, id: &EntityId) -> RepoResult<Task> {
        self.tasks.modify("task_toggle", id, |task, _| {
            task.completed = !task.completed;
            Ok(())
        })
    }

    pub fn reload(&self) -> RepoResult<()> {
        self.tasks.reload()
    }

    pub(crate) fn lock_for_replace(&self) -> RepoResult<CacheReset<'_, Vec<Task>>> {
        self.tasks.lock_for_replace()
    }
}
