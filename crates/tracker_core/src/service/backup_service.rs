//! Backup export/import and store reset.
//!
//! # Responsibility
//! - Snapshot every collection plus settings into one backup document.
//! - Replace collections from a backup, section by section.
//! - Export a single note as plain text.
//!
//! # Invariants
//! - Import parses the whole document before writing anything.
//! - All sections present in a document are written in one storage
//!   transaction; absent sections are never touched.
//! - Import and clear hold every repository cache lock across the write, so
//!   no concurrent mutation can persist a stale collection over them.
//! - A section with a repeated id is rejected before anything is written.

use crate::events::StoreEvent;
use crate::model::habit::Habit;
use crate::model::id::EntityId;
use crate::model::note::Note;
use crate::model::settings::Settings;
use crate::model::task::Task;
use crate::model::CollectionKind;
use crate::repo::{CacheReset, Entity, RepoError, RepoResult};
use crate::store::{KeyValueStore, KvWrite, StoreError};
use crate::tracker::Tracker;
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static UNSAFE_FILE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("valid file name regex"));

/// Snapshot of the whole store. Every section is optional on import.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habits: Option<Vec<Habit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

impl BackupDocument {
    /// Sections carried by this document, in store order.
    pub fn sections(&self) -> Vec<CollectionKind> {
        CollectionKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                CollectionKind::Tasks => self.tasks.is_some(),
                CollectionKind::Habits => self.habits.is_some(),
                CollectionKind::Notes => self.notes.is_some(),
                CollectionKind::Settings => self.settings.is_some(),
            })
            .collect()
    }

    /// First id that occurs twice within one section, if any.
    pub fn duplicate_id(&self) -> Option<(CollectionKind, EntityId)> {
        let tasks = self.tasks.as_deref().and_then(repeated_id);
        let habits = self.habits.as_deref().and_then(repeated_id);
        let notes = self.notes.as_deref().and_then(repeated_id);
        tasks
            .map(|id| (CollectionKind::Tasks, id))
            .or_else(|| habits.map(|id| (CollectionKind::Habits, id)))
            .or_else(|| notes.map(|id| (CollectionKind::Notes, id)))
    }

    fn to_writes(&self) -> Result<Vec<KvWrite>, serde_json::Error> {
        let mut writes = Vec::new();
        if let Some(tasks) = &self.tasks {
            writes.push(section_write(CollectionKind::Tasks, tasks)?);
        }
        if let Some(habits) = &self.habits {
            writes.push(section_write(CollectionKind::Habits, habits)?);
        }
        if let Some(notes) = &self.notes {
            writes.push(section_write(CollectionKind::Notes, notes)?);
        }
        if let Some(settings) = &self.settings {
            writes.push(section_write(CollectionKind::Settings, settings)?);
        }
        Ok(writes)
    }
}

fn repeated_id<E: Entity>(items: &[E]) -> Option<EntityId> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(Entity::id)
        .find(|id| !seen.insert(*id))
        .cloned()
}

fn section_write<T: Serialize>(kind: CollectionKind, value: &T) -> serde_json::Result<KvWrite> {
    Ok(KvWrite::set(kind.slot(), serde_json::to_string(value)?))
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Collections that were replaced.
    pub replaced: Vec<CollectionKind>,
    /// `exportDate` carried by the document, if any.
    pub export_date: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum ImportError {
    /// The document is not a structurally valid backup.
    Parse(serde_json::Error),
    /// One section lists the same id more than once.
    DuplicateId {
        collection: CollectionKind,
        id: EntityId,
    },
    Serialize(serde_json::Error),
    Store(StoreError),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid backup document: {err}"),
            Self::DuplicateId { collection, id } => {
                write!(f, "invalid backup document: {collection} repeats id `{id}`")
            }
            Self::Serialize(err) => write!(f, "failed to serialize backup section: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) | Self::Serialize(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::DuplicateId { .. } => None,
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Whole-store backup operations over one tracker's repositories.
pub struct BackupService<'a, S: KeyValueStore> {
    tracker: &'a Tracker<S>,
}

impl<'a, S: KeyValueStore> BackupService<'a, S> {
    pub fn new(tracker: &'a Tracker<S>) -> Self {
        Self { tracker }
    }

    /// Snapshots all collections and settings, stamped with the current time.
    pub fn export(&self) -> RepoResult<BackupDocument> {
        let document = BackupDocument {
            tasks: Some(self.tracker.tasks().list()?),
            habits: Some(self.tracker.habits().list()?),
            notes: Some(self.tracker.notes().list()?),
            settings: Some(self.tracker.settings().get()?),
            export_date: Some(self.tracker.now()),
        };
        info!(
            "event=backup_export module=service status=ok tasks={} habits={} notes={}",
            document.tasks.as_ref().map_or(0, Vec::len),
            document.habits.as_ref().map_or(0, Vec::len),
            document.notes.as_ref().map_or(0, Vec::len)
        );
        Ok(document)
    }

    /// [`export`](Self::export) rendered as pretty-printed JSON.
    pub fn export_json(&self) -> RepoResult<String> {
        Ok(serde_json::to_string_pretty(&self.export()?)?)
    }

    /// Default file name for a backup taken today.
    pub fn default_file_name(&self) -> String {
        backup_file_name(self.tracker.today())
    }

    /// Replaces every collection present in `raw`; absent ones stay as they are.
    ///
    /// Nothing is written when `raw` fails to parse or the write fails.
    pub fn import(&self, raw: &str) -> Result<ImportReport, ImportError> {
        let document: BackupDocument = serde_json::from_str(raw).map_err(|err| {
            error!(
                "event=backup_import module=service status=error error_code=parse_failed error={err}"
            );
            ImportError::Parse(err)
        })?;
        self.import_document(&document)
    }

    /// Same as [`import`](Self::import) for an already parsed document.
    pub fn import_document(&self, document: &BackupDocument) -> Result<ImportReport, ImportError> {
        if let Some((collection, id)) = document.duplicate_id() {
            error!(
                "event=backup_import module=service status=error error_code=duplicate_id collection={collection}"
            );
            return Err(ImportError::DuplicateId { collection, id });
        }
        let replaced = document.sections();
        let writes = document.to_writes().map_err(ImportError::Serialize)?;

        let mut caches = LockedCaches::acquire(self.tracker)?;
        if let Err(err) = self.tracker.store().write_batch(&writes) {
            error!(
                "event=backup_import module=service status=error error_code=write_failed error={err}"
            );
            return Err(err.into());
        }
        for kind in &replaced {
            caches.reset(*kind);
        }
        drop(caches);

        info!(
            "event=backup_import module=service status=ok sections={}",
            replaced.len()
        );
        self.tracker.events().emit(StoreEvent::Imported(replaced.clone()));

        Ok(ImportReport {
            replaced,
            export_date: document.export_date,
        })
    }

    /// Removes every persisted key of this store and resets repository caches.
    pub fn clear_all_data(&self) -> RepoResult<usize> {
        let mut caches = LockedCaches::acquire(self.tracker)?;
        let removed = self.tracker.store().clear_namespace()?;
        for kind in CollectionKind::ALL {
            caches.reset(kind);
        }
        drop(caches);

        info!("event=store_clear module=service status=ok removed_keys={removed}");
        self.tracker.events().emit(StoreEvent::Cleared);
        Ok(removed)
    }
}

/// Every repository cache of one tracker, locked in [`CollectionKind::ALL`] order.
struct LockedCaches<'t> {
    tasks: CacheReset<'t, Vec<Task>>,
    habits: CacheReset<'t, Vec<Habit>>,
    notes: CacheReset<'t, Vec<Note>>,
    settings: CacheReset<'t, Settings>,
}

impl<'t> LockedCaches<'t> {
    fn acquire<S: KeyValueStore>(tracker: &'t Tracker<S>) -> RepoResult<Self> {
        Ok(Self {
            tasks: tracker.tasks().lock_for_replace()?,
            habits: tracker.habits().lock_for_replace()?,
            notes: tracker.notes().lock_for_replace()?,
            settings: tracker.settings().lock_for_replace()?,
        })
    }

    fn reset(&mut self, kind: CollectionKind) {
        match kind {
            CollectionKind::Tasks => self.tasks.reset(),
            CollectionKind::Habits => self.habits.reset(),
            CollectionKind::Notes => self.notes.reset(),
            CollectionKind::Settings => self.settings.reset(),
        }
    }
}

/// `tracker-backup-<YYYY-MM-DD>.json`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("tracker-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Plain-text body of a single-note export: title, blank line, content.
pub fn export_note_text(note: &Note) -> String {
    format!("{}\n\n{}", note.title, note.content)
}

/// `<title>.txt`, with characters that are unsafe in file names replaced.
pub fn note_file_name(note: &Note) -> String {
    let safe = UNSAFE_FILE_CHARS_RE.replace_all(note.title.trim(), "_");
    format!("{safe}.txt")
}
