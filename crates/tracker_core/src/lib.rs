//! Local persistent domain store for the personal tracker.
//! Tasks, habits and notes live on-device; this crate owns their invariants.

pub mod calc;
pub mod clock;
pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod tracker;

pub use calc::calendar::{
    calendar_window, habit_row, GridCell, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
pub use calc::streak::{best_streak, current_streak};
pub use calc::views::{DashboardSummary, HabitStats, TaskFilter};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, TrackerConfig};
pub use events::{EventBus, StoreEvent};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::habit::{Habit, HabitDraft, HabitPatch};
pub use model::id::EntityId;
pub use model::note::{Note, NoteDraft, NotePatch, UNTITLED_NOTE};
pub use model::settings::Settings;
pub use model::task::{Category, Priority, Task, TaskDraft, TaskPatch};
pub use model::validation::ValidationError;
pub use model::CollectionKind;
pub use repo::habit_repo::HabitRepository;
pub use repo::note_repo::NoteRepository;
pub use repo::settings_repo::SettingsRepository;
pub use repo::task_repo::TaskRepository;
pub use repo::{reselect_after_remove, Entity, RepoError, RepoResult};
pub use service::backup_service::{
    backup_file_name, export_note_text, note_file_name, BackupDocument, BackupService,
    ImportError, ImportReport,
};
pub use store::{KeyValueStore, KvWrite, SqliteKvStore, StoreError, StoreResult};
pub use tracker::Tracker;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
