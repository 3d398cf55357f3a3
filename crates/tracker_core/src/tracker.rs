//! Store facade wiring repositories, events and services together.
//!
//! # Responsibility
//! - Open the database described by a [`TrackerConfig`].
//! - Own one repository per collection over a shared key/value store.
//!
//! # Invariants
//! - All repositories of one tracker share the same store, clock and event bus.

use crate::calc::calendar::{
    calendar_window, habit_row, GridCell, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
use crate::calc::views::{DashboardSummary, HabitStats};
use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::events::{EventBus, StoreEvent};
use crate::model::habit::Habit;
use crate::repo::habit_repo::HabitRepository;
use crate::repo::note_repo::NoteRepository;
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use crate::service::backup_service::BackupService;
use crate::store::{KeyValueStore, SqliteKvStore, StoreResult, DEFAULT_NAMESPACE};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

pub struct Tracker<S: KeyValueStore = SqliteKvStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    tasks: TaskRepository<S>,
    habits: HabitRepository<S>,
    notes: NoteRepository<S>,
    settings: SettingsRepository<S>,
    habit_window_days: u32,
}

impl Tracker<SqliteKvStore> {
    /// Opens (creating if needed) the database file named by `config`.
    pub fn open(config: &TrackerConfig) -> StoreResult<Self> {
        let conn = open_db(config.db_path())?;
        let store = SqliteKvStore::new(conn, &config.namespace)?;
        info!(
            "event=tracker_open module=core status=ok namespace={}",
            store.namespace()
        );
        Ok(Self::with_store(Arc::new(store), Arc::new(SystemClock))
            .with_habit_window(config.habit_window_days))
    }

    /// In-memory tracker on the default namespace, driven by `clock`.
    pub fn in_memory(clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let store = SqliteKvStore::new(open_db_in_memory()?, DEFAULT_NAMESPACE)?;
        Ok(Self::with_store(Arc::new(store), clock))
    }
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn with_store(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let events = Arc::new(EventBus::new());
        Self {
            tasks: TaskRepository::new(store.clone(), clock.clone(), events.clone()),
            habits: HabitRepository::new(store.clone(), clock.clone(), events.clone()),
            notes: NoteRepository::new(store.clone(), clock.clone(), events.clone()),
            settings: SettingsRepository::new(store.clone(), events.clone()),
            store,
            clock,
            events,
            habit_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Sets the habit grid width, clamped to `1..=MAX_WINDOW_DAYS`.
    pub fn with_habit_window(mut self, days: u32) -> Self {
        self.habit_window_days = days.clamp(1, MAX_WINDOW_DAYS);
        self
    }

    pub fn tasks(&self) -> &TaskRepository<S> {
        &self.tasks
    }

    pub fn habits(&self) -> &HabitRepository<S> {
        &self.habits
    }

    pub fn notes(&self) -> &NoteRepository<S> {
        &self.notes
    }

    pub fn settings(&self) -> &SettingsRepository<S> {
        &self.settings
    }

    pub fn backup(&self) -> BackupService<'_, S> {
        BackupService::new(self)
    }

    /// Receives a [`StoreEvent`] for every committed change from now on.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Dates shown in the habit grid, oldest first, ending today.
    pub fn habit_window(&self) -> Vec<NaiveDate> {
        calendar_window(self.habit_window_days, self.today())
    }

    /// Each habit paired with its grid row over [`habit_window`](Self::habit_window).
    pub fn habit_grid(&self) -> RepoResult<Vec<(Habit, Vec<GridCell>)>> {
        let window = self.habit_window();
        Ok(self
            .habits
            .list()?
            .into_iter()
            .map(|habit| {
                let row = habit_row(&habit, &window);
                (habit, row)
            })
            .collect())
    }

    pub fn dashboard(&self) -> RepoResult<DashboardSummary> {
        Ok(DashboardSummary::compute(
            &self.tasks.list()?,
            &self.habits.list()?,
            self.today(),
        ))
    }

    pub fn habit_stats(&self) -> RepoResult<HabitStats> {
        Ok(HabitStats::compute(&self.habits.list()?, self.today()))
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }
}
