//! Settings repository.
//!
//! Holds a single [`Settings`] value. Nothing stored, or unparsable stored
//! text, yields the defaults.

use crate::events::{EventBus, StoreEvent};
use crate::model::settings::Settings;
use crate::model::CollectionKind;
use crate::repo::{CacheReset, RepoError, RepoResult};
use crate::store::KeyValueStore;
use log::{info, warn};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SettingsRepository<S> {
    store: Arc<S>,
    events: Arc<EventBus>,
    cache: Mutex<Option<Settings>>,
}

impl<S: KeyValueStore> SettingsRepository<S> {
    pub fn new(store: Arc<S>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            events,
            cache: Mutex::new(None),
        }
    }

    pub fn get(&self) -> RepoResult<Settings> {
        let mut guard = self.lock()?;
        if let Some(settings) = guard.as_ref() {
            return Ok(settings.clone());
        }
        let settings = self.load()?;
        *guard = Some(settings.clone());
        Ok(settings)
    }

    /// Replaces the stored settings wholesale.
    pub fn save(&self, settings: Settings) -> RepoResult<()> {
        let mut guard = self.lock()?;
        self.persist(&settings)?;
        *guard = Some(settings);
        drop(guard);
        self.changed();
        Ok(())
    }

    /// Sets one option, persists, and returns the resulting settings.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> RepoResult<Settings> {
        let mut guard = self.lock()?;
        let mut next = match guard.as_ref() {
            Some(settings) => settings.clone(),
            None => self.load()?,
        };
        next.set(key, value);
        self.persist(&next)?;
        *guard = Some(next.clone());
        drop(guard);
        self.changed();
        Ok(next)
    }

    pub fn reload(&self) -> RepoResult<()> {
        *self.lock()? = None;
        Ok(())
    }

    pub(crate) fn lock_for_replace(&self) -> RepoResult<CacheReset<'_, Settings>> {
        Ok(CacheReset::new(self.lock()?))
    }

    fn load(&self) -> RepoResult<Settings> {
        let Some(raw) = self.store.get(CollectionKind::Settings.slot())? else {
            return Ok(Settings::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(
                "event=collection_load module=repo status=error collection=settings error_code=parse_failed error={err}"
            );
            Settings::default()
        }))
    }

    fn persist(&self, settings: &Settings) -> RepoResult<()> {
        let raw = serde_json::to_string(settings)?;
        self.store.set(CollectionKind::Settings.slot(), &raw)?;
        Ok(())
    }

    fn changed(&self) {
        info!("event=settings_save module=repo status=ok collection=settings");
        self.events.emit(StoreEvent::Changed(CollectionKind::Settings));
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Option<Settings>>> {
        self.cache.lock().map_err(|_| RepoError::LockPoisoned)
    }
}
