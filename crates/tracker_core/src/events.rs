//! Change notifications for out-of-band mutations.
//!
//! # Responsibility
//! - Let presentation code learn that a collection changed without polling.
//!
//! # Invariants
//! - Emitting never blocks and never fails; dropped receivers are pruned.

use crate::model::CollectionKind;
use log::trace;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A repository operation persisted a new version of one collection.
    Changed(CollectionKind),
    /// A backup import replaced the listed collections.
    Imported(Vec<CollectionKind>),
    /// Every persisted key was removed.
    Cleared,
}

/// Fan-out of [`StoreEvent`]s to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    pub fn emit(&self, event: StoreEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        trace!(
            "event=store_event module=events status=ok kind={:?} subscribers={}",
            event,
            subscribers.len()
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, StoreEvent};
    use crate::model::CollectionKind;

    #[test]
    fn every_subscriber_receives_events() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.emit(StoreEvent::Changed(CollectionKind::Tasks));

        assert_eq!(
            first.try_recv().unwrap(),
            StoreEvent::Changed(CollectionKind::Tasks)
        );
        assert_eq!(
            second.try_recv().unwrap(),
            StoreEvent::Changed(CollectionKind::Tasks)
        );
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.emit(StoreEvent::Cleared);

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), StoreEvent::Cleared);
    }
}
