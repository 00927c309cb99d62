use super::{LoadOutcome, Settings};
use std::sync::RwLock;

/// Single-slot cache of the most recently validated settings.
///
/// Owned by the composition root and injected into every command handler.
/// The slot is replaced wholesale, never mutated in place.
#[derive(Debug, Default)]
pub struct SettingsStore {
    slot: RwLock<Option<Settings>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Settings> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace(&self, settings: Settings) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(settings);
    }

    pub fn clear(&self) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Watcher refresh: the slot moves only on a valid outcome. A pass
    /// that comes back absent keeps the previous value; only explicit
    /// delete events clear it.
    pub fn apply_refresh(&self, outcome: LoadOutcome) {
        if let LoadOutcome::Valid(settings) = outcome {
            self.replace(settings);
        }
    }

    /// Initial activation load: an absent outcome leaves the slot empty.
    pub fn apply_initial(&self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Valid(settings) => self.replace(settings),
            LoadOutcome::Absent => self.clear(),
        }
    }
}
