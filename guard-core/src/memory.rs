//! Time-bounded recall of hostile targets.
//!
//! A remembered target keeps a guard chasing after line of sight is lost.
//! Each sighting refreshes the entry's recall timer.

use std::collections::HashMap;

use tracing::debug;

use crate::clock::Countdown;
use crate::types::EntityId;

/// Targets a guard currently considers hostile.
#[derive(Debug, Clone)]
pub struct MemorySet {
    recall_secs: f32,
    entries: HashMap<EntityId, Countdown>,
}

impl MemorySet {
    /// An empty set whose entries expire after `recall_secs`.
    #[must_use]
    pub fn new(recall_secs: f32) -> Self {
        Self {
            recall_secs,
            entries: HashMap::new(),
        }
    }

    /// Remember `target`, restarting its recall timer.
    pub fn remember(&mut self, target: EntityId) {
        self.entries.insert(target, Countdown::new(self.recall_secs));
    }

    /// Drop `target` immediately.
    pub fn forget(&mut self, target: EntityId) -> bool {
        self.entries.remove(&target).is_some()
    }

    /// Whether `target` is remembered.
    #[must_use]
    pub fn contains(&self, target: EntityId) -> bool {
        self.entries.contains_key(&target)
    }

    /// Seconds of recall left for `target`.
    #[must_use]
    pub fn remaining(&self, target: EntityId) -> Option<f32> {
        self.entries.get(&target).map(Countdown::remaining)
    }

    /// Age every entry, returning the ones that expired.
    pub fn tick(&mut self, dt: f32) -> Vec<EntityId> {
        let mut expired = Vec::new();
        self.entries.retain(|id, timer| {
            if timer.tick(dt) {
                expired.push(*id);
                false
            } else {
                true
            }
        });
        for id in &expired {
            debug!(target_id = %id, "Hostile target forgotten");
        }
        expired
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remembered targets in a stable order.
    #[must_use]
    pub fn targets(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of remembered targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
