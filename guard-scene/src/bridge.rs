//! Bridge module: maps between engine-side identifiers/values and the guard
//! core's types.
//!
//! The engine identifies scene objects by integer instance ids and hands out
//! positions as plain float triples. The guard core uses:
//! - `EntityId` (UUID)
//! - `Point3`
//! - trust as an `i32` within `[0, max]`
//!
//! This module keeps the two sides apart so neither knows the other's
//! internals.

use std::collections::HashMap;

use guard_core::{EntityId, Point3, TrustLedger};

// ---------------------------------------------------------------------------
// Entity ID Mapping
// ---------------------------------------------------------------------------

/// Engine-side instance id.
pub type InstanceId = i32;

/// Bidirectional map between engine instance ids and `EntityId`s.
///
/// Mappings are created on first sight and stay stable for the lifetime of
/// the scene, so events about the same object always resolve to the same
/// guard, NPC or item.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    to_entity: HashMap<InstanceId, EntityId>,
    to_instance: HashMap<EntityId, InstanceId>,
}

impl EntityRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the `EntityId` for an engine instance.
    pub fn entity(&mut self, instance: InstanceId) -> EntityId {
        *self.to_entity.entry(instance).or_insert_with(|| {
            let id = EntityId::new();
            self.to_instance.insert(id, instance);
            id
        })
    }

    /// Bind an instance to an id minted elsewhere (guards spawned from
    /// config). Any previous binding of either side is replaced.
    pub fn bind(&mut self, instance: InstanceId, entity: EntityId) {
        if let Some(old) = self.to_entity.insert(instance, entity) {
            self.to_instance.remove(&old);
        }
        if let Some(old) = self.to_instance.insert(entity, instance) {
            if old != instance {
                self.to_entity.remove(&old);
            }
        }
    }

    /// Look up an existing mapping without creating one.
    #[must_use]
    pub fn lookup_entity(&self, instance: InstanceId) -> Option<EntityId> {
        self.to_entity.get(&instance).copied()
    }

    /// Look up the engine instance behind an `EntityId`.
    #[must_use]
    pub fn lookup_instance(&self, entity: &EntityId) -> Option<InstanceId> {
        self.to_instance.get(entity).copied()
    }

    /// Drop a mapping (the engine destroyed the object).
    pub fn forget(&mut self, instance: InstanceId) -> Option<EntityId> {
        let entity = self.to_entity.remove(&instance)?;
        self.to_instance.remove(&entity);
        Some(entity)
    }

    /// Total registered entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.to_entity.len()
    }
}

// ---------------------------------------------------------------------------
// Position Mapping
// ---------------------------------------------------------------------------

/// Convert an engine position triple to a `Point3`.
#[must_use]
pub fn engine_pos_to_point(pos: [f32; 3]) -> Point3 {
    Point3::new(pos[0], pos[1], pos[2])
}

/// Convert a `Point3` back to an engine position triple.
#[must_use]
pub fn point_to_engine_pos(point: Point3) -> [f32; 3] {
    [point.x, point.y, point.z]
}

// ---------------------------------------------------------------------------
// Trust Mapping
// ---------------------------------------------------------------------------

/// Coarse reading of a trust ledger, used to pick dialogue tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrustBand {
    /// Below a third of max.
    Hostile,
    /// At or below the alert threshold.
    Wary,
    /// Above the alert threshold but not full.
    Cordial,
    /// Full trust.
    Devoted,
}

impl TrustBand {
    /// Classify a ledger.
    #[must_use]
    pub fn of(ledger: &TrustLedger) -> Self {
        if ledger.max() > 0 && ledger.current() >= ledger.max() {
            Self::Devoted
        } else if !ledger.is_low_trust() {
            Self::Cordial
        } else if ledger.current().saturating_mul(3) >= ledger.max() {
            Self::Wary
        } else {
            Self::Hostile
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Hostile => "openly hostile",
            Self::Wary => "wary and watchful",
            Self::Cordial => "polite",
            Self::Devoted => "completely at ease",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
