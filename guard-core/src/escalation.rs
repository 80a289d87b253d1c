//! Escalation bridge between conversations and pursuit.
//!
//! Narrative choices become threats through three deterministic paths:
//!
//! 1. A third party's trust falling low summons security
//!    ([`is_low_trust_condition_met`]).
//! 2. Provoking a guard often enough in one conversation ends it in a chase
//!    ([`ProvocationTally`]).
//! 3. A trust ledger escalating mid-conversation calls the bound (or
//!    nearest free) guard ([`select_responder`]).
//!
//! Nothing here draws random numbers.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::guard::GuardState;
use crate::trust::TrustLedger;
use crate::types::{EntityId, Point3};

/// Provocations needed in one conversation before the guard gives chase.
pub const DEFAULT_PROVOKE_LIMIT: u32 = 2;

/// Whether a security conversation should start on its own.
///
/// True when the ledger is at or below its alert threshold and the guard is
/// neither chasing nor already talking.
#[must_use]
pub fn is_low_trust_condition_met(ledger: &TrustLedger, guard_state: GuardState) -> bool {
    ledger.is_low_trust() && !guard_state.is_engaged()
}

/// What a finished guard conversation asks of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueVerdict {
    /// Go back to patrolling.
    Resume,
    /// Chase the given target immediately, ignoring perception.
    Chase(EntityId),
    /// Ignore future sightings until re-enabled, then resume patrolling.
    DisableChasing,
}

/// Counts provocations across the layers of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvocationTally {
    count: u32,
    limit: u32,
    pacified: bool,
}

impl ProvocationTally {
    /// A tally that triggers at `limit` provocations.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            count: 0,
            limit,
            pacified: false,
        }
    }

    /// Record one provocation.
    pub fn provoke(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Record a choice that calms the guard down for good.
    pub fn pacify(&mut self) {
        self.pacified = true;
    }

    /// Provocations so far.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the limit has been reached.
    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.count >= self.limit
    }

    /// The verdict at conversation end. Reaching the limit wins over pacifying.
    #[must_use]
    pub fn verdict(&self, speaker: EntityId) -> DialogueVerdict {
        if self.is_exceeded() {
            DialogueVerdict::Chase(speaker)
        } else if self.pacified {
            DialogueVerdict::DisableChasing
        } else {
            DialogueVerdict::Resume
        }
    }
}

impl Default for ProvocationTally {
    fn default() -> Self {
        Self::new(DEFAULT_PROVOKE_LIMIT)
    }
}

/// A guard that could answer a call for security.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Responder {
    /// Guard id.
    pub guard: EntityId,
    /// Its current state.
    pub state: GuardState,
    /// Where it stands.
    pub position: Point3,
}

/// Pick the guard that answers a call from `caller_position`.
///
/// The bound guard answers if it is not mid-conversation; otherwise the
/// nearest guard not mid-conversation does. Ties keep the first listed.
#[must_use]
pub fn select_responder(bound: Option<EntityId>, caller_position: Point3, candidates: &[Responder]) -> Option<EntityId> {
    let available = |r: &&Responder| r.state != GuardState::Dialogue;
    if let Some(bound) = bound {
        if candidates.iter().filter(available).any(|r| r.guard == bound) {
            return Some(bound);
        }
    }
    candidates
        .iter()
        .filter(available)
        .min_by_key(|r| OrderedFloat(r.position.distance(caller_position)))
        .map(|r| r.guard)
}
