//! Scene components.
//!
//! These are attached to scene entities to give them guard behaviour
//! ([`GuardComponent`]) or a trust relationship with the player
//! ([`TrustBearer`]).

use guard_core::escalation::Responder;
use guard_core::{EntityId, Guard, GuardCapabilities, Navigator, Point3, TrustLedger};

use crate::bridge::TrustBand;
use crate::dialogue::GuardDialogue;

/// A security guard in the scene, plus its open conversation if any.
#[derive(Debug)]
pub struct GuardComponent {
    /// The state machine.
    pub guard: Guard,
    /// Conversation in progress.
    pub dialogue: Option<GuardDialogue>,
}

impl GuardComponent {
    /// Wrap a guard.
    #[must_use]
    pub fn new(guard: Guard) -> Self {
        Self { guard, dialogue: None }
    }

    /// This guard as a candidate for a security call, if it has a body.
    #[must_use]
    pub fn responder<N: Navigator + ?Sized>(&self, nav: &N) -> Option<Responder> {
        let position = nav.agent_position(self.guard.id())?;
        Some(Responder {
            guard: self.guard.id(),
            state: self.guard.current_state(),
            position,
        })
    }
}

/// An NPC whose trust in the player is tracked.
#[derive(Debug, Clone)]
pub struct TrustBearer {
    /// Display name.
    pub name: String,
    /// Trust in the player.
    pub ledger: TrustLedger,
    /// Security guard this NPC calls first.
    pub bound_guard: Option<EntityId>,
    /// Whether low trust in this NPC opens a security conversation by itself.
    pub summons_security: bool,
    /// Whether the player is talking to this NPC right now.
    pub dialogue_open: bool,
    /// Where the NPC stands when the engine has no body for it.
    pub position: Point3,
    /// Set once low trust has summoned security; cleared when trust recovers.
    pub summoned: bool,
}

impl TrustBearer {
    /// An NPC at full trust.
    #[must_use]
    pub fn new(name: impl Into<String>, ledger: TrustLedger, position: Point3) -> Self {
        Self {
            name: name.into(),
            ledger,
            bound_guard: None,
            summons_security: false,
            dialogue_open: false,
            position,
            summoned: false,
        }
    }

    /// Call `guard` first when trust breaks down.
    #[must_use]
    pub fn bound_to(mut self, guard: EntityId) -> Self {
        self.bound_guard = Some(guard);
        self
    }

    /// Let low trust open a security conversation on its own.
    #[must_use]
    pub fn summoning(mut self) -> Self {
        self.summons_security = true;
        self
    }

    /// Coarse trust reading.
    #[must_use]
    pub fn band(&self) -> TrustBand {
        TrustBand::of(&self.ledger)
    }
}
