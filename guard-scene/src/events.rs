//! Scene events going in and notices coming out.
//!
//! [`SceneEvent`]s are raised by the engine (usually through
//! [`crate::hooks`]) and consumed by the [`crate::systems::SceneDirector`].
//! [`SceneNotice`]s are what the director reports back: guard events,
//! dialogue lines and security calls.

use guard_core::{EntityId, GuardEvent, Point3};

use crate::dialogue::{DialogueChoice, ResponseFlavor};

/// Something happened in the scene that the guards may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A thrown or dropped item came to rest.
    ItemLanded {
        item: EntityId,
        point: Point3,
    },

    /// The player started talking to a trust-bearing NPC.
    NpcDialogueOpened {
        npc: EntityId,
    },

    /// That conversation ended.
    NpcDialogueClosed {
        npc: EntityId,
    },

    /// A narrative choice moved an NPC's trust.
    TrustAdjusted {
        npc: EntityId,
        delta: i32,
    },

    /// A conversation with a guard started.
    GuardDialogueStarted {
        guard: EntityId,
        speaker: EntityId,
    },

    /// The player answered a guard.
    GuardDialogueChoice {
        guard: EntityId,
        choice: DialogueChoice,
    },

    /// The guard conversation was closed (possibly early).
    GuardDialogueEnded {
        guard: EntityId,
    },

    /// A guard was told to follow someone, or to stop following (`None`).
    Summon {
        guard: EntityId,
        target: Option<EntityId>,
    },

    /// A quest step switched a guard's chasing on or off.
    ChasingToggled {
        guard: EntityId,
        enabled: bool,
    },

    /// A quest timer ran out; the guard drops everything and patrols.
    QuestTimerElapsed {
        guard: EntityId,
    },

    /// Global pause.
    Paused,

    /// Global unpause.
    Resumed,
}

impl SceneEvent {
    /// Short name for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ItemLanded { .. } => "item_landed",
            Self::NpcDialogueOpened { .. } => "npc_dialogue_opened",
            Self::NpcDialogueClosed { .. } => "npc_dialogue_closed",
            Self::TrustAdjusted { .. } => "trust_adjusted",
            Self::GuardDialogueStarted { .. } => "guard_dialogue_started",
            Self::GuardDialogueChoice { .. } => "guard_dialogue_choice",
            Self::GuardDialogueEnded { .. } => "guard_dialogue_ended",
            Self::Summon { .. } => "summon",
            Self::ChasingToggled { .. } => "chasing_toggled",
            Self::QuestTimerElapsed { .. } => "quest_timer_elapsed",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
        }
    }

    /// The guard this event is addressed to, if any.
    #[must_use]
    pub fn guard(&self) -> Option<EntityId> {
        match self {
            Self::GuardDialogueStarted { guard, .. }
            | Self::GuardDialogueChoice { guard, .. }
            | Self::GuardDialogueEnded { guard }
            | Self::Summon { guard, .. }
            | Self::ChasingToggled { guard, .. }
            | Self::QuestTimerElapsed { guard } => Some(*guard),
            _ => None,
        }
    }
}

/// Something the director reports to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNotice {
    /// Forwarded from a guard.
    Guard(GuardEvent),

    /// Someone says something.
    Line {
        speaker: EntityId,
        flavor: ResponseFlavor,
        text: String,
    },

    /// Low trust opened a security conversation.
    SecuritySummoned {
        guard: EntityId,
        npc: EntityId,
    },

    /// An escalating NPC called a guard on the player.
    SecurityCalled {
        guard: EntityId,
        npc: EntityId,
        target: EntityId,
    },
}
