//! Integration hooks for the engine's callbacks.
//!
//! Item physics, the dialogue UI, quest scripts and the pause menu call these
//! with engine instance ids; each hook resolves the ids through the
//! [`EntityRegistry`] and returns the [`SceneEvent`] to feed the director.

use guard_core::EntityId;

use crate::bridge::{EntityRegistry, InstanceId, engine_pos_to_point};
use crate::dialogue::DialogueChoice;
use crate::events::SceneEvent;

/// A thrown item came to rest at `pos`.
#[must_use]
pub fn on_item_landed(registry: &mut EntityRegistry, item: InstanceId, pos: [f32; 3]) -> SceneEvent {
    SceneEvent::ItemLanded {
        item: registry.entity(item),
        point: engine_pos_to_point(pos),
    }
}

/// The dialogue UI opened or closed a conversation with an NPC.
#[must_use]
pub fn on_npc_dialogue(registry: &mut EntityRegistry, npc: InstanceId, open: bool) -> SceneEvent {
    let npc = registry.entity(npc);
    if open {
        SceneEvent::NpcDialogueOpened { npc }
    } else {
        SceneEvent::NpcDialogueClosed { npc }
    }
}

/// A dialogue choice changed an NPC's trust by `delta`.
#[must_use]
pub fn on_trust_choice(registry: &mut EntityRegistry, npc: InstanceId, delta: i32) -> SceneEvent {
    SceneEvent::TrustAdjusted {
        npc: registry.entity(npc),
        delta,
    }
}

/// The player walked up to a guard and started talking.
#[must_use]
pub fn on_guard_dialogue_started(registry: &mut EntityRegistry, guard: InstanceId, speaker: InstanceId) -> SceneEvent {
    SceneEvent::GuardDialogueStarted {
        guard: registry.entity(guard),
        speaker: registry.entity(speaker),
    }
}

/// The player picked a line in a guard conversation.
#[must_use]
pub fn on_guard_choice(registry: &mut EntityRegistry, guard: InstanceId, choice: DialogueChoice) -> SceneEvent {
    SceneEvent::GuardDialogueChoice {
        guard: registry.entity(guard),
        choice,
    }
}

/// The guard conversation window closed.
#[must_use]
pub fn on_guard_dialogue_ended(registry: &mut EntityRegistry, guard: InstanceId) -> SceneEvent {
    SceneEvent::GuardDialogueEnded {
        guard: registry.entity(guard),
    }
}

/// A quest script told a guard to follow someone (`None` to stop).
#[must_use]
pub fn on_summon(registry: &mut EntityRegistry, guard: InstanceId, target: Option<InstanceId>) -> SceneEvent {
    let target: Option<EntityId> = target.map(|t| registry.entity(t));
    SceneEvent::Summon {
        guard: registry.entity(guard),
        target,
    }
}

/// A quest script switched a guard's chasing on or off.
#[must_use]
pub fn on_chasing_toggled(registry: &mut EntityRegistry, guard: InstanceId, enabled: bool) -> SceneEvent {
    SceneEvent::ChasingToggled {
        guard: registry.entity(guard),
        enabled,
    }
}

/// A quest timer bound to a guard ran out.
#[must_use]
pub fn on_quest_timer(registry: &mut EntityRegistry, guard: InstanceId) -> SceneEvent {
    SceneEvent::QuestTimerElapsed {
        guard: registry.entity(guard),
    }
}

/// The pause menu opened or closed.
#[must_use]
pub fn on_pause(paused: bool) -> SceneEvent {
    if paused { SceneEvent::Paused } else { SceneEvent::Resumed }
}
