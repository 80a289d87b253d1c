//! External collaborators the guard AI consumes.
//!
//! The host engine implements these traits; the core only calls through
//! them. Navigation is agent-keyed so a single navigation service can drive
//! every guard in a scene.

use crate::types::{EntityId, LayerMask, Point3};

/// An entity returned by a broad-phase spatial query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The entity found.
    pub entity: EntityId,
    /// Its world position at query time.
    pub position: Point3,
}

/// Read-only spatial queries against the shared scene index.
pub trait SpatialQuery {
    /// Entities classified under `mask` within `radius` of `origin`.
    fn overlap_sphere(&self, origin: Point3, radius: f32, mask: LayerMask) -> Vec<Candidate>;

    /// Distance to the first `mask` hit along `direction` (unit vector)
    /// from `origin`, up to `max_distance`.
    fn raycast(&self, origin: Point3, direction: Point3, max_distance: f32, mask: LayerMask) -> Option<f32>;

    /// Current position of an entity, `None` once it has been removed.
    fn position_of(&self, entity: EntityId) -> Option<Point3>;

    /// Current velocity of an entity, when the host tracks it.
    fn velocity_of(&self, entity: EntityId) -> Option<Point3>;
}

/// Path-following primitives of the host navigation system.
pub trait Navigator {
    /// Current position of an agent, `None` if the agent is unknown.
    fn agent_position(&self, agent: EntityId) -> Option<Point3>;

    /// Request a path to `destination`. Returns `false` if the request was
    /// rejected (unknown agent, unreachable point).
    fn set_destination(&mut self, agent: EntityId, destination: Point3) -> bool;

    /// Whether a path request is still being computed.
    fn path_pending(&self, agent: EntityId) -> bool;

    /// Distance left along the current path.
    fn remaining_distance(&self, agent: EntityId) -> f32;

    /// Set the agent's movement speed.
    fn set_speed(&mut self, agent: EntityId, speed: f32);

    /// Halt movement, keeping the current destination.
    fn stop(&mut self, agent: EntityId);

    /// Resume movement after [`Navigator::stop`].
    fn resume(&mut self, agent: EntityId);

    /// Nearest navigable point within `max_distance` of `point`.
    fn sample_position(&self, point: Point3, max_distance: f32) -> Option<Point3>;
}

/// Everything a guard needs from the world in one bound.
pub trait World: SpatialQuery + Navigator {}

impl<T: SpatialQuery + Navigator + ?Sized> World for T {}

/// Display sink for a trust ledger (slider, gauge, bar).
pub trait TrustGauge {
    /// Set the gauge's upper bound.
    fn set_max_trust(&mut self, owner: EntityId, max: i32);
    /// Set the gauge's current value.
    fn set_trust(&mut self, owner: EntityId, value: i32);
}

/// Input/cursor focus handling around conversations.
///
/// Replaces direct global cursor-lock and time-scale mutation from inside AI
/// or dialogue logic.
pub trait UiFocus {
    /// A conversation with `speaker` took focus.
    fn enter_dialogue_focus(&mut self, speaker: EntityId);
    /// The conversation ended and gameplay input returns.
    fn leave_dialogue_focus(&mut self);
}

/// Game-state side effect fired when a guard catches its target.
pub trait CatchHandler {
    /// Disable player control, show the caught screen, freeze the scene.
    fn player_caught(&mut self, guard: EntityId, target: EntityId);
}

/// All scene-level sinks in one bound.
pub trait SceneHost: TrustGauge + UiFocus + CatchHandler {}

impl<T: TrustGauge + UiFocus + CatchHandler + ?Sized> SceneHost for T {}

/// A host that ignores every notification. Useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl TrustGauge for NullHost {
    fn set_max_trust(&mut self, _owner: EntityId, _max: i32) {}
    fn set_trust(&mut self, _owner: EntityId, _value: i32) {}
}

impl UiFocus for NullHost {
    fn enter_dialogue_focus(&mut self, _speaker: EntityId) {}
    fn leave_dialogue_focus(&mut self) {}
}

impl CatchHandler for NullHost {
    fn player_caught(&mut self, _guard: EntityId, _target: EntityId) {}
}
