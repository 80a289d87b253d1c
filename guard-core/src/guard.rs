//! The guard state machine.
//!
//! One [`Guard`] per security NPC, advanced once per tick by
//! [`Guard::tick`]. Transitions:
//!
//! ```text
//!               sighting (+ reaction delay, chasing enabled)
//!   Patrolling ─────────────────────────────────────────────▶ Chasing
//!     ▲  │ follow_player                                        │  │
//!     │  ▼                                                      │  │ within catch
//!   Following ── sighting after sensor cooldown ──────────────▶ │  ▼ distance
//!     │ null target                                             │  Caught (one-shot)
//!     ▼                                                         │
//!   Patrolling ◀──────── give-up timer expires ─────────────────┘
//!
//!   any ── begin_dialogue ──▶ Dialogue ── end_dialogue(verdict) ──▶ Patrolling | Chasing
//!   Patrolling/Following ── investigate(point) ──▶ Investigating ──▶ Patrolling | Chasing
//! ```
//!
//! Leaving a state synchronously tears down whatever it had in flight
//! (investigation session, reaction delay, give-up timer), so nothing stale
//! acts after a superseding transition.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Countdown;
use crate::config::GuardConfig;
use crate::error::{GuardError, Result};
use crate::escalation::DialogueVerdict;
use crate::investigation::{InvestigationOutcome, InvestigationSession};
use crate::memory::MemorySet;
use crate::movement::{MoveOrder, MovementArbiter};
use crate::patrol::{PatrolCursor, PatrolPlan, PatrolRoute};
use crate::perception::PerceptionSensor;
use crate::services::{CatchHandler, World};
use crate::types::{EntityId, Point3, Pose};

/// Exactly one is active per guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardState {
    /// Cycling waypoints (initial).
    Patrolling,
    /// Keeping a distance behind a summoned target.
    Following,
    /// Pursuing a target.
    Chasing,
    /// In conversation; movement suspended, facing the speaker.
    Dialogue,
    /// Running a spiral search.
    Investigating,
}

impl GuardState {
    /// Chasing or talking: the guard cannot be summoned.
    #[must_use]
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Chasing | Self::Dialogue)
    }
}

/// Things a guard reports to its scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardEvent {
    /// The state changed.
    StateChanged {
        /// Guard.
        guard: EntityId,
        /// Previous state.
        from: GuardState,
        /// New state.
        to: GuardState,
    },
    /// Perception picked up a target while chasing is enabled.
    TargetSpotted {
        /// Guard.
        guard: EntityId,
        /// Who was seen.
        target: EntityId,
        /// Where.
        position: Point3,
    },
    /// A chase gave up or lost its target.
    ChaseAbandoned {
        /// Guard.
        guard: EntityId,
        /// The target that got away.
        target: EntityId,
    },
    /// The target was caught. Fired once per chase.
    Caught {
        /// Guard.
        guard: EntityId,
        /// Who was caught.
        target: EntityId,
    },
    /// An investigation ended.
    InvestigationFinished {
        /// Guard.
        guard: EntityId,
        /// How it ended.
        outcome: InvestigationOutcome,
    },
}

/// What dialogue and quest systems may ask of any guard.
pub trait GuardCapabilities {
    /// Chase `target` now, bypassing perception.
    fn start_chasing_player(&mut self, target: EntityId);
    /// End a chase and go back to patrolling.
    fn stop_chasing_player(&mut self);
    /// Follow `target`; `None` sends the guard back to patrol.
    fn follow_player(&mut self, target: Option<EntityId>);
    /// Drop whatever the guard is doing and patrol.
    fn resume_patrolling(&mut self);
    /// Ignore sightings until [`GuardCapabilities::enable_chasing`].
    fn disable_chasing(&mut self);
    /// Act on sightings again.
    fn enable_chasing(&mut self);
    /// Whether the guard is chasing.
    fn is_chasing_player(&self) -> bool;
    /// The active state.
    fn current_state(&self) -> GuardState;
}

/// Serialisable view of a guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardSnapshot {
    /// Guard id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Active state.
    pub state: GuardState,
    /// Whether sightings trigger chases.
    pub chase_enabled: bool,
    /// Patrol position.
    pub cursor: PatrolCursor,
    /// Current chase/follow/dialogue target.
    pub target: Option<EntityId>,
    /// Remembered hostile targets.
    pub remembered: Vec<EntityId>,
    /// Whether this chase already caught its target.
    pub caught: bool,
}

impl GuardSnapshot {
    /// Serialise to JSON.
    ///
    /// # Errors
    /// Returns `GuardError::Serialization` on failure.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GuardError::Serialization(e.to_string()))
    }

    /// Parse from JSON.
    ///
    /// # Errors
    /// Returns `GuardError::Serialization` on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GuardError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingChase {
    target: EntityId,
    delay: Countdown,
}

/// A security guard.
#[derive(Debug)]
pub struct Guard {
    id: EntityId,
    name: String,
    config: GuardConfig,
    state: GuardState,
    chase_enabled: bool,
    forward: Point3,
    sensor: PerceptionSensor,
    memory: MemorySet,
    plan: PatrolPlan,
    arbiter: MovementArbiter,
    target: Option<EntityId>,
    give_up: Countdown,
    pending_chase: Option<PendingChase>,
    investigation: Option<InvestigationSession>,
    caught: bool,
    inert: bool,
    rng: StdRng,
    events: Vec<GuardEvent>,
}

impl Guard {
    /// Build a guard that patrols `routes`. An empty route list is valid and
    /// leaves the guard standing still.
    ///
    /// # Errors
    /// Returns `GuardError::Config` if `config` fails validation.
    pub fn new(id: EntityId, name: impl Into<String>, config: &GuardConfig, routes: Vec<PatrolRoute>) -> Result<Self> {
        config.validate()?;
        let name = name.into();
        if routes.is_empty() {
            warn!(guard = %id, name = %name, "Guard has no patrol routes and will idle");
        }
        #[allow(clippy::cast_possible_truncation)]
        let seed = config.general.seed ^ (id.0.as_u128() as u64);
        Ok(Self {
            id,
            name,
            config: config.clone(),
            state: GuardState::Patrolling,
            chase_enabled: true,
            forward: Point3::FORWARD,
            sensor: PerceptionSensor::new(&config.perception),
            memory: MemorySet::new(config.memory.recall_secs),
            plan: PatrolPlan::new(routes),
            arbiter: MovementArbiter::new(config),
            target: None,
            give_up: Countdown::new(config.chase.give_up_secs),
            pending_chase: None,
            investigation: None,
            caught: false,
            inert: false,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        })
    }

    /// Replace the random source (dwell times, route re-rolls).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start facing `forward`.
    #[must_use]
    pub fn facing(mut self, forward: Point3) -> Self {
        self.forward = forward.flat().normalized().unwrap_or(Point3::FORWARD);
        self
    }

    /// Guard id (also its navigation agent id).
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current facing.
    #[must_use]
    pub fn forward(&self) -> Point3 {
        self.forward
    }

    /// Current chase/follow/dialogue target.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Whether sightings trigger chases.
    #[must_use]
    pub fn is_chase_enabled(&self) -> bool {
        self.chase_enabled
    }

    /// Whether a sighting is waiting out the reaction delay.
    #[must_use]
    pub fn is_reacting(&self) -> bool {
        self.pending_chase.is_some()
    }

    /// Whether the guard's navigation agent is missing.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Whether the current chase has caught its target.
    #[must_use]
    pub fn has_caught(&self) -> bool {
        self.caught
    }

    /// The perception sensor.
    #[must_use]
    pub fn sensor(&self) -> &PerceptionSensor {
        &self.sensor
    }

    /// Remembered hostile targets.
    #[must_use]
    pub fn memory(&self) -> &MemorySet {
        &self.memory
    }

    /// Patrol routes and cursor.
    #[must_use]
    pub fn patrol(&self) -> &PatrolPlan {
        &self.plan
    }

    /// The running investigation, if any.
    #[must_use]
    pub fn investigation(&self) -> Option<&InvestigationSession> {
        self.investigation.as_ref()
    }

    /// Seconds left before an unsupported chase is abandoned.
    #[must_use]
    pub fn give_up_remaining(&self) -> f32 {
        self.give_up.remaining()
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Capture a serialisable view.
    #[must_use]
    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
            chase_enabled: self.chase_enabled,
            cursor: self.plan.cursor(),
            target: self.target,
            remembered: self.memory.targets(),
            caught: self.caught,
        }
    }

    /// Restore the persistent parts of a snapshot (chase flag, patrol
    /// position). The guard resumes patrolling.
    pub fn restore(&mut self, snapshot: &GuardSnapshot) {
        self.chase_enabled = snapshot.chase_enabled;
        self.plan.restore(snapshot.cursor);
        self.resume_patrolling();
    }

    // -----------------------------------------------------------------------
    // External triggers
    // -----------------------------------------------------------------------

    /// A conversation with `speaker` started: stop and face them.
    pub fn begin_dialogue(&mut self, speaker: EntityId) {
        self.target = Some(speaker);
        self.transition(GuardState::Dialogue);
    }

    /// A conversation ended with `verdict`. Ignored outside dialogue.
    pub fn end_dialogue(&mut self, verdict: DialogueVerdict) {
        if self.state != GuardState::Dialogue {
            debug!(guard = %self.id, state = ?self.state, "end_dialogue outside dialogue ignored");
            return;
        }
        match verdict {
            DialogueVerdict::Resume => self.resume_patrolling(),
            DialogueVerdict::Chase(target) => self.start_chasing_player(target),
            DialogueVerdict::DisableChasing => {
                self.disable_chasing();
                self.resume_patrolling();
            }
        }
    }

    /// Search around `point`. A running search is cancelled and replaced.
    ///
    /// Returns `false` (and does nothing) while chasing or talking.
    pub fn investigate(&mut self, point: Point3) -> bool {
        if self.state.is_engaged() {
            debug!(guard = %self.id, state = ?self.state, "Busy, investigation ignored");
            return false;
        }
        if let Some(mut previous) = self.investigation.take() {
            previous.cancel();
        }
        self.pending_chase = None;
        self.target = None;
        info!(guard = %self.id, point = %point, "Investigating");
        self.transition(GuardState::Investigating);
        self.investigation = Some(InvestigationSession::new(point, &self.config.investigation));
        true
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance by `dt` scaled seconds. A zero delta (paused) does nothing.
    pub fn tick<W, C>(&mut self, dt: f32, world: &mut W, catch: &mut C)
    where
        W: World + ?Sized,
        C: CatchHandler + ?Sized,
    {
        if dt <= 0.0 {
            return;
        }
        let Some(position) = world.agent_position(self.id) else {
            if !self.inert {
                warn!(guard = %self.id, name = %self.name, "Navigation agent missing, guard is inert");
                self.inert = true;
            }
            return;
        };
        if self.inert {
            info!(guard = %self.id, "Navigation agent found, guard active again");
            self.inert = false;
        }

        self.memory.tick(dt);
        let pose = Pose::new(position, self.forward);

        match self.state {
            GuardState::Patrolling => self.tick_patrol(dt, &pose, world),
            GuardState::Following => self.tick_follow(dt, &pose, world),
            GuardState::Chasing => self.tick_chase(dt, &pose, world, catch),
            GuardState::Dialogue => self.tick_dialogue(dt, &pose, world),
            GuardState::Investigating => self.tick_investigation(dt, &pose, world),
        }
    }

    fn tick_patrol<W: World + ?Sized>(&mut self, dt: f32, pose: &Pose, world: &mut W) {
        self.sensor.tick(dt, pose, &*world);

        if let Some(mut pending) = self.pending_chase {
            if pending.delay.tick(dt) {
                self.pending_chase = None;
                self.start_chasing_player(pending.target);
                return;
            }
            self.pending_chase = Some(pending);
            MoveOrder::Hold.apply(self.id, world);
            if let Some(seen) = world.position_of(pending.target) {
                self.face(seen - pose.position, dt);
            }
            return;
        }

        if self.react_to_sighting() {
            return;
        }

        let order = self.arbiter.patrol(dt, pose.position, &mut self.plan, &mut self.rng);
        order.apply(self.id, world);
        if let Some(destination) = order.destination() {
            self.face(destination - pose.position, dt);
        }
    }

    /// Start (or schedule) a chase off the cached sighting. Returns `true`
    /// if the guard is now reacting.
    fn react_to_sighting(&mut self) -> bool {
        let sighting = self.sensor.latest();
        let (true, Some(target), Some(position)) = (sighting.visible, sighting.target, sighting.position) else {
            return false;
        };
        if !self.chase_enabled {
            return false;
        }
        self.memory.remember(target);
        self.events.push(GuardEvent::TargetSpotted {
            guard: self.id,
            target,
            position,
        });
        let delay = self.config.chase.reaction_delay_secs;
        if delay > 0.0 && self.state == GuardState::Patrolling {
            debug!(guard = %self.id, target_id = %target, delay, "Target spotted, reacting");
            self.pending_chase = Some(PendingChase {
                target,
                delay: Countdown::new(delay),
            });
        } else {
            self.start_chasing_player(target);
        }
        true
    }

    fn tick_follow<W: World + ?Sized>(&mut self, dt: f32, pose: &Pose, world: &mut W) {
        let Some(target_position) = self.target.and_then(|t| world.position_of(t)) else {
            info!(guard = %self.id, "Follow target gone");
            self.resume_patrolling();
            return;
        };

        self.sensor.tick(dt, pose, &*world);
        if self.react_to_sighting() {
            return;
        }

        let order = self.arbiter.follow(pose.position, target_position);
        order.apply(self.id, world);
        self.face(target_position - pose.position, dt);
    }

    fn tick_chase<W, C>(&mut self, dt: f32, pose: &Pose, world: &mut W, catch: &mut C)
    where
        W: World + ?Sized,
        C: CatchHandler + ?Sized,
    {
        let Some(target) = self.target else {
            self.resume_patrolling();
            return;
        };
        if self.caught {
            return;
        }
        let Some(target_position) = world.position_of(target) else {
            info!(guard = %self.id, target_id = %target, "Chase target gone");
            self.memory.forget(target);
            self.abandon_chase(target);
            return;
        };

        self.sensor.tick(dt, pose, &*world);
        let visible = self.sensor.latest().sees(target);
        if visible {
            self.memory.remember(target);
        }

        if visible || self.memory.contains(target) {
            self.give_up.reset();
        } else if self.give_up.tick(dt) {
            info!(guard = %self.id, target_id = %target, "Chase given up");
            self.abandon_chase(target);
            return;
        }

        if pose.position.distance(target_position) <= self.config.chase.catch_distance {
            self.caught = true;
            MoveOrder::Hold.apply(self.id, world);
            info!(guard = %self.id, target_id = %target, "Target caught");
            catch.player_caught(self.id, target);
            self.events.push(GuardEvent::Caught { guard: self.id, target });
            return;
        }

        let destination = if visible {
            let velocity = self.sensor.last_known_velocity().or_else(|| world.velocity_of(target));
            self.arbiter.lead_point(target_position, velocity)
        } else if self.memory.contains(target) {
            target_position
        } else {
            self.sensor.last_known_position().unwrap_or(target_position)
        };

        if !self.arbiter.chase(destination).apply(self.id, world) {
            self.arbiter.chase(target_position).apply(self.id, world);
        }
        self.face(destination - pose.position, dt);
    }

    fn tick_dialogue<W: World + ?Sized>(&mut self, dt: f32, pose: &Pose, world: &mut W) {
        MoveOrder::Hold.apply(self.id, world);
        if let Some(speaker) = self.target.and_then(|t| world.position_of(t)) {
            self.face(speaker - pose.position, dt);
        }
    }

    fn tick_investigation<W: World + ?Sized>(&mut self, dt: f32, pose: &Pose, world: &mut W) {
        self.sensor.tick(dt, pose, &*world);
        if self.react_to_sighting() {
            return;
        }

        let Some(session) = self.investigation.as_mut() else {
            self.resume_patrolling();
            return;
        };
        world.set_speed(self.id, self.arbiter.walk_speed());
        let outcome = session.tick(dt, self.id, pose, &mut self.sensor, world, &mut self.rng);
        if let Some(heading) = session.heading() {
            self.face(heading - pose.position, dt);
        }

        let Some(outcome) = outcome else { return };
        self.events.push(GuardEvent::InvestigationFinished { guard: self.id, outcome });
        match outcome {
            InvestigationOutcome::PlayerFound(target) if self.chase_enabled => {
                self.memory.remember(target);
                self.start_chasing_player(target);
            }
            _ => self.resume_patrolling(),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn face(&mut self, toward: Point3, dt: f32) {
        self.forward = self.arbiter.turn(self.forward, toward, dt);
    }

    fn abandon_chase(&mut self, target: EntityId) {
        self.events.push(GuardEvent::ChaseAbandoned { guard: self.id, target });
        self.sensor.clear_last_known();
        self.resume_patrolling();
    }

    fn transition(&mut self, to: GuardState) {
        let from = self.state;
        if from == GuardState::Investigating && to != GuardState::Investigating {
            if let Some(mut session) = self.investigation.take() {
                session.cancel();
            }
        }
        if to != GuardState::Patrolling {
            self.pending_chase = None;
        }
        if from == to {
            return;
        }
        info!(guard = %self.id, name = %self.name, from = ?from, to = ?to, "Guard state changed");
        self.state = to;
        self.events.push(GuardEvent::StateChanged {
            guard: self.id,
            from,
            to,
        });
    }
}

impl GuardCapabilities for Guard {
    fn start_chasing_player(&mut self, target: EntityId) {
        self.target = Some(target);
        self.memory.remember(target);
        self.give_up.reset();
        self.caught = false;
        self.sensor.resume();
        self.transition(GuardState::Chasing);
    }

    fn stop_chasing_player(&mut self) {
        if self.state != GuardState::Chasing {
            return;
        }
        if let Some(target) = self.target {
            self.memory.forget(target);
        }
        self.sensor.clear_last_known();
        self.resume_patrolling();
    }

    fn follow_player(&mut self, target: Option<EntityId>) {
        let Some(target) = target else {
            self.resume_patrolling();
            return;
        };
        self.target = Some(target);
        self.sensor.suspend(self.config.follow.sensor_cooldown_secs);
        self.transition(GuardState::Following);
    }

    fn resume_patrolling(&mut self) {
        self.target = None;
        self.caught = false;
        self.pending_chase = None;
        self.arbiter.restart_patrol();
        self.transition(GuardState::Patrolling);
    }

    fn disable_chasing(&mut self) {
        if self.chase_enabled {
            info!(guard = %self.id, "Chasing disabled");
        }
        self.chase_enabled = false;
        self.pending_chase = None;
    }

    fn enable_chasing(&mut self) {
        if !self.chase_enabled {
            info!(guard = %self.id, "Chasing enabled");
        }
        self.chase_enabled = true;
    }

    fn is_chasing_player(&self) -> bool {
        self.state == GuardState::Chasing
    }

    fn current_state(&self) -> GuardState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;
    use crate::services::NullHost;

    fn config() -> GuardConfig {
        let mut config = GuardConfig::default();
        config.chase.reaction_delay_secs = 0.0;
        config
    }

    fn spawn(world: &mut SandboxWorld, at: Point3, config: &GuardConfig) -> Guard {
        let id = EntityId::new();
        world.add_agent(id, at);
        Guard::new(id, "Marco", config, vec![]).expect("guard").with_seed(5)
    }

    #[test]
    fn starts_patrolling() {
        let mut world = SandboxWorld::open(30.0);
        let guard = spawn(&mut world, Point3::ZERO, &config());
        assert_eq!(guard.current_state(), GuardState::Patrolling);
        assert!(guard.is_chase_enabled());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config();
        config.trust.max_trust = 0;
        assert!(Guard::new(EntityId::new(), "Broken", &config, vec![]).is_err());
    }

    #[test]
    fn sighting_starts_chase() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        let player = world.spawn_player(Point3::new(0.0, 0.0, 6.0));

        guard.tick(0.016, &mut world, &mut NullHost);
        assert!(guard.is_chasing_player());
        assert_eq!(guard.target(), Some(player));
        assert!(guard.memory().contains(player));
        assert!(
            guard
                .drain_events()
                .iter()
                .any(|e| matches!(e, GuardEvent::TargetSpotted { target, .. } if *target == player))
        );
    }

    #[test]
    fn reaction_delay_postpones_chase() {
        let mut cfg = config();
        cfg.chase.reaction_delay_secs = 1.0;
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &cfg);
        world.spawn_player(Point3::new(0.0, 0.0, 6.0));

        guard.tick(0.1, &mut world, &mut NullHost);
        assert!(guard.is_reacting());
        assert_eq!(guard.current_state(), GuardState::Patrolling);
        for _ in 0..9 {
            guard.tick(0.1, &mut world, &mut NullHost);
        }
        assert_eq!(guard.current_state(), GuardState::Patrolling);
        guard.tick(0.2, &mut world, &mut NullHost);
        assert!(guard.is_chasing_player());
    }

    #[test]
    fn disabling_mid_reaction_cancels_chase() {
        let mut cfg = config();
        cfg.chase.reaction_delay_secs = 1.0;
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &cfg);
        world.spawn_player(Point3::new(0.0, 0.0, 6.0));

        guard.tick(0.1, &mut world, &mut NullHost);
        guard.disable_chasing();
        for _ in 0..30 {
            guard.tick(0.1, &mut world, &mut NullHost);
        }
        assert_eq!(guard.current_state(), GuardState::Patrolling);
        assert!(!guard.is_reacting());
    }

    #[test]
    fn catch_fires_once() {
        #[derive(Default)]
        struct Counter(u32);
        impl CatchHandler for Counter {
            fn player_caught(&mut self, _guard: EntityId, _target: EntityId) {
                self.0 += 1;
            }
        }

        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        let player = world.spawn_player(Point3::new(0.0, 0.0, 1.0));
        let mut counter = Counter::default();

        guard.start_chasing_player(player);
        for _ in 0..5 {
            guard.tick(0.1, &mut world, &mut counter);
        }
        assert_eq!(counter.0, 1);
        assert!(guard.has_caught());
        assert!(world.is_stopped(guard.id()));
    }

    #[test]
    fn removed_target_falls_back_to_patrol() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        let player = world.spawn_player(Point3::new(0.0, 0.0, 6.0));

        guard.start_chasing_player(player);
        world.remove(player);
        guard.tick(0.1, &mut world, &mut NullHost);
        assert_eq!(guard.current_state(), GuardState::Patrolling);

        guard.follow_player(Some(player));
        guard.tick(0.1, &mut world, &mut NullHost);
        assert_eq!(guard.current_state(), GuardState::Patrolling);
    }

    #[test]
    fn follow_with_null_target_patrols() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        guard.follow_player(None);
        assert_eq!(guard.current_state(), GuardState::Patrolling);
    }

    #[test]
    fn following_suspends_sensor_then_chases() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        let player = world.spawn_player(Point3::new(0.0, 0.0, 6.0));

        guard.follow_player(Some(player));
        guard.tick(1.0, &mut world, &mut NullHost);
        assert_eq!(guard.current_state(), GuardState::Following);
        assert_eq!(world.destination(guard.id()), Some(Point3::new(0.0, 0.0, 4.0)));

        guard.tick(1.5, &mut world, &mut NullHost);
        assert!(guard.is_chasing_player());
    }

    #[test]
    fn dialogue_holds_and_verdict_decides() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        let player = world.spawn_player(Point3::new(3.0, 0.0, 0.0));

        guard.begin_dialogue(player);
        guard.tick(1.0, &mut world, &mut NullHost);
        assert_eq!(guard.current_state(), GuardState::Dialogue);
        assert!(world.is_stopped(guard.id()));
        assert!(guard.forward().x > 0.9, "turned toward the speaker");

        guard.end_dialogue(DialogueVerdict::DisableChasing);
        assert_eq!(guard.current_state(), GuardState::Patrolling);
        assert!(!guard.is_chase_enabled());
    }

    #[test]
    fn investigation_is_refused_while_chasing() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        guard.start_chasing_player(world.spawn_player(Point3::new(0.0, 0.0, 20.0)));
        assert!(!guard.investigate(Point3::new(5.0, 0.0, 5.0)));
        assert!(guard.is_chasing_player());
    }

    #[test]
    fn new_investigation_replaces_old_one() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        assert!(guard.investigate(Point3::new(5.0, 0.0, 5.0)));
        guard.tick(0.1, &mut world, &mut NullHost);
        assert!(guard.investigate(Point3::new(-5.0, 0.0, -5.0)));
        assert_eq!(
            guard.investigation().map(InvestigationSession::origin),
            Some(Point3::new(-5.0, 0.0, -5.0))
        );
        assert_eq!(guard.current_state(), GuardState::Investigating);
    }

    #[test]
    fn missing_agent_makes_guard_inert() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = Guard::new(EntityId::new(), "Ghost", &config(), vec![]).expect("guard");
        guard.tick(0.1, &mut world, &mut NullHost);
        assert!(guard.is_inert());
        assert_eq!(guard.current_state(), GuardState::Patrolling);

        world.add_agent(guard.id(), Point3::ZERO);
        guard.tick(0.1, &mut world, &mut NullHost);
        assert!(!guard.is_inert());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        guard.disable_chasing();
        let json = guard.snapshot().to_json().expect("serialise");
        let back = GuardSnapshot::from_json(&json).expect("parse");
        assert_eq!(back, guard.snapshot());
        assert!(GuardSnapshot::from_json("{").is_err());
    }

    #[test]
    fn zero_delta_changes_nothing() {
        let mut world = SandboxWorld::open(30.0);
        let mut guard = spawn(&mut world, Point3::ZERO, &config());
        world.spawn_player(Point3::new(0.0, 0.0, 6.0));
        guard.tick(0.0, &mut world, &mut NullHost);
        assert_eq!(guard.current_state(), GuardState::Patrolling);
        assert!(world.destination(guard.id()).is_none());
    }
}
