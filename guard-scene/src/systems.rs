//! Scene systems for the guard AI.
//!
//! The [`SceneDirector`] owns every guard and trust-bearing NPC in a scene
//! and advances them once per frame. It routes [`SceneEvent`]s, bridges trust
//! breakdowns into security calls and forwards the caught side effect to the
//! host exactly once.
//!
//! ## Frame order
//!
//! | Step          | What                                                    |
//! |---------------|---------------------------------------------------------|
//! | Clock         | Scale/pause the raw delta; a paused frame stops here    |
//! | Trust         | Step every ledger; an escalation calls security         |
//! | Summons       | Low trust opens a conversation with the bound guard     |
//! | Guards        | Tick each guard against the shared world                |
//! | Events        | Count guard events, queue notices, drop stale dialogues |

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, debug, info, span, warn};

use guard_core::clock::SimClock;
use guard_core::escalation::{DialogueVerdict, Responder, is_low_trust_condition_met, select_responder};
use guard_core::metrics::{FrameBudgetMonitor, GuardCounters, spans};
use guard_core::sandbox::SandboxWorld;
use guard_core::trust::Escalation;
use guard_core::{
    CatchHandler, EntityId, Guard, GuardCapabilities, GuardConfig, GuardError, GuardSnapshot, GuardState, LayerMask,
    Navigator, SceneHost, TrustGauge, TrustLedger, UiFocus, World,
};

use crate::bridge::{EntityRegistry, TrustBand, engine_pos_to_point};
use crate::components::{GuardComponent, TrustBearer};
use crate::config::SceneConfig;
use crate::dialogue::{DEFAULT_LAYERS, GuardDialogue, ResponseFlavor, greeting, response_line};
use crate::events::{SceneEvent, SceneNotice};

/// Per-frame budget for the whole guard layer, in milliseconds.
pub const FRAME_BUDGET_MS: f64 = 2.0;

/// Remembers the first catch of a frame so the host hears about it once.
#[derive(Debug, Default)]
struct CatchLatch {
    first: Option<(EntityId, EntityId)>,
}

impl CatchHandler for CatchLatch {
    fn player_caught(&mut self, guard: EntityId, target: EntityId) {
        self.first.get_or_insert((guard, target));
    }
}

/// Schedules every guard and NPC ledger in one scene.
pub struct SceneDirector {
    clock: SimClock,
    guards: BTreeMap<EntityId, GuardComponent>,
    npcs: BTreeMap<EntityId, TrustBearer>,
    player: Option<EntityId>,
    dialogue_layers: usize,
    counters: GuardCounters,
    frames: Arc<FrameBudgetMonitor>,
    notices: Vec<SceneNotice>,
    caught: Option<(EntityId, EntityId)>,
    rng: StdRng,
}

impl SceneDirector {
    /// An empty scene. `config` only seeds the line picker here; guards
    /// carry their own tuning.
    #[must_use]
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            clock: SimClock::new(),
            guards: BTreeMap::new(),
            npcs: BTreeMap::new(),
            player: None,
            dialogue_layers: DEFAULT_LAYERS,
            counters: GuardCounters::new(),
            frames: Arc::new(FrameBudgetMonitor::new(FRAME_BUDGET_MS)),
            notices: Vec::new(),
            caught: None,
            rng: StdRng::seed_from_u64(config.general.seed),
        }
    }

    /// Use `layers` choices per security conversation.
    #[must_use]
    pub fn with_dialogue_layers(mut self, layers: usize) -> Self {
        self.dialogue_layers = layers.max(1);
        self
    }

    /// Replace the per-frame budget (milliseconds). Frame history restarts.
    #[must_use]
    pub fn with_frame_budget(mut self, budget_ms: f64) -> Self {
        self.frames = Arc::new(FrameBudgetMonitor::new(budget_ms));
        self
    }

    /// Populate a sandbox world from a scene description.
    ///
    /// Spawns the player, one navigation agent per guard and one body per
    /// NPC, binding every engine instance id in `registry`.
    ///
    /// # Errors
    /// Returns an error if the scene fails validation or a guard's routes or
    /// tuning are invalid.
    pub fn from_scene<G: TrustGauge + ?Sized>(
        scene: &SceneConfig,
        world: &mut SandboxWorld,
        registry: &mut EntityRegistry,
        gauge: &mut G,
    ) -> Result<Self, GuardError> {
        scene.validate()?;
        let config = scene.tuned_guard_config();
        let mut director = Self::new(&config).with_dialogue_layers(scene.dialogue_layers);

        let player = world.spawn_player(engine_pos_to_point(scene.player.spawn));
        registry.bind(scene.player.instance, player);
        director.set_player(player);

        let mut by_name = BTreeMap::new();
        for spec in &scene.guards {
            let id = EntityId::new();
            world.add_agent(id, engine_pos_to_point(spec.spawn));
            registry.bind(spec.instance, id);
            let mut guard = Guard::new(id, spec.name.clone(), &config, spec.patrol_routes()?)?;
            if !spec.chase_enabled {
                guard.disable_chasing();
            }
            by_name.insert(spec.name.as_str(), id);
            director.add_guard(guard);
        }

        for spec in &scene.npcs {
            let position = engine_pos_to_point(spec.position);
            let id = world.spawn_body(position, LayerMask::NPC);
            registry.bind(spec.instance, id);
            let max = spec.max_trust.unwrap_or(config.trust.max_trust);
            let mut bearer = TrustBearer::new(spec.name.clone(), TrustLedger::with_max(id, max, &config.trust), position);
            bearer.bound_guard = spec.bound_guard.as_deref().and_then(|name| by_name.get(name).copied());
            bearer.summons_security = spec.summons_security;
            director.add_npc(bearer, gauge);
        }

        info!(
            guards = director.guards.len(),
            npcs = director.npcs.len(),
            difficulty = ?scene.difficulty,
            "Scene populated"
        );
        Ok(director)
    }

    // -----------------------------------------------------------------------
    // Registration & accessors
    // -----------------------------------------------------------------------

    /// Add a guard. A guard with the same id is replaced.
    pub fn add_guard(&mut self, guard: Guard) {
        self.guards.insert(guard.id(), GuardComponent::new(guard));
    }

    /// Add a trust-bearing NPC and push its ledger to the gauge.
    pub fn add_npc<G: TrustGauge + ?Sized>(&mut self, bearer: TrustBearer, gauge: &mut G) {
        bearer.ledger.attach(gauge);
        self.npcs.insert(bearer.ledger.owner(), bearer);
    }

    /// Who guards chase when security is called.
    pub fn set_player(&mut self, player: EntityId) {
        self.player = Some(player);
    }

    /// The player, if registered.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// A guard by id.
    #[must_use]
    pub fn guard(&self, id: EntityId) -> Option<&Guard> {
        self.guards.get(&id).map(|c| &c.guard)
    }

    /// A guard by id, for direct capability calls.
    pub fn guard_mut(&mut self, id: EntityId) -> Option<&mut Guard> {
        self.guards.get_mut(&id).map(|c| &mut c.guard)
    }

    /// Every guard, in id order.
    pub fn guards(&self) -> impl Iterator<Item = &Guard> {
        self.guards.values().map(|c| &c.guard)
    }

    /// A trust-bearing NPC by id.
    #[must_use]
    pub fn npc(&self, id: EntityId) -> Option<&TrustBearer> {
        self.npcs.get(&id)
    }

    /// The open conversation of a guard.
    #[must_use]
    pub fn dialogue(&self, guard: EntityId) -> Option<&GuardDialogue> {
        self.guards.get(&guard).and_then(|c| c.dialogue.as_ref())
    }

    /// The simulation clock.
    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The simulation clock, for time-scale changes.
    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    /// Event counters.
    #[must_use]
    pub fn counters(&self) -> &GuardCounters {
        &self.counters
    }

    /// Frame timings.
    #[must_use]
    pub fn frames(&self) -> &FrameBudgetMonitor {
        &self.frames
    }

    /// The catch that ended the scene, if any.
    #[must_use]
    pub fn caught(&self) -> Option<(EntityId, EntityId)> {
        self.caught
    }

    /// Take the notices produced since the last call.
    pub fn drain_notices(&mut self) -> Vec<SceneNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Serialisable views of every guard.
    #[must_use]
    pub fn snapshots(&self) -> Vec<GuardSnapshot> {
        self.guards.values().map(|c| c.guard.snapshot()).collect()
    }

    /// Restore guards from saved snapshots.
    ///
    /// # Errors
    /// Returns `GuardError::EntityNotFound` for a snapshot whose guard is not
    /// in this scene; snapshots before it are already applied.
    pub fn restore(&mut self, snapshots: &[GuardSnapshot]) -> Result<(), GuardError> {
        for snapshot in snapshots {
            let c = self
                .guards
                .get_mut(&snapshot.id)
                .ok_or(GuardError::EntityNotFound(snapshot.id))?;
            c.dialogue = None;
            c.guard.restore(snapshot);
        }
        Ok(())
    }

    /// Check that every guard has a navigation agent in `world`.
    ///
    /// # Errors
    /// Returns `GuardError::MissingReference` naming the first guard without
    /// one. Such a guard would stay inert.
    pub fn check_wiring<N: Navigator + ?Sized>(&self, world: &N) -> Result<(), GuardError> {
        match self.guards.keys().find(|&&id| world.agent_position(id).is_none()) {
            Some(&guard) => Err(GuardError::MissingReference {
                guard,
                component: "navigation agent",
            }),
            None => Ok(()),
        }
    }

    /// Counters in Prometheus text format followed by a frame-time summary.
    #[must_use]
    pub fn report(&self) -> String {
        format!(
            "{}# {}\n",
            self.counters.snapshot().to_prometheus(),
            self.frames.percentiles().summary(self.frames.budget_ms())
        )
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Route one scene event.
    pub fn handle<W, H>(&mut self, event: SceneEvent, world: &W, host: &mut H)
    where
        W: World + ?Sized,
        H: SceneHost + ?Sized,
    {
        let span = span!(Level::DEBUG, spans::EVENTS, event = event.label());
        let _enter = span.enter();

        if let Some(guard) = event.guard() {
            if !self.guards.contains_key(&guard) {
                warn!(guard = %guard, event = event.label(), "Event for unknown guard ignored");
                return;
            }
        }

        match event {
            SceneEvent::ItemLanded { item, point } => {
                let free = self
                    .guards
                    .values()
                    .filter(|c| !c.guard.current_state().is_engaged())
                    .filter_map(|c| c.responder(world))
                    .min_by(|a, b| a.position.distance(point).total_cmp(&b.position.distance(point)));
                match free {
                    Some(Responder { guard, .. }) => {
                        if let Some(c) = self.guards.get_mut(&guard) {
                            info!(guard = %guard, item = %item, point = %point, "Item landed, sending guard");
                            c.guard.investigate(point);
                        }
                    }
                    None => debug!(item = %item, "Item landed but no guard is free"),
                }
            }
            SceneEvent::NpcDialogueOpened { npc } => self.set_npc_dialogue(npc, true, host),
            SceneEvent::NpcDialogueClosed { npc } => self.set_npc_dialogue(npc, false, host),
            SceneEvent::TrustAdjusted { npc, delta } => self.adjust_trust(npc, delta),
            SceneEvent::GuardDialogueStarted { guard, speaker } => {
                self.start_conversation(guard, speaker, None, host);
            }
            SceneEvent::GuardDialogueChoice { guard, choice } => {
                let Some(c) = self.guards.get_mut(&guard) else { return };
                let Some(session) = c.dialogue.as_mut() else {
                    debug!(guard = %guard, "Choice without a conversation ignored");
                    return;
                };
                let finished = session.choose(choice) == crate::dialogue::DialogueStep::Finished;
                let flavor = choice.flavor();
                let text = format!("{}: {}", c.guard.name(), response_line(flavor, &mut self.rng));
                self.notices.push(SceneNotice::Line {
                    speaker: guard,
                    flavor,
                    text,
                });
                if finished {
                    self.close_conversation(guard, host);
                }
            }
            SceneEvent::GuardDialogueEnded { guard } => self.close_conversation(guard, host),
            SceneEvent::Summon { guard, target } => {
                if let Some(c) = self.guards.get_mut(&guard) {
                    c.guard.follow_player(target);
                }
            }
            SceneEvent::ChasingToggled { guard, enabled } => {
                if let Some(c) = self.guards.get_mut(&guard) {
                    if enabled {
                        c.guard.enable_chasing();
                    } else {
                        c.guard.disable_chasing();
                    }
                }
            }
            SceneEvent::QuestTimerElapsed { guard } => {
                if let Some(c) = self.guards.get_mut(&guard) {
                    info!(guard = %guard, "Quest timer elapsed");
                    c.guard.resume_patrolling();
                }
            }
            SceneEvent::Paused => self.clock.set_paused(true),
            SceneEvent::Resumed => self.clock.set_paused(false),
        }

        self.collect_guard_events(host);
    }

    fn set_npc_dialogue<H: UiFocus + ?Sized>(&mut self, npc: EntityId, open: bool, host: &mut H) {
        let Some(bearer) = self.npcs.get_mut(&npc) else {
            warn!(npc = %npc, "Dialogue for unknown NPC ignored");
            return;
        };
        if bearer.dialogue_open == open {
            return;
        }
        bearer.dialogue_open = open;
        if open {
            host.enter_dialogue_focus(npc);
        } else {
            host.leave_dialogue_focus();
        }
    }

    fn adjust_trust(&mut self, npc: EntityId, delta: i32) {
        let Some(bearer) = self.npcs.get_mut(&npc) else {
            warn!(npc = %npc, "Trust change for unknown NPC ignored");
            return;
        };
        if delta == 0 {
            return;
        }
        bearer.ledger.adjust(delta);
        let flavor = ResponseFlavor::from_delta(bearer.ledger.last_delta());
        let text = format!("{}: {}", bearer.name, response_line(flavor, &mut self.rng));
        self.notices.push(SceneNotice::Line {
            speaker: npc,
            flavor,
            text,
        });
    }

    fn start_conversation<H: UiFocus + ?Sized>(
        &mut self,
        guard: EntityId,
        speaker: EntityId,
        band: Option<TrustBand>,
        host: &mut H,
    ) {
        let layers = self.dialogue_layers;
        let Some(c) = self.guards.get_mut(&guard) else { return };
        c.dialogue = Some(GuardDialogue::new(guard, speaker, layers));
        c.guard.begin_dialogue(speaker);
        host.enter_dialogue_focus(speaker);
        self.notices.push(SceneNotice::Line {
            speaker: guard,
            flavor: ResponseFlavor::Neutral,
            text: greeting(c.guard.name(), band),
        });
    }

    fn close_conversation<H: UiFocus + ?Sized>(&mut self, guard: EntityId, host: &mut H) {
        let Some(c) = self.guards.get_mut(&guard) else { return };
        let session = c.dialogue.take();
        if session.is_none() && c.guard.current_state() != GuardState::Dialogue {
            debug!(guard = %guard, "No conversation to close");
            return;
        }
        let verdict = session.as_ref().map_or(DialogueVerdict::Resume, GuardDialogue::verdict);
        info!(guard = %guard, verdict = ?verdict, "Guard conversation ended");
        c.guard.end_dialogue(verdict);
        host.leave_dialogue_focus();
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    /// Advance the scene by one frame of `raw_dt` seconds. Returns the scaled
    /// delta actually simulated (zero while paused).
    pub fn frame<W, H>(&mut self, raw_dt: f32, world: &mut W, host: &mut H) -> f32
    where
        W: World + ?Sized,
        H: SceneHost + ?Sized,
    {
        let span = span!(Level::DEBUG, spans::SCENE_FRAME, raw_dt);
        let _enter = span.enter();

        let frames = Arc::clone(&self.frames);
        let dt = {
            let _frame = frames.begin_frame();
            let dt = self.clock.advance(raw_dt);
            if dt > 0.0 {
                self.step_trust(dt, &*world, host);
                self.summon_for_low_trust(host);
                self.tick_guards(dt, world, host);
            }
            dt
        };

        if frames.is_over_budget() {
            warn!(
                frame_ms = frames.last_frame_ms(),
                budget_ms = frames.budget_ms(),
                guards = self.guards.len(),
                "Guard frame over budget"
            );
        }
        dt
    }

    fn step_trust<W, H>(&mut self, dt: f32, world: &W, host: &mut H)
    where
        W: World + ?Sized,
        H: SceneHost + ?Sized,
    {
        let span = span!(Level::TRACE, spans::TRUST);
        let _enter = span.enter();

        let mut escalations = Vec::new();
        for bearer in self.npcs.values_mut() {
            if let Some(escalation) = bearer.ledger.tick(dt, bearer.dialogue_open, &mut *host) {
                escalations.push(escalation);
            }
            if bearer.summoned && !bearer.ledger.is_low_trust() {
                bearer.summoned = false;
            }
        }
        for escalation in escalations {
            self.call_security(escalation, world);
        }
    }

    /// Hand an escalation to the bound guard, or the nearest one not talking.
    fn call_security<W: World + ?Sized>(&mut self, escalation: Escalation, world: &W) {
        self.counters.escalations.fetch_add(1, Ordering::Relaxed);
        let Some(bearer) = self.npcs.get(&escalation.owner) else { return };
        let Some(target) = self.player else {
            warn!(npc = %escalation.owner, "Security called but no player is registered");
            return;
        };

        let caller = world.position_of(escalation.owner).unwrap_or(bearer.position);
        let candidates: Vec<Responder> = self.guards.values().filter_map(|c| c.responder(world)).collect();
        let Some(guard) = select_responder(bearer.bound_guard, caller, &candidates) else {
            warn!(npc = %escalation.owner, "Security called but no guard can respond");
            return;
        };
        if let Some(c) = self.guards.get_mut(&guard) {
            info!(guard = %guard, npc = %escalation.owner, trust = escalation.trust, "Security called");
            c.guard.start_chasing_player(target);
            self.notices.push(SceneNotice::SecurityCalled {
                guard,
                npc: escalation.owner,
                target,
            });
        }
    }

    /// Open a security conversation for every NPC whose trust has fallen low
    /// while its bound guard is free. Once per low-trust spell.
    fn summon_for_low_trust<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        let Some(player) = self.player else { return };

        let mut due = Vec::new();
        for (&npc, bearer) in &self.npcs {
            if !bearer.summons_security || bearer.summoned {
                continue;
            }
            let Some(guard) = bearer.bound_guard else { continue };
            let Some(c) = self.guards.get(&guard) else { continue };
            if is_low_trust_condition_met(&bearer.ledger, c.guard.current_state()) {
                due.push((npc, guard, bearer.band()));
            }
        }

        for (npc, guard, band) in due {
            if self.guards.get(&guard).is_some_and(|c| c.guard.current_state().is_engaged()) {
                continue;
            }
            if let Some(bearer) = self.npcs.get_mut(&npc) {
                bearer.summoned = true;
            }
            self.counters.security_summons.fetch_add(1, Ordering::Relaxed);
            info!(guard = %guard, npc = %npc, "Low trust summoned security");
            self.notices.push(SceneNotice::SecuritySummoned { guard, npc });
            self.start_conversation(guard, player, Some(band), host);
        }
    }

    fn tick_guards<W, H>(&mut self, dt: f32, world: &mut W, host: &mut H)
    where
        W: World + ?Sized,
        H: SceneHost + ?Sized,
    {
        let mut latch = CatchLatch::default();
        for c in self.guards.values_mut() {
            let span = span!(Level::TRACE, spans::GUARD_TICK, guard = %c.guard.id());
            let _enter = span.enter();
            c.guard.tick(dt, &mut *world, &mut latch);
        }

        if let (Some((guard, target)), None) = (latch.first, self.caught) {
            info!(guard = %guard, target_id = %target, "Player caught, freezing scene");
            self.caught = Some((guard, target));
            host.player_caught(guard, target);
            self.clock.set_paused(true);
        }

        self.collect_guard_events(host);
    }

    /// Count and queue guard events; drop conversations whose guard has
    /// already left the dialogue state.
    fn collect_guard_events<H: UiFocus + ?Sized>(&mut self, host: &mut H) {
        for c in self.guards.values_mut() {
            for event in c.guard.drain_events() {
                self.counters.record(&event);
                self.notices.push(SceneNotice::Guard(event));
            }
            if c.dialogue.is_some() && c.guard.current_state() != GuardState::Dialogue {
                debug!(guard = %c.guard.id(), "Conversation dropped by state change");
                c.dialogue = None;
                host.leave_dialogue_focus();
            }
        }
    }
}
