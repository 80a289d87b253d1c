//! Director integration tests: scene events in, guard behaviour out.

use guard_core::config::GuardConfig;
use guard_core::sandbox::SandboxWorld;
use guard_core::{
    CatchHandler, EntityId, Guard, GuardCapabilities, GuardState, Navigator, Point3, TrustGauge, TrustLedger, UiFocus,
};
use guard_scene::components::TrustBearer;
use guard_scene::dialogue::DialogueChoice;
use guard_scene::{EntityRegistry, SceneConfig, SceneDirector, SceneEvent, SceneNotice};

const DT: f32 = 0.1;

#[derive(Debug, Default)]
struct RecordingHost {
    trust: Vec<(EntityId, i32)>,
    focus_entered: Vec<EntityId>,
    focus_left: usize,
    catches: Vec<(EntityId, EntityId)>,
}

impl TrustGauge for RecordingHost {
    fn set_max_trust(&mut self, _owner: EntityId, _max: i32) {}

    fn set_trust(&mut self, owner: EntityId, value: i32) {
        self.trust.push((owner, value));
    }
}

impl UiFocus for RecordingHost {
    fn enter_dialogue_focus(&mut self, speaker: EntityId) {
        self.focus_entered.push(speaker);
    }

    fn leave_dialogue_focus(&mut self) {
        self.focus_left += 1;
    }
}

impl CatchHandler for RecordingHost {
    fn player_caught(&mut self, guard: EntityId, target: EntityId) {
        self.catches.push((guard, target));
    }
}

struct Scene {
    world: SandboxWorld,
    director: SceneDirector,
    host: RecordingHost,
    player: EntityId,
}

impl Scene {
    /// Player south of the origin; guards added later face +Z, away from them.
    fn new() -> Self {
        let config = GuardConfig::default();
        let mut world = SandboxWorld::open(40.0);
        let player = world.spawn_player(Point3::new(0.0, 0.0, -10.0));
        let mut director = SceneDirector::new(&config);
        director.set_player(player);
        Self {
            world,
            director,
            host: RecordingHost::default(),
            player,
        }
    }

    fn add_guard(&mut self, name: &str, at: Point3) -> EntityId {
        let id = self.world.spawn_agent(at);
        let guard = Guard::new(id, name, &GuardConfig::default(), Vec::new()).unwrap();
        self.director.add_guard(guard);
        id
    }

    fn add_npc(&mut self, bound: EntityId, summons: bool) -> EntityId {
        let npc = EntityId::new();
        let ledger = TrustLedger::new(npc, &GuardConfig::default().trust);
        let mut bearer = TrustBearer::new("Chef Lucia", ledger, Point3::new(0.0, 0.0, 5.0)).bound_to(bound);
        if summons {
            bearer = bearer.summoning();
        }
        self.director.add_npc(bearer, &mut self.host);
        npc
    }

    fn send(&mut self, event: SceneEvent) {
        self.director.handle(event, &self.world, &mut self.host);
    }

    fn frames(&mut self, n: usize) {
        for _ in 0..n {
            self.director.frame(DT, &mut self.world, &mut self.host);
        }
    }

    fn state(&self, guard: EntityId) -> GuardState {
        self.director.guard(guard).unwrap().current_state()
    }
}

#[test]
fn escalation_during_npc_dialogue_calls_the_bound_guard() {
    let mut scene = Scene::new();
    let near = scene.add_guard("Bruno", Point3::new(1.0, 0.0, 4.0));
    let bound = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let npc = scene.add_npc(bound, false);

    scene.send(SceneEvent::NpcDialogueOpened { npc });
    scene.send(SceneEvent::TrustAdjusted { npc, delta: -20 });
    scene.frames(30);

    assert_eq!(scene.state(bound), GuardState::Chasing);
    assert_eq!(scene.director.guard(bound).unwrap().target(), Some(scene.player));
    assert_eq!(scene.state(near), GuardState::Patrolling);
    assert_eq!(scene.director.npc(npc).unwrap().ledger.current(), 85);

    let notices = scene.director.drain_notices();
    assert!(notices.iter().any(|n| matches!(
        n,
        SceneNotice::SecurityCalled { guard, target, .. } if *guard == bound && *target == scene.player
    )));
    assert!(notices.iter().any(|n| matches!(
        n,
        SceneNotice::Line { speaker, flavor: guard_scene::dialogue::ResponseFlavor::Annoyed, .. } if *speaker == npc
    )));

    let counts = scene.director.counters().snapshot();
    assert_eq!(counts.escalations, 1);
    assert_eq!(counts.chases_started, 1);
}

#[test]
fn no_escalation_while_nobody_is_talking() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let npc = scene.add_npc(guard, false);

    scene.send(SceneEvent::TrustAdjusted { npc, delta: -40 });
    scene.frames(60);

    assert_eq!(scene.director.npc(npc).unwrap().ledger.current(), 60);
    assert_eq!(scene.state(guard), GuardState::Patrolling);
    assert_eq!(scene.director.counters().snapshot().escalations, 0);
}

#[test]
fn low_trust_summons_a_conversation_that_ends_in_a_chase() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let npc = scene.add_npc(guard, true);

    scene.send(SceneEvent::TrustAdjusted { npc, delta: -20 });
    scene.frames(30);

    assert_eq!(scene.state(guard), GuardState::Dialogue);
    assert_eq!(scene.host.focus_entered, vec![scene.player]);
    assert_eq!(scene.director.counters().snapshot().security_summons, 1);

    scene.send(SceneEvent::GuardDialogueChoice { guard, choice: DialogueChoice::Provoke });
    scene.send(SceneEvent::GuardDialogueChoice { guard, choice: DialogueChoice::Cooperate });
    assert_eq!(scene.state(guard), GuardState::Dialogue);
    scene.send(SceneEvent::GuardDialogueChoice { guard, choice: DialogueChoice::Provoke });

    assert_eq!(scene.state(guard), GuardState::Chasing);
    assert_eq!(scene.director.guard(guard).unwrap().target(), Some(scene.player));
    assert!(scene.director.dialogue(guard).is_none());
    assert_eq!(scene.host.focus_left, 1);
}

#[test]
fn appeased_guard_is_not_summoned_again() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let npc = scene.add_npc(guard, true);

    scene.send(SceneEvent::TrustAdjusted { npc, delta: -20 });
    scene.frames(30);
    for choice in [DialogueChoice::Appease, DialogueChoice::Cooperate, DialogueChoice::Cooperate] {
        scene.send(SceneEvent::GuardDialogueChoice { guard, choice });
    }

    assert_eq!(scene.state(guard), GuardState::Patrolling);
    assert!(!scene.director.guard(guard).unwrap().is_chase_enabled());

    scene.frames(30);
    assert_eq!(scene.state(guard), GuardState::Patrolling);
    assert_eq!(scene.director.counters().snapshot().security_summons, 1);
}

#[test]
fn catch_is_forwarded_once_and_freezes_the_scene() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(0.0, 0.0, -9.0));
    let player = scene.player;
    scene.director.guard_mut(guard).unwrap().start_chasing_player(player);

    let dt = scene.director.frame(DT, &mut scene.world, &mut scene.host);
    assert!(dt > 0.0);
    assert_eq!(scene.host.catches, vec![(guard, player)]);
    assert_eq!(scene.director.caught(), Some((guard, player)));
    assert!(scene.director.clock().is_paused());

    assert!(scene.director.frame(DT, &mut scene.world, &mut scene.host).abs() < f32::EPSILON);
    scene.send(SceneEvent::Resumed);
    scene.frames(5);
    assert_eq!(scene.host.catches.len(), 1);
    assert_eq!(scene.director.counters().snapshot().catches, 1);
}

#[test]
fn landed_item_sends_the_nearest_free_guard() {
    let mut scene = Scene::new();
    let busy = scene.add_guard("Bruno", Point3::new(2.0, 0.0, 0.0));
    let free = scene.add_guard("Marco", Point3::new(8.0, 0.0, 0.0));
    let far = scene.add_guard("Gino", Point3::new(20.0, 0.0, 0.0));
    let player = scene.player;
    scene.director.guard_mut(busy).unwrap().start_chasing_player(player);

    scene.send(SceneEvent::ItemLanded {
        item: EntityId::new(),
        point: Point3::ZERO,
    });

    assert_eq!(scene.state(busy), GuardState::Chasing);
    assert_eq!(scene.state(free), GuardState::Investigating);
    assert_eq!(scene.state(far), GuardState::Patrolling);
    assert_eq!(scene.director.counters().snapshot().investigations[0], 1);
}

#[test]
fn quest_timer_ends_a_conversation() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let player = scene.player;

    scene.send(SceneEvent::GuardDialogueStarted { guard, speaker: player });
    assert_eq!(scene.state(guard), GuardState::Dialogue);
    assert!(scene.director.dialogue(guard).is_some());

    scene.send(SceneEvent::QuestTimerElapsed { guard });
    assert_eq!(scene.state(guard), GuardState::Patrolling);
    assert!(scene.director.dialogue(guard).is_none());
    assert_eq!(scene.host.focus_left, 1);
}

#[test]
fn summon_makes_a_guard_follow_and_none_sends_it_back() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let player = scene.player;

    scene.send(SceneEvent::Summon { guard, target: Some(player) });
    assert_eq!(scene.state(guard), GuardState::Following);
    scene.send(SceneEvent::Summon { guard, target: None });
    assert_eq!(scene.state(guard), GuardState::Patrolling);
}

#[test]
fn pause_freezes_trust_stepping() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let npc = scene.add_npc(guard, false);

    scene.send(SceneEvent::TrustAdjusted { npc, delta: -10 });
    scene.send(SceneEvent::Paused);
    scene.frames(20);
    assert_eq!(scene.director.npc(npc).unwrap().ledger.current(), 100);

    scene.send(SceneEvent::Resumed);
    scene.frames(1);
    assert!(scene.director.npc(npc).unwrap().ledger.current() < 100);
    assert!(scene.host.trust.iter().any(|&(owner, _)| owner == npc));
}

#[test]
fn events_for_unknown_guards_are_ignored() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    scene.send(SceneEvent::QuestTimerElapsed { guard: EntityId::new() });
    scene.send(SceneEvent::GuardDialogueChoice {
        guard,
        choice: DialogueChoice::Provoke,
    });
    assert_eq!(scene.state(guard), GuardState::Patrolling);
    assert!(scene.director.drain_notices().is_empty());
}

#[test]
fn scene_config_populates_world_and_registry() {
    let toml = r#"
        [player]
        instance = 1
        spawn = [0.0, 0.0, -5.0]

        [[guards]]
        name = "Marco"
        instance = 10
        spawn = [5.0, 0.0, 5.0]

        [[guards]]
        name = "Bruno"
        instance = 11
        spawn = [-5.0, 0.0, 5.0]
        chase_enabled = false

        [[npcs]]
        name = "Chef Lucia"
        instance = 20
        max_trust = 50
        bound_guard = "Marco"
        summons_security = true
    "#;
    let scene = SceneConfig::from_toml(toml).unwrap();
    let mut world = SandboxWorld::open(30.0);
    let mut registry = EntityRegistry::new();
    let mut host = RecordingHost::default();
    let director = SceneDirector::from_scene(&scene, &mut world, &mut registry, &mut host).unwrap();

    let marco = registry.lookup_entity(10).unwrap();
    let bruno = registry.lookup_entity(11).unwrap();
    assert_eq!(director.guard(marco).unwrap().name(), "Marco");
    assert!(!director.guard(bruno).unwrap().is_chase_enabled());
    assert_eq!(world.agent_position(marco), Some(Point3::new(5.0, 0.0, 5.0)));
    assert_eq!(director.player(), registry.lookup_entity(1));

    let lucia = registry.lookup_entity(20).unwrap();
    let bearer = director.npc(lucia).unwrap();
    assert_eq!(bearer.bound_guard, Some(marco));
    assert!(bearer.summons_security);
    assert_eq!(bearer.ledger.max(), 50);
    assert_eq!(host.trust, vec![(lucia, 50)]);
    assert_eq!(director.guards().count(), 2);
}

#[test]
fn snapshots_restore_patrol_state_and_reject_strangers() {
    let mut scene = Scene::new();
    let guard = scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    let player = scene.player;
    scene.send(SceneEvent::ChasingToggled { guard, enabled: false });
    let saved = scene.director.snapshots();

    scene.send(SceneEvent::ChasingToggled { guard, enabled: true });
    scene.director.guard_mut(guard).unwrap().start_chasing_player(player);
    scene.director.restore(&saved).unwrap();
    assert_eq!(scene.state(guard), GuardState::Patrolling);
    assert!(!scene.director.guard(guard).unwrap().is_chase_enabled());

    let mut stranger = saved[0].clone();
    stranger.id = EntityId::new();
    assert!(matches!(
        scene.director.restore(&[stranger]),
        Err(guard_core::GuardError::EntityNotFound(_))
    ));
}

#[test]
fn guard_without_an_agent_fails_the_wiring_check() {
    let mut scene = Scene::new();
    scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));
    assert!(scene.director.check_wiring(&scene.world).is_ok());

    let ghost = EntityId::new();
    let guard = Guard::new(ghost, "Ghost", &GuardConfig::default(), Vec::new()).unwrap();
    scene.director.add_guard(guard);
    assert!(matches!(
        scene.director.check_wiring(&scene.world),
        Err(guard_core::GuardError::MissingReference { guard, .. }) if guard == ghost
    ));
}

#[test]
fn every_frame_is_timed_against_the_budget() {
    let mut scene = Scene::new();
    scene.director = SceneDirector::new(&GuardConfig::default()).with_frame_budget(1_000.0);
    scene.director.set_player(scene.player);
    scene.add_guard("Marco", Point3::new(10.0, 0.0, 10.0));

    scene.frames(3);
    scene.send(SceneEvent::Paused);
    scene.frames(2);

    let frames = scene.director.frames();
    assert_eq!(frames.frame_count(), 5, "paused frames are timed too");
    assert!(!frames.is_over_budget());
    assert!(frames.last_frame_ms() < frames.budget_ms());
    assert!((frames.budget_ms() - 1_000.0).abs() < f64::EPSILON);
}
