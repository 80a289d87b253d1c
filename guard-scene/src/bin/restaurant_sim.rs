//! Headless restaurant demo.
//!
//! Loads a scene (the built-in evening shift, or a TOML path given as the
//! first argument), then plays a short scripted sequence of engine callbacks
//! against the sandbox world and prints what the guards did.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use guard_core::sandbox::SandboxWorld;
use guard_core::{CatchHandler, EntityId, GuardCapabilities, Point3, TrustGauge, UiFocus};
use guard_scene::bridge::{EntityRegistry, InstanceId};
use guard_scene::config::init_tracing;
use guard_scene::dialogue::DialogueChoice;
use guard_scene::{SceneConfig, SceneDirector, SceneEvent, SceneNotice, hooks};

const DEFAULT_SCENE: &str = include_str!("../../scene.toml");
const FRAME_DT: f32 = 1.0 / 30.0;
const SHIFT_SECS: f32 = 40.0;

const PLAYER: InstanceId = 1;
const MARCO: InstanceId = 10;
const BRUNO: InstanceId = 11;
const LUCIA: InstanceId = 20;
const CUTLERY: InstanceId = 500;

/// Engine stand-in that logs every notification.
#[derive(Debug, Default)]
struct ConsoleHost {
    caught: bool,
}

impl TrustGauge for ConsoleHost {
    fn set_max_trust(&mut self, owner: EntityId, max: i32) {
        debug!(npc = %owner, max, "gauge max");
    }

    fn set_trust(&mut self, owner: EntityId, value: i32) {
        debug!(npc = %owner, value, "gauge");
    }
}

impl UiFocus for ConsoleHost {
    fn enter_dialogue_focus(&mut self, speaker: EntityId) {
        info!(speaker = %speaker, "cursor unlocked for dialogue");
    }

    fn leave_dialogue_focus(&mut self) {
        info!("cursor locked, back to gameplay");
    }
}

impl CatchHandler for ConsoleHost {
    fn player_caught(&mut self, guard: EntityId, target: EntityId) {
        warn!(guard = %guard, target_id = %target, "CAUGHT: player control disabled");
        self.caught = true;
    }
}

/// One scripted engine callback.
enum Cue {
    ItemLanded([f32; 3]),
    GuardTalk,
    GuardChoice(DialogueChoice),
    NpcDialogue(bool),
    Trust(i32),
    QuestTimer,
}

fn script() -> Vec<(f32, Cue)> {
    vec![
        (1.0, Cue::ItemLanded([4.0, 0.0, 4.0])),
        (3.0, Cue::GuardTalk),
        (3.5, Cue::GuardChoice(DialogueChoice::Appease)),
        (4.0, Cue::GuardChoice(DialogueChoice::Cooperate)),
        (4.5, Cue::GuardChoice(DialogueChoice::Cooperate)),
        (8.0, Cue::NpcDialogue(true)),
        (8.5, Cue::Trust(-10)),
        (9.5, Cue::Trust(-10)),
        (11.0, Cue::NpcDialogue(false)),
        (30.0, Cue::QuestTimer),
    ]
}

fn to_event(cue: &Cue, registry: &mut EntityRegistry) -> SceneEvent {
    match cue {
        Cue::ItemLanded(pos) => hooks::on_item_landed(registry, CUTLERY, *pos),
        Cue::GuardTalk => hooks::on_guard_dialogue_started(registry, BRUNO, PLAYER),
        Cue::GuardChoice(choice) => hooks::on_guard_choice(registry, BRUNO, *choice),
        Cue::NpcDialogue(open) => hooks::on_npc_dialogue(registry, LUCIA, *open),
        Cue::Trust(delta) => hooks::on_trust_choice(registry, LUCIA, *delta),
        Cue::QuestTimer => hooks::on_quest_timer(registry, MARCO),
    }
}

fn log_notice(notice: &SceneNotice) {
    match notice {
        SceneNotice::Line { text, flavor, .. } => info!(flavor = ?flavor, "{text}"),
        SceneNotice::Guard(event) => debug!(event = ?event, "guard"),
        SceneNotice::SecuritySummoned { guard, npc } => info!(guard = %guard, npc = %npc, "security summoned"),
        SceneNotice::SecurityCalled { guard, npc, .. } => info!(guard = %guard, npc = %npc, "security called"),
    }
}

fn main() -> Result<()> {
    let scene = match std::env::args().nth(1) {
        Some(path) => SceneConfig::from_file(&PathBuf::from(&path)).with_context(|| format!("loading scene {path}"))?,
        None => SceneConfig::from_toml(DEFAULT_SCENE).context("parsing built-in scene")?,
    };
    init_tracing(&scene.guard.general);
    info!("{}", scene.difficulty.description());

    let mut world = SandboxWorld::open(scene.floor_half_extent);
    world.add_obstruction(Point3::new(-3.0, 0.0, 8.0), Point3::new(3.0, 1.2, 9.0));
    let mut registry = EntityRegistry::new();
    let mut host = ConsoleHost::default();
    let mut director = SceneDirector::from_scene(&scene, &mut world, &mut registry, &mut host)
        .context("building the scene")?;

    director.check_wiring(&world)?;
    let player = director.player().context("scene has no player")?;
    world.set_velocity(player, Point3::new(1.0, 0.0, 0.0));

    let mut cues = script().into_iter().peekable();
    let mut elapsed = 0.0_f32;
    while elapsed < SHIFT_SECS && !host.caught {
        while let Some((_, cue)) = cues.next_if(|(at, _)| *at <= elapsed) {
            let event = to_event(&cue, &mut registry);
            director.handle(event, &world, &mut host);
        }

        let dt = director.frame(FRAME_DT, &mut world, &mut host);
        world.advance(dt);
        elapsed += FRAME_DT;

        for notice in director.drain_notices() {
            log_notice(&notice);
        }
    }

    for guard in director.guards() {
        info!(
            name = guard.name(),
            state = ?guard.current_state(),
            chase_enabled = guard.is_chase_enabled(),
            "end of shift"
        );
    }
    if let Some(snapshot) = director.snapshots().first() {
        debug!(json = %snapshot.to_json()?, "snapshot");
    }
    println!("{}", director.report());
    Ok(())
}
