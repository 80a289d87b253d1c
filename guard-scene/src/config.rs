//! Scene configuration for the restaurant level.
//!
//! Layers a scene description (player, guards, trust-bearing NPCs) and a
//! difficulty preset on top of the base `guard_core::GuardConfig`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use guard_core::config::GeneralConfig;
use guard_core::{GuardConfig, GuardError, PatrolRoute};

use crate::bridge::{InstanceId, engine_pos_to_point};
use crate::dialogue::DEFAULT_LAYERS;

type Result<T> = std::result::Result<T, GuardError>;

// ---------------------------------------------------------------------------
// Difficulty presets
// ---------------------------------------------------------------------------

/// How hard the guards are to slip past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Short sight, slow reactions, quick to give up.
    Relaxed,
    /// Base tuning.
    #[default]
    Standard,
    /// Wide sight, fast reactions, long memory.
    Vigilant,
}

impl Difficulty {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Relaxed => "Relaxed: guards look less, react slower and forget sooner",
            Self::Standard => "Standard: base tuning",
            Self::Vigilant => "Vigilant: guards see further, react faster and hold a grudge",
        }
    }

    /// Rescale `config` for this preset.
    pub fn apply(self, config: &mut GuardConfig) {
        match self {
            Self::Relaxed => {
                config.perception.view_radius *= 0.75;
                config.perception.view_angle_degrees = config.perception.view_angle_degrees.min(75.0);
                config.chase.reaction_delay_secs *= 1.5;
                config.chase.give_up_secs *= 0.6;
                config.memory.recall_secs *= 0.5;
                config.movement.run_speed *= 0.9;
            }
            Self::Standard => {
                // Base values are tuned for Standard
            }
            Self::Vigilant => {
                config.perception.view_radius *= 1.3;
                config.perception.view_angle_degrees = (config.perception.view_angle_degrees * 1.33).min(360.0);
                config.chase.reaction_delay_secs *= 0.5;
                config.chase.give_up_secs *= 1.6;
                config.memory.recall_secs *= 1.5;
                config.movement.run_speed *= 1.1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scene description
// ---------------------------------------------------------------------------

/// The player's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpec {
    /// Engine instance id.
    pub instance: InstanceId,
    /// Spawn position.
    #[serde(default)]
    pub spawn: [f32; 3],
}

impl Default for PlayerSpec {
    fn default() -> Self {
        Self {
            instance: 1,
            spawn: [0.0; 3],
        }
    }
}

/// A named waypoint loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Route name.
    pub name: String,
    /// Waypoints in order.
    pub waypoints: Vec<[f32; 3]>,
}

/// One security guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSpec {
    /// Unique name, also used by NPCs to bind to this guard.
    pub name: String,
    /// Engine instance id.
    pub instance: InstanceId,
    /// Spawn position.
    pub spawn: [f32; 3],
    /// Patrol routes; none means the guard stands still.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// Whether sightings trigger chases from the start.
    #[serde(default = "default_true")]
    pub chase_enabled: bool,
}

/// A staff member or diner whose trust is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcSpec {
    /// Display name.
    pub name: String,
    /// Engine instance id.
    pub instance: InstanceId,
    /// Where the NPC stands.
    #[serde(default)]
    pub position: [f32; 3],
    /// Per-NPC trust maximum; defaults to `guard.trust.max_trust`.
    #[serde(default)]
    pub max_trust: Option<i32>,
    /// Name of the guard this NPC calls first.
    #[serde(default)]
    pub bound_guard: Option<String>,
    /// Whether low trust opens a security conversation on its own.
    #[serde(default)]
    pub summons_security: bool,
}

/// Top-level scene configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Base guard tuning before the difficulty preset.
    #[serde(default)]
    pub guard: GuardConfig,
    /// Difficulty preset.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Half the side length of the walkable floor.
    #[serde(default = "default_floor_half_extent")]
    pub floor_half_extent: f32,
    /// Layers in a security conversation.
    #[serde(default = "default_dialogue_layers")]
    pub dialogue_layers: usize,
    /// Player body.
    #[serde(default)]
    pub player: PlayerSpec,
    /// Security guards.
    #[serde(default)]
    pub guards: Vec<GuardSpec>,
    /// Trust-bearing NPCs.
    #[serde(default)]
    pub npcs: Vec<NpcSpec>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),
            difficulty: Difficulty::default(),
            floor_half_extent: default_floor_half_extent(),
            dialogue_layers: default_dialogue_layers(),
            player: PlayerSpec::default(),
            guards: Vec::new(),
            npcs: Vec::new(),
        }
    }
}

impl SceneConfig {
    /// Load a scene from a TOML string.
    ///
    /// # Errors
    /// Returns `GuardError::Config` if the TOML is invalid or the scene is
    /// inconsistent.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| GuardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a scene from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-references and the base tuning.
    ///
    /// # Errors
    /// Returns `GuardError::Config` for duplicate guard names or instance
    /// ids, NPCs bound to unknown guards, or bad guard tuning.
    pub fn validate(&self) -> Result<()> {
        self.guard.validate()?;
        if self.dialogue_layers == 0 {
            return Err(GuardError::Config("dialogue_layers must be at least 1".to_string()));
        }
        if self.floor_half_extent <= 0.0 {
            return Err(GuardError::Config("floor_half_extent must be positive".to_string()));
        }

        let mut names = HashSet::new();
        let mut instances = HashSet::from([self.player.instance]);
        for guard in &self.guards {
            if !names.insert(guard.name.as_str()) {
                return Err(GuardError::Config(format!("duplicate guard name '{}'", guard.name)));
            }
            if !instances.insert(guard.instance) {
                return Err(GuardError::Config(format!("duplicate instance id {}", guard.instance)));
            }
        }
        for npc in &self.npcs {
            if !instances.insert(npc.instance) {
                return Err(GuardError::Config(format!("duplicate instance id {}", npc.instance)));
            }
            if let Some(bound) = &npc.bound_guard {
                if !names.contains(bound.as_str()) {
                    return Err(GuardError::Config(format!(
                        "npc '{}' is bound to unknown guard '{bound}'",
                        npc.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Guard tuning with the difficulty preset applied.
    #[must_use]
    pub fn tuned_guard_config(&self) -> GuardConfig {
        let mut config = self.guard.clone();
        self.difficulty.apply(&mut config);
        config
    }
}

impl GuardSpec {
    /// Build and validate this guard's routes.
    ///
    /// # Errors
    /// Returns `GuardError::InvalidRoute` for an empty or non-finite route.
    pub fn patrol_routes(&self) -> Result<Vec<PatrolRoute>> {
        self.routes
            .iter()
            .map(|r| PatrolRoute::new(r.name.clone(), r.waypoints.iter().copied().map(engine_pos_to_point).collect()))
            .collect()
    }
}

fn default_true() -> bool { true }
fn default_floor_half_extent() -> f32 { 30.0 }
fn default_dialogue_layers() -> usize { DEFAULT_LAYERS }

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber at `general.log_level`.
///
/// `RUST_LOG` wins when set. Calling this twice is harmless; the second
/// subscriber is discarded.
pub fn init_tracing(general: &GeneralConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
