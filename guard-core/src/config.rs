//! Configuration for the guard AI.
//!
//! Maps directly to `guard.toml`. Every field has a serde default so a
//! partial file (or an empty one) yields a fully tuned guard.

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};

/// Top-level guard configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Field-of-view sensing.
    #[serde(default)]
    pub perception: PerceptionConfig,
    /// Trust ledger stepping and escalation.
    #[serde(default)]
    pub trust: TrustConfig,
    /// Hostile-target recall.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Pursuit and catching.
    #[serde(default)]
    pub chase: ChaseConfig,
    /// Following a summoned target.
    #[serde(default)]
    pub follow: FollowConfig,
    /// Waypoint cycling.
    #[serde(default)]
    pub patrol: PatrolConfig,
    /// Walk / run speeds.
    #[serde(default)]
    pub movement: MovementConfig,
    /// Spiral search around suspicious points.
    #[serde(default)]
    pub investigation: InvestigationConfig,
}

impl GuardConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `GuardError::Config` if the TOML is invalid or a value is out
    /// of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| GuardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values that would make the state machine misbehave.
    ///
    /// # Errors
    /// Returns `GuardError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, bool); 9] = [
            ("perception.view_radius", self.perception.view_radius > 0.0),
            (
                "perception.view_angle_degrees",
                self.perception.view_angle_degrees > 0.0 && self.perception.view_angle_degrees <= 360.0,
            ),
            ("perception.poll_interval_secs", self.perception.poll_interval_secs > 0.0),
            ("trust.max_trust", self.trust.max_trust > 0),
            (
                "trust.alert_threshold_fraction",
                (0.0..=1.0).contains(&self.trust.alert_threshold_fraction),
            ),
            ("trust.step_interval_secs", self.trust.step_interval_secs > 0.0),
            ("investigation.search_points", self.investigation.search_points > 0),
            (
                "investigation.dwell_secs",
                self.investigation.dwell_min_secs <= self.investigation.dwell_max_secs,
            ),
            ("patrol.dwell_secs", self.patrol.dwell_min_secs <= self.patrol.dwell_max_secs),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((field, _)) => Err(GuardError::Config(format!("{field} is out of range"))),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seed for per-guard randomness (dwell times, route re-rolls).
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: 0x5eed,
        }
    }
}

/// Field-of-view sensing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// How far the guard can see (world units).
    #[serde(default = "default_10_0")]
    pub view_radius: f32,
    /// Full cone width in degrees; a target is seen within half of this
    /// either side of forward.
    #[serde(default = "default_90_0")]
    pub view_angle_degrees: f32,
    /// Seconds between scans.
    #[serde(default = "default_0_2")]
    pub poll_interval_secs: f32,
    /// Height of the guard's eyes above its navigation position.
    #[serde(default = "default_1_6")]
    pub eye_height: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            view_radius: 10.0,
            view_angle_degrees: 90.0,
            poll_interval_secs: 0.2,
            eye_height: 1.6,
        }
    }
}

/// Trust ledger stepping and escalation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Upper bound (and starting value) of every ledger.
    #[serde(default = "default_100_i32")]
    pub max_trust: i32,
    /// Escalate once trust falls to this fraction of max during a dialogue.
    #[serde(default = "default_0_85")]
    pub alert_threshold_fraction: f32,
    /// Seconds between single-unit steps.
    #[serde(default = "default_0_1")]
    pub step_interval_secs: f32,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            max_trust: 100,
            alert_threshold_fraction: 0.85,
            step_interval_secs: 0.1,
        }
    }
}

/// Hostile-target recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Seconds a sighted target stays remembered without being re-seen.
    #[serde(default = "default_60_0")]
    pub recall_secs: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { recall_secs: 60.0 }
    }
}

/// Pursuit and catching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaseConfig {
    /// Seconds without sight or memory before the chase is abandoned.
    #[serde(default = "default_5_0")]
    pub give_up_secs: f32,
    /// Distance at which the target counts as caught.
    #[serde(default = "default_1_5")]
    pub catch_distance: f32,
    /// Delay between first sighting on patrol and starting the chase.
    #[serde(default = "default_1_0")]
    pub reaction_delay_secs: f32,
    /// How far ahead (seconds) to lead a moving target.
    #[serde(default = "default_0_5")]
    pub lead_horizon_secs: f32,
    /// Facing interpolation rate (fraction of the remaining turn per second).
    #[serde(default = "default_8_0")]
    pub turn_rate: f32,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            give_up_secs: 5.0,
            catch_distance: 1.5,
            reaction_delay_secs: 1.0,
            lead_horizon_secs: 0.5,
            turn_rate: 8.0,
        }
    }
}

/// Following a summoned target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowConfig {
    /// Distance kept behind the target.
    #[serde(default = "default_2_0")]
    pub offset_distance: f32,
    /// Seconds the sensor stays suspended after following begins.
    #[serde(default = "default_2_0")]
    pub sensor_cooldown_secs: f32,
    /// Stop moving when this close to the follow point.
    #[serde(default = "default_1_0")]
    pub proximity_threshold: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            offset_distance: 2.0,
            sensor_cooldown_secs: 2.0,
            proximity_threshold: 1.0,
        }
    }
}

/// Waypoint cycling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolConfig {
    /// Distance at which a waypoint counts as reached.
    #[serde(default = "default_1_0")]
    pub arrival_threshold: f32,
    /// Minimum dwell at a waypoint.
    #[serde(default = "default_1_0")]
    pub dwell_min_secs: f32,
    /// Maximum dwell at a waypoint.
    #[serde(default = "default_3_0")]
    pub dwell_max_secs: f32,
    /// Beyond this distance from the waypoint the guard runs.
    #[serde(default = "default_5_0")]
    pub run_distance_threshold: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            arrival_threshold: 1.0,
            dwell_min_secs: 1.0,
            dwell_max_secs: 3.0,
            run_distance_threshold: 5.0,
        }
    }
}

/// Walk / run speeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Walking speed (units per second).
    #[serde(default = "default_2_0")]
    pub walk_speed: f32,
    /// Running speed (units per second).
    #[serde(default = "default_5_0")]
    pub run_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            run_speed: 5.0,
        }
    }
}

/// Spiral search around suspicious points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationConfig {
    /// Number of probe points in the spiral.
    #[serde(default = "default_8_usize")]
    pub search_points: usize,
    /// Radius increment between consecutive probes.
    #[serde(default = "default_2_0")]
    pub point_spacing: f32,
    /// Overall search budget in seconds.
    #[serde(default = "default_20_0")]
    pub duration_secs: f32,
    /// Minimum dwell at a probe before looking around.
    #[serde(default = "default_0_5")]
    pub dwell_min_secs: f32,
    /// Maximum dwell at a probe.
    #[serde(default = "default_1_5")]
    pub dwell_max_secs: f32,
    /// Distance at which the origin or a probe counts as reached.
    #[serde(default = "default_1_0")]
    pub arrival_threshold: f32,
    /// How far from a probe the navigable surface may be sampled.
    #[serde(default = "default_1_0")]
    pub navmesh_sample_radius: f32,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        Self {
            search_points: 8,
            point_spacing: 2.0,
            duration_secs: 20.0,
            dwell_min_secs: 0.5,
            dwell_max_secs: 1.5,
            arrival_threshold: 1.0,
            navmesh_sample_radius: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_seed() -> u64 { 0x5eed }
fn default_0_1() -> f32 { 0.1 }
fn default_0_2() -> f32 { 0.2 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_85() -> f32 { 0.85 }
fn default_1_0() -> f32 { 1.0 }
fn default_1_5() -> f32 { 1.5 }
fn default_1_6() -> f32 { 1.6 }
fn default_2_0() -> f32 { 2.0 }
fn default_3_0() -> f32 { 3.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_8_0() -> f32 { 8.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_20_0() -> f32 { 20.0 }
fn default_60_0() -> f32 { 60.0 }
fn default_90_0() -> f32 { 90.0 }
fn default_100_i32() -> i32 { 100 }
fn default_8_usize() -> usize { 8 }
