//! Property-based tests for the guard core.
//!
//! Uses `proptest` to check the trust, spiral and perception invariants
//! under random inputs.

use proptest::prelude::*;

use guard_core::config::{PerceptionConfig, TrustConfig};
use guard_core::investigation::spiral_points;
use guard_core::perception::PerceptionSensor;
use guard_core::sandbox::SandboxWorld;
use guard_core::services::NullHost;
use guard_core::{EntityId, Point3, Pose, TrustLedger};

fn settle(ledger: &mut TrustLedger, dialogue_open: bool) -> usize {
    let mut fired = 0;
    for _ in 0..10_000 {
        if ledger.is_settled() {
            break;
        }
        fired += usize::from(ledger.tick(0.1, dialogue_open, &mut NullHost).is_some());
    }
    fired
}

#[allow(clippy::cast_precision_loss)]
fn threshold(config: &TrustConfig) -> f32 {
    config.max_trust as f32 * config.alert_threshold_fraction
}

// ---------------------------------------------------------------------------
// Trust ledger
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn trust_settles_to_clamped_target(
        start in -150i32..150,
        delta in -300i32..300,
    ) {
        let config = TrustConfig::default();
        let mut ledger = TrustLedger::new(EntityId::new(), &config);
        ledger.adjust(start);
        settle(&mut ledger, false);
        let before = ledger.current();

        ledger.adjust(delta);
        settle(&mut ledger, false);

        prop_assert_eq!(ledger.current(), (before + delta).clamp(0, config.max_trust));
        if delta != 0 {
            prop_assert_eq!(ledger.last_delta(), delta);
        }
    }

    #[test]
    fn escalation_fires_at_most_once_and_only_when_crossing(
        start in -100i32..0,
        delta in -150i32..150,
    ) {
        let config = TrustConfig::default();
        let mut ledger = TrustLedger::new(EntityId::new(), &config);
        ledger.adjust(start);
        settle(&mut ledger, false);
        let before = ledger.current();

        ledger.adjust(delta);
        let fired = settle(&mut ledger, true);
        let target = (before + delta).clamp(0, config.max_trust);

        #[allow(clippy::cast_precision_loss)]
        let should_fire = delta < 0 && before > 0 && target as f32 <= threshold(&config);
        prop_assert!(fired <= 1);
        prop_assert_eq!(fired == 1, should_fire);
        if fired == 1 {
            #[allow(clippy::cast_precision_loss)]
            let at = ledger.current() as f32;
            prop_assert!(at <= threshold(&config));
            prop_assert!(ledger.current() >= target);
        } else {
            prop_assert_eq!(ledger.current(), target);
        }
    }

    #[test]
    fn no_escalation_without_dialogue(delta in -200i32..0) {
        let mut ledger = TrustLedger::new(EntityId::new(), &TrustConfig::default());
        ledger.adjust(delta);
        prop_assert_eq!(settle(&mut ledger, false), 0);
    }
}

// ---------------------------------------------------------------------------
// Spiral
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn spiral_moves_outward_with_even_bearings(
        count in 1usize..24,
        spacing in 0.25f32..5.0,
        ox in -50.0f32..50.0,
        oz in -50.0f32..50.0,
    ) {
        let origin = Point3::new(ox, 0.0, oz);
        let points = spiral_points(origin, count, spacing);
        prop_assert_eq!(points.len(), count);

        #[allow(clippy::cast_precision_loss)]
        let step = 360.0 / count as f32;
        for pair in points.windows(2) {
            let (a, b) = (pair[0] - origin, pair[1] - origin);
            prop_assert!(b.length() > a.length());
            let turn = (b.yaw_degrees() - a.yaw_degrees()).rem_euclid(360.0);
            let err = (turn - step).abs().min((turn - step - 360.0).abs());
            prop_assert!(err < 0.05, "turn {} vs step {}", turn, step);
        }
    }
}

// ---------------------------------------------------------------------------
// Perception: each rejection condition alone hides the target
// ---------------------------------------------------------------------------

fn facing_z() -> Pose {
    Pose::new(Point3::ZERO, Point3::FORWARD)
}

proptest! {
    #[test]
    fn beyond_radius_is_never_visible(
        bearing in -40.0f32..40.0,
        extra in 0.05f32..30.0,
    ) {
        let config = PerceptionConfig::default();
        let mut world = SandboxWorld::open(100.0);
        world.spawn_player(Point3::from_yaw_degrees(bearing) * (config.view_radius + extra));
        let sensor = PerceptionSensor::new(&config);
        prop_assert!(!sensor.scan(&facing_z(), &world).visible);
    }

    #[test]
    fn outside_cone_is_never_visible(
        bearing in 45.5f32..180.0,
        side in prop::bool::ANY,
        distance in 0.5f32..9.5,
    ) {
        let config = PerceptionConfig::default();
        let mut world = SandboxWorld::open(100.0);
        let yaw = if side { bearing } else { -bearing };
        world.spawn_player(Point3::from_yaw_degrees(yaw) * distance);
        let sensor = PerceptionSensor::new(&config);
        prop_assert!(!sensor.scan(&facing_z(), &world).visible);
    }

    #[test]
    fn obstruction_in_between_is_never_visible(
        bearing in -40.0f32..40.0,
        distance in 3.0f32..9.5,
        wall_at in 0.3f32..0.7,
    ) {
        let config = PerceptionConfig::default();
        let mut world = SandboxWorld::open(100.0);
        let dir = Point3::from_yaw_degrees(bearing);
        world.spawn_player(dir * distance);
        let centre = dir * (distance * wall_at);
        world.add_obstruction(
            centre + Point3::new(-0.5, 0.0, -0.5),
            centre + Point3::new(0.5, 3.0, 0.5),
        );
        let sensor = PerceptionSensor::new(&config);
        prop_assert!(!sensor.scan(&facing_z(), &world).visible);
    }

    #[test]
    fn clear_in_cone_in_range_is_visible(
        bearing in -44.0f32..44.0,
        distance in 0.5f32..9.9,
    ) {
        let config = PerceptionConfig::default();
        let mut world = SandboxWorld::open(100.0);
        let player = world.spawn_player(Point3::from_yaw_degrees(bearing) * distance);
        let sensor = PerceptionSensor::new(&config);
        prop_assert!(sensor.scan(&facing_z(), &world).sees(player));
    }
}
