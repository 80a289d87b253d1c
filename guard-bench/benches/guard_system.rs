//! Guard AI Benchmark Suite
//!
//! CI-enforced performance targets:
//!   perception_scan_50_candidates ..... < 50μs
//!   investigation_spiral_32_points .... < 5μs
//!   trust_step_50_ledgers ............. < 20μs
//!   full_frame_budget_20_guards ....... < 2ms

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use guard_core::config::{GuardConfig, PerceptionConfig, TrustConfig};
use guard_core::investigation::spiral_points;
use guard_core::perception::PerceptionSensor;
use guard_core::sandbox::SandboxWorld;
use guard_core::services::NullHost;
use guard_core::{EntityId, Guard, LayerMask, PatrolRoute, Point3, Pose, TrustLedger};
use guard_scene::SceneDirector;
use guard_scene::components::TrustBearer;

#[allow(clippy::cast_precision_loss)]
fn ring(i: usize, n: usize, radius: f32) -> Point3 {
    Point3::from_yaw_degrees(i as f32 * 360.0 / n as f32) * radius
}

/// Benchmark: one scan over 50 in-range candidates, most of them behind
/// walls (target: < 50μs).
fn bench_perception_scan(c: &mut Criterion) {
    let config = PerceptionConfig::default();
    let mut world = SandboxWorld::open(50.0);
    for i in 0..50 {
        world.spawn_body(ring(i, 50, 8.0), LayerMask::NPC);
    }
    for i in 0..8 {
        let centre = ring(i, 8, 4.0);
        world.add_obstruction(centre + Point3::new(-1.6, 0.0, -1.6), centre + Point3::new(1.6, 3.0, 1.6));
    }
    let sensor = PerceptionSensor::with_masks(&config, LayerMask::NPC, LayerMask::OBSTRUCTION);
    let pose = Pose::new(Point3::ZERO, Point3::FORWARD);

    c.bench_function("perception_scan_50_candidates", |b| {
        b.iter(|| {
            let sighting = sensor.scan(black_box(&pose), black_box(&world));
            black_box(sighting);
        });
    });
}

/// Benchmark: spiral probe generation (target: < 5μs).
fn bench_spiral(c: &mut Criterion) {
    c.bench_function("investigation_spiral_32_points", |b| {
        b.iter(|| {
            let points = spiral_points(black_box(Point3::new(3.0, 0.0, -7.0)), black_box(32), black_box(1.5));
            black_box(points);
        });
    });
}

/// Benchmark: one stepping tick over 50 ledgers mid-adjustment (target: < 20μs).
fn bench_trust_step(c: &mut Criterion) {
    let config = TrustConfig::default();
    let mut ledgers: Vec<TrustLedger> = (0..50)
        .map(|_| TrustLedger::new(EntityId::new(), &config))
        .collect();

    c.bench_function("trust_step_50_ledgers", |b| {
        b.iter(|| {
            for ledger in &mut ledgers {
                if ledger.is_settled() {
                    ledger.adjust(if ledger.current() > 50 { -40 } else { 40 });
                }
                black_box(ledger.tick(black_box(0.1), false, &mut NullHost));
            }
        });
    });
}

/// Benchmark: full director frame for 20 patrolling guards and 5 NPCs
/// (target: < 2ms).
fn bench_full_frame(c: &mut Criterion) {
    let config = GuardConfig::default();
    let mut world = SandboxWorld::open(50.0);
    let mut director = SceneDirector::new(&config);
    let player = world.spawn_player(Point3::new(45.0, 0.0, 45.0));
    director.set_player(player);

    let mut guards = Vec::new();
    for i in 0..20 {
        let home = ring(i, 20, 15.0);
        let id = world.spawn_agent(home);
        let route = PatrolRoute::new(format!("beat-{i}"), vec![home, home * 0.5, ring(i + 1, 20, 15.0)])
            .expect("finite route");
        let guard = Guard::new(id, format!("guard-{i}"), &config, vec![route]).expect("valid config");
        director.add_guard(guard);
        guards.push(id);
    }
    for (i, &guard) in guards.iter().take(5).enumerate() {
        let npc = EntityId::new();
        let bearer = TrustBearer::new(format!("npc-{i}"), TrustLedger::new(npc, &config.trust), ring(i, 5, 5.0))
            .bound_to(guard);
        director.add_npc(bearer, &mut NullHost);
    }

    let dt = 1.0 / 60.0;
    c.bench_function("full_frame_budget_20_guards", |b| {
        b.iter(|| {
            let scaled = director.frame(black_box(dt), &mut world, &mut NullHost);
            world.advance(scaled);
            black_box(director.drain_notices());
        });
    });

    println!("{}", director.frames().percentiles().summary(director.frames().budget_ms()));
}

criterion_group!(
    benches,
    bench_perception_scan,
    bench_spiral,
    bench_trust_step,
    bench_full_frame,
);
criterion_main!(benches);
