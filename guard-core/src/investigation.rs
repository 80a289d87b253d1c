//! Investigation controller: search a suspicious point in an outward spiral.
//!
//! A session walks to the origin, then visits each probe of an Archimedean
//! spiral around it. At every reachable probe the guard dwells briefly and
//! runs a forced perception scan. The session ends on the first sighting,
//! when the probes run out, when the time budget is spent, or on
//! cancellation. A cancelled or finished session never touches navigation
//! again.
//!
//! Arrival is whatever the path-follower reports: no pending path and the
//! remaining distance within the arrival threshold.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Countdown;
use crate::config::InvestigationConfig;
use crate::perception::PerceptionSensor;
use crate::services::World;
use crate::types::{EntityId, Point3, Pose};

/// `count` probe points around `origin`.
///
/// Point `i` lies at bearing `i * 360 / count` degrees (measured like
/// [`Point3::yaw_degrees`]) and radius `(i + 1) * spacing`, so every point is
/// farther out than the one before it.
#[must_use]
pub fn spiral_points(origin: Point3, count: usize, spacing: f32) -> Vec<Point3> {
    if count == 0 {
        return Vec::new();
    }
    #[allow(clippy::cast_precision_loss)]
    let step = 360.0 / count as f32;
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let i = i as f32;
            origin + Point3::from_yaw_degrees(i * step) * ((i + 1.0) * spacing)
        })
        .collect()
}

/// How an investigation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestigationOutcome {
    /// A probe scan spotted this target.
    PlayerFound(EntityId),
    /// Probes or budget ran out with nothing seen.
    TimedOut,
    /// Abandoned from outside.
    Cancelled,
}

/// Where the session is in its sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvestigationPhase {
    /// Heading for the origin, or for the navigable point nearest it.
    Approaching {
        /// Navigable point actually requested, once issued.
        destination: Option<Point3>,
    },
    /// Heading for probe `index`.
    Travelling {
        /// Probe index.
        index: usize,
        /// Navigable point actually requested.
        destination: Point3,
    },
    /// Looking around at probe `index`.
    Dwelling {
        /// Probe index.
        index: usize,
        /// Time left before the scan.
        timer: Countdown,
    },
    /// Terminal.
    Finished(InvestigationOutcome),
}

/// One in-flight search.
#[derive(Debug, Clone)]
pub struct InvestigationSession {
    origin: Point3,
    probes: Vec<Point3>,
    phase: InvestigationPhase,
    budget: Countdown,
    dwell_range: (f32, f32),
    arrival_threshold: f32,
    sample_radius: f32,
    skipped: usize,
}

impl InvestigationSession {
    /// A session around `origin`.
    #[must_use]
    pub fn new(origin: Point3, config: &InvestigationConfig) -> Self {
        Self {
            origin,
            probes: spiral_points(origin, config.search_points, config.point_spacing),
            phase: InvestigationPhase::Approaching { destination: None },
            budget: Countdown::new(config.duration_secs),
            dwell_range: (config.dwell_min_secs, config.dwell_max_secs),
            arrival_threshold: config.arrival_threshold,
            sample_radius: config.navmesh_sample_radius,
            skipped: 0,
        }
    }

    /// The suspicious point.
    #[must_use]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// The generated probe points.
    #[must_use]
    pub fn probes(&self) -> &[Point3] {
        &self.probes
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> InvestigationPhase {
        self.phase
    }

    /// Probes skipped as unreachable.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Seconds of budget left.
    #[must_use]
    pub fn budget_remaining(&self) -> f32 {
        self.budget.remaining()
    }

    /// The outcome, once finished.
    #[must_use]
    pub fn outcome(&self) -> Option<InvestigationOutcome> {
        match self.phase {
            InvestigationPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Where the guard is currently headed, while moving.
    #[must_use]
    pub fn heading(&self) -> Option<Point3> {
        match self.phase {
            InvestigationPhase::Approaching { destination } => Some(destination.unwrap_or(self.origin)),
            InvestigationPhase::Travelling { destination, .. } => Some(destination),
            _ => None,
        }
    }

    /// Abandon the search. Later ticks do nothing.
    pub fn cancel(&mut self) {
        if self.outcome().is_none() {
            debug!(origin = %self.origin, "Investigation cancelled");
            self.phase = InvestigationPhase::Finished(InvestigationOutcome::Cancelled);
        }
    }

    /// Advance the search by `dt`.
    ///
    /// Returns the outcome on the tick the session finishes.
    pub fn tick<W, R>(
        &mut self,
        dt: f32,
        agent: EntityId,
        pose: &Pose,
        sensor: &mut PerceptionSensor,
        world: &mut W,
        rng: &mut R,
    ) -> Option<InvestigationOutcome>
    where
        W: World + ?Sized,
        R: Rng + ?Sized,
    {
        if self.outcome().is_some() {
            return None;
        }
        if self.budget.tick(dt) {
            return Some(self.finish(InvestigationOutcome::TimedOut, world, agent));
        }

        match self.phase {
            InvestigationPhase::Approaching { destination: None } => {
                let target = world.sample_position(self.origin, self.sample_radius).unwrap_or(self.origin);
                if !head_for(world, agent, target) {
                    debug!(origin = %self.origin, "Origin unreachable, searching from here");
                    return self.next_probe(0, world, agent);
                }
                self.phase = InvestigationPhase::Approaching {
                    destination: Some(target),
                };
                None
            }
            InvestigationPhase::Approaching { destination: Some(_) } => {
                if self.arrived(&*world, agent) {
                    return self.next_probe(0, world, agent);
                }
                None
            }
            InvestigationPhase::Travelling { index, .. } => {
                if self.arrived(&*world, agent) {
                    world.stop(agent);
                    let (lo, hi) = self.dwell_range;
                    self.phase = InvestigationPhase::Dwelling {
                        index,
                        timer: Countdown::new(rng.gen_range(lo..=hi)),
                    };
                }
                None
            }
            InvestigationPhase::Dwelling { index, mut timer } => {
                if !timer.tick(dt) {
                    self.phase = InvestigationPhase::Dwelling { index, timer };
                    return None;
                }
                let sighting = sensor.force_scan(pose, &*world);
                if let (true, Some(target)) = (sighting.visible, sighting.target) {
                    info!(probe = index, target_id = %target, "Investigation found target");
                    return Some(self.finish(InvestigationOutcome::PlayerFound(target), world, agent));
                }
                self.next_probe(index + 1, world, agent)
            }
            InvestigationPhase::Finished(_) => None,
        }
    }

    fn arrived<W: World + ?Sized>(&self, world: &W, agent: EntityId) -> bool {
        !world.path_pending(agent) && world.remaining_distance(agent) <= self.arrival_threshold
    }

    /// Head for the first reachable probe at or after `from`.
    fn next_probe<W: World + ?Sized>(&mut self, from: usize, world: &mut W, agent: EntityId) -> Option<InvestigationOutcome> {
        for index in from..self.probes.len() {
            let probe = self.probes[index];
            let reachable = world
                .sample_position(probe, self.sample_radius)
                .filter(|&point| head_for(world, agent, point));
            match reachable {
                Some(destination) => {
                    self.phase = InvestigationPhase::Travelling { index, destination };
                    return None;
                }
                None => {
                    self.skipped += 1;
                    debug!(probe = index, point = %probe, "Probe unreachable, skipped");
                }
            }
        }
        Some(self.finish(InvestigationOutcome::TimedOut, world, agent))
    }

    fn finish<W: World + ?Sized>(&mut self, outcome: InvestigationOutcome, world: &mut W, agent: EntityId) -> InvestigationOutcome {
        if !matches!(outcome, InvestigationOutcome::PlayerFound(_)) {
            info!(origin = %self.origin, skipped = self.skipped, ?outcome, "Investigation finished");
        }
        world.stop(agent);
        self.phase = InvestigationPhase::Finished(outcome);
        outcome
    }
}

/// Request `point` and release a stop left by a dwell or a hold.
fn head_for<W: World + ?Sized>(world: &mut W, agent: EntityId, point: Point3) -> bool {
    if !world.set_destination(agent, point) {
        return false;
    }
    world.resume(agent);
    true
}
