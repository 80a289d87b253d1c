//! Movement arbiter.
//!
//! Turns the active guard state into one [`MoveOrder`]: where the
//! path-follower should head and how fast. Also owns the patrol dwell phase
//! and the smoothed facing used by every state.

use rand::Rng;

use crate::clock::Countdown;
use crate::config::GuardConfig;
use crate::patrol::PatrolPlan;
use crate::services::Navigator;
use crate::types::{EntityId, Point3};

/// One navigation request for the path-follower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOrder {
    /// Stand still.
    Hold,
    /// Head for `destination` at `speed`.
    MoveTo {
        /// Where to go.
        destination: Point3,
        /// Units per second.
        speed: f32,
    },
}

impl MoveOrder {
    /// Send the order to the navigation service.
    ///
    /// Returns `false` if the destination was rejected.
    pub fn apply<N: Navigator + ?Sized>(self, agent: EntityId, nav: &mut N) -> bool {
        match self {
            Self::Hold => {
                nav.stop(agent);
                true
            }
            Self::MoveTo { destination, speed } => {
                nav.set_speed(agent, speed);
                nav.resume(agent);
                nav.set_destination(agent, destination)
            }
        }
    }

    /// Destination, if moving.
    #[must_use]
    pub fn destination(self) -> Option<Point3> {
        match self {
            Self::Hold => None,
            Self::MoveTo { destination, .. } => Some(destination),
        }
    }
}

/// Waiting state on a patrol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatrolPhase {
    /// Walking or running toward the current waypoint.
    Travelling,
    /// Standing at a reached waypoint.
    Dwelling(Countdown),
}

/// Resolves patrol, follow and chase into move orders.
#[derive(Debug, Clone)]
pub struct MovementArbiter {
    walk_speed: f32,
    run_speed: f32,
    arrival_threshold: f32,
    dwell_range: (f32, f32),
    run_distance_threshold: f32,
    follow_offset: f32,
    follow_proximity: f32,
    lead_horizon: f32,
    turn_rate: f32,
    phase: PatrolPhase,
}

impl MovementArbiter {
    /// Build from guard configuration.
    #[must_use]
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            walk_speed: config.movement.walk_speed,
            run_speed: config.movement.run_speed,
            arrival_threshold: config.patrol.arrival_threshold,
            dwell_range: (config.patrol.dwell_min_secs, config.patrol.dwell_max_secs),
            run_distance_threshold: config.patrol.run_distance_threshold,
            follow_offset: config.follow.offset_distance,
            follow_proximity: config.follow.proximity_threshold,
            lead_horizon: config.chase.lead_horizon_secs,
            turn_rate: config.chase.turn_rate,
            phase: PatrolPhase::Travelling,
        }
    }

    /// Current patrol phase.
    #[must_use]
    pub fn phase(&self) -> PatrolPhase {
        self.phase
    }

    /// Head back toward the current waypoint (used when patrol resumes).
    pub fn restart_patrol(&mut self) {
        self.phase = PatrolPhase::Travelling;
    }

    /// Walking speed.
    #[must_use]
    pub fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    /// Running speed.
    #[must_use]
    pub fn run_speed(&self) -> f32 {
        self.run_speed
    }

    /// Run when far from the destination, walk for the final stretch.
    #[must_use]
    pub fn approach_speed(&self, distance: f32) -> f32 {
        if distance > self.run_distance_threshold {
            self.run_speed
        } else {
            self.walk_speed
        }
    }

    /// Patrol step: travel, dwell on arrival, then advance the cursor.
    pub fn patrol<R: Rng + ?Sized>(&mut self, dt: f32, position: Point3, plan: &mut PatrolPlan, rng: &mut R) -> MoveOrder {
        if let PatrolPhase::Dwelling(mut timer) = self.phase {
            if !timer.tick(dt) {
                self.phase = PatrolPhase::Dwelling(timer);
                return MoveOrder::Hold;
            }
            plan.advance(rng);
            self.phase = PatrolPhase::Travelling;
        }

        let Some(waypoint) = plan.current_waypoint() else {
            return MoveOrder::Hold;
        };
        let distance = position.flat().distance(waypoint.flat());
        if distance <= self.arrival_threshold {
            let (lo, hi) = self.dwell_range;
            self.phase = PatrolPhase::Dwelling(Countdown::new(rng.gen_range(lo..=hi)));
            return MoveOrder::Hold;
        }
        MoveOrder::MoveTo {
            destination: waypoint,
            speed: self.approach_speed(distance),
        }
    }

    /// The point `follow_offset` short of `target` along the guard→target line.
    #[must_use]
    pub fn follow_point(&self, position: Point3, target: Point3) -> Point3 {
        match (target - position).flat().normalized() {
            Some(dir) => target - dir * self.follow_offset,
            None => position,
        }
    }

    /// Keep a following distance behind `target`.
    #[must_use]
    pub fn follow(&self, position: Point3, target: Point3) -> MoveOrder {
        let destination = self.follow_point(position, target);
        let distance = position.flat().distance(destination.flat());
        if distance <= self.follow_proximity {
            return MoveOrder::Hold;
        }
        MoveOrder::MoveTo {
            destination,
            speed: self.approach_speed(distance),
        }
    }

    /// Where a target moving at `velocity` will be after the lead horizon.
    #[must_use]
    pub fn lead_point(&self, target: Point3, velocity: Option<Point3>) -> Point3 {
        velocity.map_or(target, |v| target + v.flat() * self.lead_horizon)
    }

    /// Pursue at run speed.
    #[must_use]
    pub fn chase(&self, destination: Point3) -> MoveOrder {
        MoveOrder::MoveTo {
            destination,
            speed: self.run_speed,
        }
    }

    /// Rotate `forward` toward `toward` by a rate-limited fraction of the
    /// remaining yaw. Never snaps unless `dt` is large enough.
    #[must_use]
    pub fn turn(&self, forward: Point3, toward: Point3, dt: f32) -> Point3 {
        let Some(desired) = toward.flat().normalized() else {
            return forward;
        };
        let current = forward.yaw_degrees();
        let delta = shortest_arc(desired.yaw_degrees() - current);
        let t = (self.turn_rate * dt).clamp(0.0, 1.0);
        Point3::from_yaw_degrees(current + delta * t)
    }
}

/// Wrap an angle difference into `(-180, 180]`.
fn shortest_arc(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}
