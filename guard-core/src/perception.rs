//! Perception sensor: field-of-view and line-of-sight scanning.
//!
//! A scan gathers target-classified entities in a sphere around the guard,
//! then rejects any candidate that is beyond the view radius, outside
//! the half-angle cone around the guard's forward direction, or hidden
//! behind an obstruction. Candidates are tested nearest-first, so the result
//! is deterministic for a given scene.
//!
//! Scans run on a fixed polling interval; consumers read the cached
//! [`Sighting`] between polls.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clock::Countdown;
use crate::config::PerceptionConfig;
use crate::services::SpatialQuery;
use crate::types::{EntityId, LayerMask, Point3, Pose};

/// Result of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sighting {
    /// Whether a target is currently visible.
    pub visible: bool,
    /// The detected target, if any.
    pub target: Option<EntityId>,
    /// Where the target was seen.
    pub position: Option<Point3>,
}

impl Sighting {
    /// Nothing in view.
    pub const NONE: Self = Self {
        visible: false,
        target: None,
        position: None,
    };

    /// Whether this sighting is of `entity`.
    #[must_use]
    pub fn sees(&self, entity: EntityId) -> bool {
        self.visible && self.target == Some(entity)
    }
}

/// Why a candidate was rejected (used for tracing and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Farther than the view radius.
    OutOfRange,
    /// Outside the view cone.
    OutsideCone,
    /// An obstruction is closer than the candidate.
    Obstructed,
}

/// Field-of-view sensor owned by a guard.
#[derive(Debug, Clone)]
pub struct PerceptionSensor {
    view_radius: f32,
    view_angle_degrees: f32,
    eye_height: f32,
    target_mask: LayerMask,
    obstruction_mask: LayerMask,
    poll: Countdown,
    suspension: Countdown,
    latest: Sighting,
    last_known_position: Option<Point3>,
    last_known_velocity: Option<Point3>,
}

impl PerceptionSensor {
    /// Build a sensor that looks for the player through obstructions.
    #[must_use]
    pub fn new(config: &PerceptionConfig) -> Self {
        Self::with_masks(config, LayerMask::PLAYER, LayerMask::OBSTRUCTION)
    }

    /// Build a sensor with explicit classification masks.
    #[must_use]
    pub fn with_masks(config: &PerceptionConfig, target_mask: LayerMask, obstruction_mask: LayerMask) -> Self {
        Self {
            view_radius: config.view_radius,
            view_angle_degrees: config.view_angle_degrees,
            eye_height: config.eye_height,
            target_mask,
            obstruction_mask,
            // Finished so the very first tick scans immediately.
            poll: Countdown::finished(config.poll_interval_secs),
            suspension: Countdown::finished(0.0),
            latest: Sighting::NONE,
            last_known_position: None,
            last_known_velocity: None,
        }
    }

    /// Classify one candidate against the cone and line of sight.
    ///
    /// # Errors
    /// Returns the first [`Rejection`] that applies.
    pub fn evaluate<Q: SpatialQuery + ?Sized>(
        &self,
        pose: &Pose,
        candidate: Point3,
        world: &Q,
    ) -> Result<(), Rejection> {
        let lift = Point3::UP * self.eye_height;
        let eye = pose.position + lift;
        let to_target = (candidate + lift) - eye;
        let distance = to_target.length();

        if distance > self.view_radius {
            return Err(Rejection::OutOfRange);
        }
        if pose.forward.angle_to(to_target) > self.view_angle_degrees / 2.0 {
            return Err(Rejection::OutsideCone);
        }
        if let Some(direction) = to_target.normalized() {
            if let Some(hit) = world.raycast(eye, direction, distance, self.obstruction_mask) {
                if hit < distance {
                    return Err(Rejection::Obstructed);
                }
            }
        }
        Ok(())
    }

    /// Run a scan without touching the cache.
    #[must_use]
    pub fn scan<Q: SpatialQuery + ?Sized>(&self, pose: &Pose, world: &Q) -> Sighting {
        let mut candidates = world.overlap_sphere(pose.position, self.view_radius, self.target_mask);
        candidates.sort_by_key(|c| OrderedFloat(pose.position.distance(c.position)));

        for candidate in candidates {
            match self.evaluate(pose, candidate.position, world) {
                Ok(()) => {
                    return Sighting {
                        visible: true,
                        target: Some(candidate.entity),
                        position: Some(candidate.position),
                    };
                }
                Err(reason) => {
                    trace!(entity = %candidate.entity, ?reason, "Candidate rejected");
                }
            }
        }
        Sighting::NONE
    }

    /// Advance the poll timer and rescan when it elapses.
    ///
    /// Returns `true` if a scan ran this tick. While suspended the cached
    /// sighting is cleared and no scans run.
    pub fn tick<Q: SpatialQuery + ?Sized>(&mut self, dt: f32, pose: &Pose, world: &Q) -> bool {
        if !self.suspension.tick(dt) {
            self.latest = Sighting::NONE;
            return false;
        }
        if !self.poll.tick(dt) {
            return false;
        }
        self.poll.reset();
        self.force_scan(pose, world);
        true
    }

    /// Scan immediately and cache the result, ignoring the poll interval.
    pub fn force_scan<Q: SpatialQuery + ?Sized>(&mut self, pose: &Pose, world: &Q) -> Sighting {
        let sighting = self.scan(pose, world);
        if let (true, Some(target)) = (sighting.visible, sighting.target) {
            self.last_known_position = sighting.position;
            self.last_known_velocity = world.velocity_of(target);
        }
        self.latest = sighting;
        sighting
    }

    /// Stop scanning for `secs` seconds.
    pub fn suspend(&mut self, secs: f32) {
        self.suspension.restart(secs);
        self.latest = Sighting::NONE;
    }

    /// Cancel any suspension.
    pub fn resume(&mut self) {
        self.suspension = Countdown::finished(0.0);
    }

    /// Whether scans are currently suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        !self.suspension.is_finished()
    }

    /// The cached result of the last scan.
    #[must_use]
    pub fn latest(&self) -> Sighting {
        self.latest
    }

    /// Where a target was last seen; frozen while nothing is visible.
    #[must_use]
    pub fn last_known_position(&self) -> Option<Point3> {
        self.last_known_position
    }

    /// Velocity of the target at the last sighting.
    #[must_use]
    pub fn last_known_velocity(&self) -> Option<Point3> {
        self.last_known_velocity
    }

    /// Forget the last known position and velocity.
    pub fn clear_last_known(&mut self) {
        self.last_known_position = None;
        self.last_known_velocity = None;
    }

    /// View radius in world units.
    #[must_use]
    pub fn view_radius(&self) -> f32 {
        self.view_radius
    }

    /// Full cone width in degrees.
    #[must_use]
    pub fn view_angle_degrees(&self) -> f32 {
        self.view_angle_degrees
    }
}
