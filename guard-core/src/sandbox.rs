//! Headless sandbox world.
//!
//! A flat, square floor with axis-aligned box obstructions and straight-line
//! navigation. It implements [`SpatialQuery`] and [`Navigator`] so guards can
//! be driven without an engine. Tests, benchmarks and the demo binary all
//! run against it.

use std::collections::BTreeMap;

use crate::services::{Candidate, Navigator, SpatialQuery};
use crate::types::{EntityId, LayerMask, Point3};

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Build a box from any two opposite corners.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Whether a floor point lies inside the box footprint.
    #[must_use]
    pub fn covers_floor(&self, p: Point3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Entry distance of a ray (slab test), if it hits within `max_distance`.
    #[must_use]
    pub fn ray_hit(&self, origin: Point3, direction: Point3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;
        for (o, d, lo, hi) in [
            (origin.x, direction.x, self.min.x, self.max.x),
            (origin.y, direction.y, self.min.y, self.max.y),
            (origin.z, direction.z, self.min.z, self.max.z),
        ] {
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a < b { (a, b) } else { (b, a) }
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[derive(Debug, Clone)]
struct Body {
    position: Point3,
    velocity: Point3,
    layer: LayerMask,
}

#[derive(Debug, Clone)]
struct Agent {
    position: Point3,
    destination: Option<Point3>,
    speed: f32,
    stopped: bool,
}

/// Deterministic in-memory world.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    half_extent: f32,
    bodies: BTreeMap<EntityId, Body>,
    agents: BTreeMap<EntityId, Agent>,
    obstructions: Vec<Aabb>,
}

impl SandboxWorld {
    /// An empty floor spanning `[-half_extent, half_extent]` on X and Z.
    #[must_use]
    pub fn open(half_extent: f32) -> Self {
        Self {
            half_extent,
            bodies: BTreeMap::new(),
            agents: BTreeMap::new(),
            obstructions: Vec::new(),
        }
    }

    /// Add a player-classified body.
    pub fn spawn_player(&mut self, position: Point3) -> EntityId {
        self.spawn_body(position, LayerMask::PLAYER)
    }

    /// Add a body on arbitrary layers.
    pub fn spawn_body(&mut self, position: Point3, layer: LayerMask) -> EntityId {
        let id = EntityId::new();
        self.bodies.insert(
            id,
            Body {
                position,
                velocity: Point3::ZERO,
                layer,
            },
        );
        id
    }

    /// Add a navigation agent (a guard's body).
    pub fn spawn_agent(&mut self, position: Point3) -> EntityId {
        let id = EntityId::new();
        self.add_agent(id, position);
        id
    }

    /// Register a navigation agent under an existing id.
    pub fn add_agent(&mut self, id: EntityId, position: Point3) {
        self.agents.insert(
            id,
            Agent {
                position,
                destination: None,
                speed: 0.0,
                stopped: false,
            },
        );
    }

    /// Remove a body or agent.
    pub fn remove(&mut self, id: EntityId) {
        self.bodies.remove(&id);
        self.agents.remove(&id);
    }

    /// Teleport a body, recording the implied velocity over `dt`.
    pub fn move_body(&mut self, id: EntityId, position: Point3, dt: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = if dt > 0.0 {
                (position - body.position) * (1.0 / dt)
            } else {
                Point3::ZERO
            };
            body.position = position;
        }
    }

    /// Set a body's velocity directly; [`SandboxWorld::advance`] integrates it.
    pub fn set_velocity(&mut self, id: EntityId, velocity: Point3) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    /// Add a sight-blocking, unwalkable box.
    pub fn add_obstruction(&mut self, a: Point3, b: Point3) {
        self.obstructions.push(Aabb::new(a, b));
    }

    /// Whether a floor point is inside the bounds and outside every box.
    #[must_use]
    pub fn is_walkable(&self, p: Point3) -> bool {
        p.x.abs() <= self.half_extent
            && p.z.abs() <= self.half_extent
            && !self.obstructions.iter().any(|o| o.covers_floor(p))
    }

    /// Current destination of an agent.
    #[must_use]
    pub fn destination(&self, agent: EntityId) -> Option<Point3> {
        self.agents.get(&agent).and_then(|a| a.destination)
    }

    /// Current speed setting of an agent.
    #[must_use]
    pub fn speed(&self, agent: EntityId) -> Option<f32> {
        self.agents.get(&agent).map(|a| a.speed)
    }

    /// Whether an agent has been stopped.
    #[must_use]
    pub fn is_stopped(&self, agent: EntityId) -> bool {
        self.agents.get(&agent).is_some_and(|a| a.stopped)
    }

    /// Integrate body velocities and move agents toward their destinations.
    pub fn advance(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            body.position += body.velocity * dt;
        }
        for agent in self.agents.values_mut() {
            let Some(destination) = agent.destination else { continue };
            if agent.stopped {
                continue;
            }
            let to_go = destination - agent.position;
            let step = agent.speed * dt;
            if to_go.length() <= step {
                agent.position = destination;
            } else if let Some(dir) = to_go.normalized() {
                agent.position += dir * step;
            }
        }
    }
}

impl SpatialQuery for SandboxWorld {
    fn overlap_sphere(&self, origin: Point3, radius: f32, mask: LayerMask) -> Vec<Candidate> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.layer.intersects(mask) && b.position.distance(origin) <= radius)
            .map(|(id, b)| Candidate {
                entity: *id,
                position: b.position,
            })
            .collect()
    }

    fn raycast(&self, origin: Point3, direction: Point3, max_distance: f32, mask: LayerMask) -> Option<f32> {
        if !mask.contains(LayerMask::OBSTRUCTION) {
            return None;
        }
        self.obstructions
            .iter()
            .filter_map(|o| o.ray_hit(origin, direction, max_distance))
            .min_by(f32::total_cmp)
    }

    fn position_of(&self, entity: EntityId) -> Option<Point3> {
        self.bodies
            .get(&entity)
            .map(|b| b.position)
            .or_else(|| self.agents.get(&entity).map(|a| a.position))
    }

    fn velocity_of(&self, entity: EntityId) -> Option<Point3> {
        self.bodies.get(&entity).map(|b| b.velocity)
    }
}

impl Navigator for SandboxWorld {
    fn agent_position(&self, agent: EntityId) -> Option<Point3> {
        self.agents.get(&agent).map(|a| a.position)
    }

    fn set_destination(&mut self, agent: EntityId, destination: Point3) -> bool {
        if !self.is_walkable(destination) {
            return false;
        }
        match self.agents.get_mut(&agent) {
            Some(a) => {
                a.destination = Some(destination);
                true
            }
            None => false,
        }
    }

    fn path_pending(&self, _agent: EntityId) -> bool {
        false
    }

    fn remaining_distance(&self, agent: EntityId) -> f32 {
        self.agents
            .get(&agent)
            .and_then(|a| a.destination.map(|d| a.position.distance(d)))
            .unwrap_or(0.0)
    }

    fn set_speed(&mut self, agent: EntityId, speed: f32) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.speed = speed;
        }
    }

    fn stop(&mut self, agent: EntityId) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.stopped = true;
        }
    }

    fn resume(&mut self, agent: EntityId) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.stopped = false;
        }
    }

    fn sample_position(&self, point: Point3, max_distance: f32) -> Option<Point3> {
        if self.is_walkable(point) {
            return Some(point);
        }
        let clamped = Point3::new(
            point.x.clamp(-self.half_extent, self.half_extent),
            point.y,
            point.z.clamp(-self.half_extent, self.half_extent),
        );
        (clamped.distance(point) <= max_distance && self.is_walkable(clamped)).then_some(clamped)
    }
}
