//! Core type definitions for the guard AI.
//!
//! All types are serializable so guard state can be snapshotted for saves
//! and debugging overlays.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for any entity (guard, player, NPC, thrown item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A point or direction in world space. Y is up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate (up).
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point3 {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    /// World forward (+Z).
    pub const FORWARD: Self = Self { x: 0.0, y: 0.0, z: 1.0 };
    /// World up (+Y).
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };

    /// Construct a point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len <= f32::EPSILON {
            None
        } else {
            Some(self * (1.0 / len))
        }
    }

    /// The same vector with the vertical component removed.
    #[must_use]
    pub fn flat(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Unsigned angle between two directions in degrees (0–180).
    ///
    /// Returns 0 when either vector is degenerate.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f32 {
        match (self.normalized(), other.normalized()) {
            (Some(a), Some(b)) => a.dot(b).clamp(-1.0, 1.0).acos().to_degrees(),
            _ => 0.0,
        }
    }

    /// Heading around the Y axis in degrees, measured from +Z toward +X.
    #[must_use]
    pub fn yaw_degrees(self) -> f32 {
        self.x.atan2(self.z).to_degrees()
    }

    /// Unit direction on the horizontal plane for a heading in degrees.
    #[must_use]
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        let rad = yaw.to_radians();
        Self::new(rad.sin(), 0.0, rad.cos())
    }

    /// Linear interpolation toward `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t.clamp(0.0, 1.0)
    }
}

impl Add for Point3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Point3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Point3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Position plus facing of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World position.
    pub position: Point3,
    /// Unit forward direction.
    pub forward: Point3,
}

impl Pose {
    /// Create a pose; a degenerate `forward` falls back to world forward.
    #[must_use]
    pub fn new(position: Point3, forward: Point3) -> Self {
        Self {
            position,
            forward: forward.normalized().unwrap_or(Point3::FORWARD),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

bitflags! {
    /// Collision/classification layers used to filter spatial queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerMask: u32 {
        /// The player character.
        const PLAYER = 1 << 0;
        /// Non-player characters (staff, diners).
        const NPC = 1 << 1;
        /// Walls, counters and doors; anything that blocks sight.
        const OBSTRUCTION = 1 << 2;
        /// Thrown or dropped props.
        const ITEM = 1 << 3;
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::empty()
    }
}
