//! Patrol routes and the guard's position along them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GuardError, Result};
use crate::types::Point3;

/// A named, ordered loop of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    name: String,
    waypoints: Vec<Point3>,
}

impl PatrolRoute {
    /// Build a validated route.
    ///
    /// # Errors
    /// Returns `GuardError::InvalidRoute` if the route has no waypoints or a
    /// waypoint is not finite.
    pub fn new(name: impl Into<String>, waypoints: Vec<Point3>) -> Result<Self> {
        let name = name.into();
        if waypoints.is_empty() {
            return Err(GuardError::InvalidRoute {
                route: name,
                reason: "no waypoints".to_string(),
            });
        }
        if let Some(i) = waypoints
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(GuardError::InvalidRoute {
                route: name,
                reason: format!("waypoint {i} is not finite"),
            });
        }
        Ok(Self { name, waypoints })
    }

    /// Route name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waypoints in visiting order.
    #[must_use]
    pub fn waypoints(&self) -> &[Point3] {
        &self.waypoints
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always `false` for a validated route.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Where a guard is along its routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatrolCursor {
    /// Index of the active route.
    pub route_index: usize,
    /// Index of the waypoint being approached.
    pub waypoint_index: usize,
}

/// A guard's routes plus its cursor.
///
/// The cursor survives every excursion (chase, dialogue, investigation), so
/// returning to patrol resumes at the waypoint it left. A new route is drawn
/// only when the cursor wraps back to index 0.
#[derive(Debug, Clone, Default)]
pub struct PatrolPlan {
    routes: Vec<PatrolRoute>,
    cursor: PatrolCursor,
}

impl PatrolPlan {
    /// A plan starting at the first waypoint of the first route.
    #[must_use]
    pub fn new(routes: Vec<PatrolRoute>) -> Self {
        Self {
            routes,
            cursor: PatrolCursor::default(),
        }
    }

    /// A plan with no routes; the guard stands still.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.routes.is_empty()
    }

    /// Current position along the routes.
    #[must_use]
    pub fn cursor(&self) -> PatrolCursor {
        self.cursor
    }

    /// Restore a saved cursor. Out-of-range indices restart at the beginning.
    pub fn restore(&mut self, cursor: PatrolCursor) {
        let valid = self
            .routes
            .get(cursor.route_index)
            .is_some_and(|r| cursor.waypoint_index < r.len());
        self.cursor = if valid { cursor } else { PatrolCursor::default() };
    }

    /// The active route.
    #[must_use]
    pub fn route(&self) -> Option<&PatrolRoute> {
        self.routes.get(self.cursor.route_index)
    }

    /// All routes.
    #[must_use]
    pub fn routes(&self) -> &[PatrolRoute] {
        &self.routes
    }

    /// The waypoint being approached.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Point3> {
        self.route()
            .and_then(|r| r.waypoints().get(self.cursor.waypoint_index).copied())
    }

    /// Move to the next waypoint. On wraparound a route is re-drawn at
    /// random; returns `true` in that case.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let Some(len) = self.route().map(PatrolRoute::len) else {
            return false;
        };
        let next = self.cursor.waypoint_index + 1;
        if next < len {
            self.cursor.waypoint_index = next;
            return false;
        }
        self.cursor.waypoint_index = 0;
        self.cursor.route_index = rng.gen_range(0..self.routes.len());
        debug!(route = self.route().map_or("", PatrolRoute::name), "Patrol route re-rolled");
        true
    }
}
