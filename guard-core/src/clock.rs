//! Simulation time: global pause / time scale and countdown timers.
//!
//! Every wait in the guard AI is a [`Countdown`] advanced by the scaled frame
//! delta produced by [`SimClock`]. Pausing yields a zero delta, which freezes
//! all timers without resetting them.

use serde::{Deserialize, Serialize};

/// Global simulation clock with pause and time-scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    scale: f32,
    paused: bool,
    elapsed: f64,
}

impl SimClock {
    /// A running clock at normal speed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            paused: false,
            elapsed: 0.0,
        }
    }

    /// Convert a raw frame delta into scaled simulation seconds and advance
    /// the elapsed total. Returns `0.0` while paused.
    pub fn advance(&mut self, raw_dt: f32) -> f32 {
        if self.paused || raw_dt <= 0.0 {
            return 0.0;
        }
        let dt = raw_dt * self.scale;
        self.elapsed += f64::from(dt);
        dt
    }

    /// Freeze or unfreeze the simulation.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether the simulation is frozen.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the time scale (negative values are treated as zero).
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.max(0.0);
    }

    /// Current time scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Total scaled simulation seconds elapsed.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A restartable countdown measured in simulation seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
}

impl Countdown {
    /// A countdown starting full.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            duration,
            remaining: duration,
        }
    }

    /// A countdown that is already finished.
    #[must_use]
    pub fn finished(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
        }
    }

    /// Advance by `dt`; returns `true` once the countdown has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.is_finished()
    }

    /// Refill to the full duration.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }

    /// Refill with a new duration.
    pub fn restart(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
        self.remaining = self.duration;
    }

    /// Whether the countdown has run out.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Seconds left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Configured duration.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}
