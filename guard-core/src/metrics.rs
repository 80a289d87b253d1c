//! Runtime metrics and frame-budget monitoring.
//!
//! Counters are plain `AtomicU64`s bumped from the hot path and read on
//! export. The frame monitor keeps a ring buffer of recent frame timings
//! behind a `parking_lot::Mutex`, which is only contended on dashboard reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::guard::{GuardEvent, GuardState};
use crate::investigation::InvestigationOutcome;

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Event counters for every guard in a scene.
pub struct GuardCounters {
    /// Chases started (any trigger).
    pub chases_started: AtomicU64,
    /// Chases abandoned by give-up or lost target.
    pub chases_abandoned: AtomicU64,
    /// Targets caught.
    pub catches: AtomicU64,
    /// Sightings acted on.
    pub detections: AtomicU64,
    /// Investigations started.
    pub investigations_started: AtomicU64,
    /// Investigations that found the player.
    pub investigations_found: AtomicU64,
    /// Investigations that ran out of probes or time.
    pub investigations_timed_out: AtomicU64,
    /// Investigations cancelled from outside.
    pub investigations_cancelled: AtomicU64,
    /// Trust escalations.
    pub escalations: AtomicU64,
    /// Security conversations opened by the low-trust check.
    pub security_summons: AtomicU64,
}

impl GuardCounters {
    /// All counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chases_started: AtomicU64::new(0),
            chases_abandoned: AtomicU64::new(0),
            catches: AtomicU64::new(0),
            detections: AtomicU64::new(0),
            investigations_started: AtomicU64::new(0),
            investigations_found: AtomicU64::new(0),
            investigations_timed_out: AtomicU64::new(0),
            investigations_cancelled: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
            security_summons: AtomicU64::new(0),
        }
    }

    /// Bump the counters an event implies.
    pub fn record(&self, event: &GuardEvent) {
        let counter = match event {
            GuardEvent::StateChanged { to, .. } => match to {
                GuardState::Chasing => &self.chases_started,
                GuardState::Investigating => &self.investigations_started,
                _ => return,
            },
            GuardEvent::TargetSpotted { .. } => &self.detections,
            GuardEvent::ChaseAbandoned { .. } => &self.chases_abandoned,
            GuardEvent::Caught { .. } => &self.catches,
            GuardEvent::InvestigationFinished { outcome, .. } => match outcome {
                InvestigationOutcome::PlayerFound(_) => &self.investigations_found,
                InvestigationOutcome::TimedOut => &self.investigations_timed_out,
                InvestigationOutcome::Cancelled => &self.investigations_cancelled,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            chases_started: self.chases_started.load(Ordering::Relaxed),
            chases_abandoned: self.chases_abandoned.load(Ordering::Relaxed),
            catches: self.catches.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            investigations: [
                self.investigations_started.load(Ordering::Relaxed),
                self.investigations_found.load(Ordering::Relaxed),
                self.investigations_timed_out.load(Ordering::Relaxed),
                self.investigations_cancelled.load(Ordering::Relaxed),
            ],
            escalations: self.escalations.load(Ordering::Relaxed),
            security_summons: self.security_summons.load(Ordering::Relaxed),
        }
    }
}

impl Default for GuardCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Chases started.
    pub chases_started: u64,
    /// Chases abandoned.
    pub chases_abandoned: u64,
    /// Catches.
    pub catches: u64,
    /// Sightings acted on.
    pub detections: u64,
    /// Investigations `[started, found, timed_out, cancelled]`.
    pub investigations: [u64; 4],
    /// Trust escalations.
    pub escalations: u64,
    /// Low-trust security summons.
    pub security_summons: u64,
}

impl CounterSnapshot {
    /// Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP guard_chases_started_total Chases started\n\
             # TYPE guard_chases_started_total counter\n\
             guard_chases_started_total {}\n\
             # HELP guard_chases_abandoned_total Chases abandoned\n\
             # TYPE guard_chases_abandoned_total counter\n\
             guard_chases_abandoned_total {}\n\
             # HELP guard_catches_total Targets caught\n\
             # TYPE guard_catches_total counter\n\
             guard_catches_total {}\n\
             # HELP guard_detections_total Sightings acted on\n\
             # TYPE guard_detections_total counter\n\
             guard_detections_total {}\n\
             # HELP guard_investigations_total Investigations by outcome\n\
             # TYPE guard_investigations_total counter\n\
             guard_investigations_total{{outcome=\"started\"}} {}\n\
             guard_investigations_total{{outcome=\"found\"}} {}\n\
             guard_investigations_total{{outcome=\"timed_out\"}} {}\n\
             guard_investigations_total{{outcome=\"cancelled\"}} {}\n\
             # HELP guard_escalations_total Trust escalations\n\
             # TYPE guard_escalations_total counter\n\
             guard_escalations_total {}\n\
             # HELP guard_security_summons_total Low-trust security summons\n\
             # TYPE guard_security_summons_total counter\n\
             guard_security_summons_total {}\n",
            self.chases_started,
            self.chases_abandoned,
            self.catches,
            self.detections,
            self.investigations[0],
            self.investigations[1],
            self.investigations[2],
            self.investigations[3],
            self.escalations,
            self.security_summons,
        )
    }
}

// ---------------------------------------------------------------------------
// Frame Budget Monitor
// ---------------------------------------------------------------------------

const HISTORY_LEN: usize = 256;

/// Tracks how long each frame of guard updates takes.
///
/// ```rust
/// # use guard_core::metrics::FrameBudgetMonitor;
/// let monitor = FrameBudgetMonitor::new(1.0);
/// {
///     let _frame = monitor.begin_frame();
///     // tick guards
/// }
/// assert_eq!(monitor.frame_count(), 1);
/// ```
pub struct FrameBudgetMonitor {
    budget_ms: f64,
    history: Mutex<FrameHistory>,
}

struct FrameHistory {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
    last_over_budget: bool,
}

impl FrameBudgetMonitor {
    /// A monitor with a per-frame budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(FrameHistory {
                timings: vec![0.0; HISTORY_LEN],
                write_idx: 0,
                count: 0,
                last_over_budget: false,
            }),
        }
    }

    /// Start timing a frame; the timing is recorded when the guard drops.
    pub fn begin_frame(&self) -> FrameGuard<'_> {
        FrameGuard {
            monitor: self,
            start: Instant::now(),
        }
    }

    /// Record a frame timing in milliseconds.
    pub fn record(&self, ms: f64) {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % HISTORY_LEN;
        h.count += 1;
        h.last_over_budget = ms > self.budget_ms;
    }

    /// The most recent timing.
    #[must_use]
    pub fn last_frame_ms(&self) -> f64 {
        let h = self.history.lock();
        if h.count == 0 {
            return 0.0;
        }
        h.timings[(h.write_idx + HISTORY_LEN - 1) % HISTORY_LEN]
    }

    /// Whether the most recent frame overran the budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.history.lock().last_over_budget
    }

    /// Percentiles over the retained history.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn percentiles(&self) -> FramePercentiles {
        let h = self.history.lock();
        let n = usize::try_from(h.count).map_or(HISTORY_LEN, |c| c.min(HISTORY_LEN));
        if n == 0 {
            return FramePercentiles::default();
        }
        let mut sorted = h.timings[..n].to_vec();
        drop(h);
        sorted.sort_by(f64::total_cmp);

        let at = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];
        let over = sorted.iter().filter(|&&t| t > self.budget_ms).count();
        FramePercentiles {
            p50: at(0.5),
            p95: at(0.95),
            p99: at(0.99),
            max: sorted[n - 1],
            over_budget_ratio: over as f64 / n as f64,
        }
    }

    /// Frames recorded since creation.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.history.lock().count
    }

    /// Budget in milliseconds.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }
}

/// Records elapsed time into its monitor on drop.
pub struct FrameGuard<'a> {
    monitor: &'a FrameBudgetMonitor,
    start: Instant,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.monitor.record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Frame timing percentiles in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct FramePercentiles {
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
    /// Slowest frame.
    pub max: f64,
    /// Fraction of frames over budget.
    pub over_budget_ratio: f64,
}

impl FramePercentiles {
    /// One-line summary.
    #[must_use]
    pub fn summary(&self, budget_ms: f64) -> String {
        format!(
            "P50={:.3}ms  P95={:.3}ms  P99={:.3}ms  Max={:.3}ms  Budget={budget_ms:.1}ms  Over-budget={:.1}%",
            self.p50,
            self.p95,
            self.p99,
            self.max,
            self.over_budget_ratio * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Span names
// ---------------------------------------------------------------------------

/// Span names for `tracing::span!`.
pub mod spans {
    /// One scene frame.
    pub const SCENE_FRAME: &str = "guard::frame";
    /// One guard tick.
    pub const GUARD_TICK: &str = "guard::tick";
    /// Trust ledger stepping.
    pub const TRUST: &str = "guard::trust";
    /// Event routing.
    pub const EVENTS: &str = "guard::events";
}
