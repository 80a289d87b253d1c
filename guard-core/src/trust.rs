//! Trust ledger: a bounded relationship score adjusted one unit at a time.
//!
//! An adjustment never jumps. [`TrustLedger::adjust`] records a target and
//! [`TrustLedger::tick`] walks toward it at a fixed cadence, pushing every
//! intermediate value to the display gauge. Stepping lets an in-flight
//! decrease be interrupted the moment it reaches the alert threshold while a
//! conversation is open.
//!
//! ```text
//!   adjust(-20)          tick          tick          tick
//!   100 ─────────────▶   99   ──▶      98   ──▶  …   85  ⇒  Escalation, stop
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TrustConfig;
use crate::services::TrustGauge;
use crate::types::EntityId;

/// Fired when a decreasing step lands at or below the alert threshold while
/// a dialogue session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    /// The NPC whose ledger escalated.
    pub owner: EntityId,
    /// Trust value at the moment of escalation.
    pub trust: i32,
}

#[derive(Debug, Clone, Copy)]
struct PendingAdjustment {
    target: i32,
    until_next_step: f32,
}

/// Per-NPC trust score in `[0, max]`.
#[derive(Debug, Clone)]
pub struct TrustLedger {
    owner: EntityId,
    current: i32,
    max: i32,
    alert_threshold_fraction: f32,
    step_interval: f32,
    last_delta: i32,
    pending: Option<PendingAdjustment>,
}

impl TrustLedger {
    /// A ledger at full trust.
    #[must_use]
    pub fn new(owner: EntityId, config: &TrustConfig) -> Self {
        Self::with_max(owner, config.max_trust, config)
    }

    /// A ledger at full trust with a per-NPC maximum.
    #[must_use]
    pub fn with_max(owner: EntityId, max: i32, config: &TrustConfig) -> Self {
        let max = max.max(0);
        Self {
            owner,
            current: max,
            max,
            alert_threshold_fraction: config.alert_threshold_fraction,
            step_interval: config.step_interval_secs,
            last_delta: 0,
            pending: None,
        }
    }

    /// Push the bounds and current value to a gauge.
    pub fn attach<G: TrustGauge + ?Sized>(&self, gauge: &mut G) {
        gauge.set_max_trust(self.owner, self.max);
        gauge.set_trust(self.owner, self.current);
    }

    /// Request a change of `delta`. Zero is a no-op.
    ///
    /// Calling again while an adjustment is in flight folds the new delta
    /// into the outstanding target. An escalation drops the pending
    /// adjustment, so each call escalates at most once.
    pub fn adjust(&mut self, delta: i32) {
        if delta == 0 {
            return;
        }
        self.last_delta = delta;
        let base = self.pending.map_or(self.current, |p| p.target);
        let target = base.saturating_add(delta).clamp(0, self.max);
        let until_next_step = self.pending.map_or(0.0, |p| p.until_next_step);
        debug!(owner = %self.owner, delta, from = self.current, target, "Trust adjustment requested");
        self.pending = Some(PendingAdjustment { target, until_next_step });
    }

    /// Advance the stepping by `dt` seconds.
    ///
    /// Every unit step updates `gauge`. Returns the escalation if one fired;
    /// the rest of the adjustment is then abandoned.
    pub fn tick<G: TrustGauge + ?Sized>(&mut self, dt: f32, dialogue_open: bool, gauge: &mut G) -> Option<Escalation> {
        let mut pending = self.pending?;
        pending.until_next_step -= dt.max(0.0);

        while pending.until_next_step <= 0.0 && self.current != pending.target {
            let decreasing = pending.target < self.current;
            self.current += if decreasing { -1 } else { 1 };
            pending.until_next_step += self.step_interval;
            gauge.set_trust(self.owner, self.current);

            if decreasing && dialogue_open && self.is_low_trust() {
                info!(owner = %self.owner, trust = self.current, "Trust escalation");
                self.pending = None;
                return Some(Escalation {
                    owner: self.owner,
                    trust: self.current,
                });
            }
        }

        self.pending = (self.current != pending.target).then_some(pending);
        None
    }

    /// Whether the current value is at or below the alert threshold.
    #[must_use]
    pub fn is_low_trust(&self) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let threshold = self.max as f32 * self.alert_threshold_fraction;
        #[allow(clippy::cast_precision_loss)]
        let current = self.current as f32;
        current <= threshold
    }

    /// Whether no adjustment is in flight.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_none()
    }

    /// The most recently requested delta (unclamped).
    #[must_use]
    pub fn last_delta(&self) -> i32 {
        self.last_delta
    }

    /// Current trust.
    #[must_use]
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// The NPC this ledger belongs to.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingGauge {
        max: Option<i32>,
        values: Vec<i32>,
    }

    impl TrustGauge for RecordingGauge {
        fn set_max_trust(&mut self, _owner: EntityId, max: i32) {
            self.max = Some(max);
        }
        fn set_trust(&mut self, _owner: EntityId, value: i32) {
            self.values.push(value);
        }
    }

    fn ledger() -> TrustLedger {
        TrustLedger::new(EntityId::new(), &TrustConfig::default())
    }

    fn settle(ledger: &mut TrustLedger, dialogue_open: bool, gauge: &mut RecordingGauge) -> Vec<Escalation> {
        let mut fired = Vec::new();
        for _ in 0..10_000 {
            if ledger.is_settled() {
                break;
            }
            fired.extend(ledger.tick(0.1, dialogue_open, gauge));
        }
        fired
    }

    #[test]
    fn steps_one_unit_per_interval() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-3);

        assert!(ledger.tick(0.0, false, &mut gauge).is_none());
        assert_eq!(ledger.current(), 99, "first step is immediate");
        ledger.tick(0.05, false, &mut gauge);
        assert_eq!(ledger.current(), 99);
        ledger.tick(0.05, false, &mut gauge);
        assert_eq!(ledger.current(), 98);
        ledger.tick(0.1, false, &mut gauge);
        assert_eq!(ledger.current(), 97);
        assert!(ledger.is_settled());
        assert_eq!(gauge.values, vec![99, 98, 97]);
    }

    #[test]
    fn large_delta_time_runs_several_steps() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-5);
        ledger.tick(0.45, false, &mut gauge);
        assert_eq!(ledger.current(), 95);
        assert_eq!(gauge.values.len(), 5);
    }

    #[test]
    fn settles_clamped_and_remembers_raw_delta() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(25);
        settle(&mut ledger, false, &mut gauge);
        assert_eq!(ledger.current(), 100);
        assert_eq!(ledger.last_delta(), 25);

        ledger.adjust(-250);
        settle(&mut ledger, false, &mut gauge);
        assert_eq!(ledger.current(), 0);
        assert_eq!(ledger.last_delta(), -250);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut ledger = ledger();
        ledger.adjust(-4);
        ledger.adjust(0);
        assert_eq!(ledger.last_delta(), -4);
        assert!(!ledger.is_settled());
    }

    #[test]
    fn escalates_once_at_threshold_during_dialogue() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-30);

        let fired = settle(&mut ledger, true, &mut gauge);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].trust, 85);
        assert_eq!(ledger.current(), 85, "remaining steps are abandoned");
        assert!(ledger.is_settled());
    }

    #[test]
    fn each_adjustment_escalates_on_its_own() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-30);
        assert_eq!(settle(&mut ledger, true, &mut gauge).len(), 1);
        assert!(ledger.tick(1.0, true, &mut gauge).is_none(), "nothing left to step");

        ledger.adjust(-3);
        let fired = settle(&mut ledger, true, &mut gauge);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].trust, 84);
        assert_eq!(ledger.current(), 84);
    }

    #[test]
    fn no_escalation_outside_dialogue() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-30);
        assert!(settle(&mut ledger, false, &mut gauge).is_empty());
        assert_eq!(ledger.current(), 70);
        assert!(ledger.is_low_trust());
    }

    #[test]
    fn increases_never_escalate() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-50);
        settle(&mut ledger, false, &mut gauge);

        ledger.adjust(10);
        assert!(settle(&mut ledger, true, &mut gauge).is_empty());
        assert_eq!(ledger.current(), 60);
    }

    #[test]
    fn overlapping_adjustments_accumulate() {
        let mut ledger = ledger();
        let mut gauge = RecordingGauge::default();
        ledger.adjust(-5);
        ledger.tick(0.0, false, &mut gauge);
        ledger.adjust(-5);
        settle(&mut ledger, false, &mut gauge);
        assert_eq!(ledger.current(), 90);
    }

    #[test]
    fn attach_publishes_bounds() {
        let ledger = TrustLedger::with_max(EntityId::new(), 40, &TrustConfig::default());
        let mut gauge = RecordingGauge::default();
        ledger.attach(&mut gauge);
        assert_eq!(gauge.max, Some(40));
        assert_eq!(gauge.values, vec![40]);
    }
}
