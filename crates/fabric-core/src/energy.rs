//! Energy accounting and the power-budget governor.
//!
//! Joules are accumulated as work happens and folded into a rolling
//! exponential average of watts once enough clock time has passed.

use std::fmt;

use crate::constants::WATTS_IDLE_PER_UNIT;

/// Recoverable signal: the rolling average power is over budget.
///
/// The step that produced it is not rolled back; callers are expected to
/// throttle (sleep, skip a tick) rather than treat state as corrupt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BudgetExceeded {
    pub average_watts: f64,
    pub budget_watts: f64,
}

impl fmt::Display for BudgetExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rolling average power {:.4e}W exceeds budget {:.4e}W",
            self.average_watts, self.budget_watts
        )
    }
}

#[derive(Clone, Debug)]
pub struct PowerMeter {
    average_watts: f64,
    last_update: f64,
    pending_joules: f64,
    smoothing: f64,
    min_interval: f64,
}

impl PowerMeter {
    pub fn new(now: f64, smoothing: f64, min_interval: f64) -> Self {
        Self {
            average_watts: 0.0,
            last_update: now,
            pending_joules: 0.0,
            smoothing,
            min_interval,
        }
    }

    pub fn record(&mut self, joules: f64) {
        self.pending_joules += joules;
    }

    pub fn pending_joules(&self) -> f64 {
        self.pending_joules
    }

    /// Fold pending joules into the average. Intervals shorter than the
    /// minimum leave the joules pending for the next update.
    /// Returns true if the average moved.
    pub fn update(&mut self, now: f64, unit_count: usize) -> bool {
        let elapsed = now - self.last_update;
        if elapsed <= 0.0 || elapsed < self.min_interval {
            return false;
        }

        let idle_watts = unit_count as f64 * WATTS_IDLE_PER_UNIT;
        let active_watts = self.pending_joules / elapsed;
        let sample = idle_watts + active_watts;

        self.average_watts = (1.0 - self.smoothing) * self.average_watts + self.smoothing * sample;
        self.pending_joules = 0.0;
        self.last_update = now;
        true
    }

    pub fn average_watts(&self) -> f64 {
        self.average_watts
    }

    pub fn check(&self, budget_watts: f64) -> Option<BudgetExceeded> {
        (self.average_watts > budget_watts).then_some(BudgetExceeded {
            average_watts: self.average_watts,
            budget_watts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_short_interval_keeps_joules_pending() {
        let mut meter = PowerMeter::new(0.0, 0.05, 0.1);
        meter.record(1e-9);
        assert!(!meter.update(0.05, 10));
        assert_eq!(meter.average_watts(), 0.0);
        assert_eq!(meter.pending_joules(), 1e-9);
    }

    #[test]
    fn test_update_blends_idle_and_active() {
        let mut meter = PowerMeter::new(0.0, 0.05, 0.1);
        meter.record(2e-9);
        assert!(meter.update(1.0, 100));
        let sample = 100.0 * WATTS_IDLE_PER_UNIT + 2e-9;
        assert_relative_eq!(meter.average_watts(), 0.05 * sample, epsilon = 1e-15);
        assert_eq!(meter.pending_joules(), 0.0);

        assert!(meter.update(2.0, 100));
        let idle = 100.0 * WATTS_IDLE_PER_UNIT;
        assert_relative_eq!(meter.average_watts(), 0.95 * 0.05 * sample + 0.05 * idle);
    }

    #[test]
    fn test_zero_interval_is_ignored() {
        let mut meter = PowerMeter::new(5.0, 0.05, 0.0);
        meter.record(1.0);
        assert!(!meter.update(5.0, 1));
        assert!(meter.average_watts().is_finite());
    }

    #[test]
    fn test_check_budget() {
        let mut meter = PowerMeter::new(0.0, 1.0, 0.0);
        meter.record(1.0);
        meter.update(1.0, 0);
        assert!(meter.check(2.0).is_none());
        let exceeded = meter.check(0.5).unwrap();
        assert_relative_eq!(exceeded.average_watts, 1.0);
        assert_eq!(exceeded.budget_watts, 0.5);
        assert!(exceeded.to_string().contains("exceeds budget"));
    }
}
