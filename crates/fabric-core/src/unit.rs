use std::collections::VecDeque;

use crate::constants::{FIRING_HISTORY_LEN, JOULES_PER_FIRING, WATTS_IDLE_PER_UNIT};
use crate::pattern::UnitId;

/// A leaky integrate-and-fire computational node.
///
/// Potential accumulates through [`receive`](Unit::receive) and is either
/// discharged to exactly zero on firing or decayed geometrically. Excess
/// above the threshold is discarded, not carried over.
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub zone: String,
    pub potential: f64,
    pub threshold: f64,
    pub decay: f64,
    pub energy_joules: f64,
    pub fire_count: u64,
    pub last_fired_at: Option<f64>,
    pub created_at: f64,
    history: VecDeque<f64>,
}

impl Unit {
    pub fn new(id: UnitId, zone: &str, threshold: f64, decay: f64, created_at: f64) -> Self {
        Self {
            id,
            zone: zone.to_string(),
            potential: 0.0,
            threshold,
            decay,
            energy_joules: 0.0,
            fire_count: 0,
            last_fired_at: None,
            created_at,
            history: VecDeque::with_capacity(FIRING_HISTORY_LEN),
        }
    }

    pub fn receive(&mut self, weight: f64) {
        self.potential += weight;
    }

    /// Advance one tick. Returns true if the unit fired.
    pub fn step(&mut self, now: f64) -> bool {
        if self.potential >= self.threshold {
            self.potential = 0.0;
            self.energy_joules += JOULES_PER_FIRING;
            self.fire_count += 1;
            self.last_fired_at = Some(now);
            if self.history.len() == FIRING_HISTORY_LEN {
                self.history.pop_front();
            }
            self.history.push_back(now);
            true
        } else {
            self.potential *= self.decay;
            false
        }
    }

    /// Times of the most recent firings, oldest first.
    pub fn firing_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Lifetime average power of this unit plus its idle draw.
    pub fn estimated_watts(&self, now: f64) -> f64 {
        let elapsed = now - self.created_at;
        if elapsed <= 0.0 {
            return WATTS_IDLE_PER_UNIT;
        }
        self.energy_joules / elapsed + WATTS_IDLE_PER_UNIT
    }
}
