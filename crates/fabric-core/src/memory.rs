//! Memory consolidation on top of the fabric.
//!
//! Patterns move through `unseen → observed(count) → consolidated →
//! rehearsed by dreaming → links decayed`. The controller never stores
//! content itself: consolidation, recall, dreaming and pruning all act on
//! the fabric's link table and unit potentials. The consolidated set is
//! only a record of which patterns were promoted, kept for dreaming and
//! diagnostics; forgetting removes links, never entries of that record.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::config::MemoryConfig;
use crate::error::Result;
use crate::fabric::Fabric;
use crate::link::PruneReport;
use crate::pattern::Pattern;
use crate::snapshot::MemorySnapshot;
use crate::symbols::SymbolLookup;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Distinct patterns that met the threshold.
    pub salient: usize,
    /// Salient patterns not previously in the consolidated set.
    pub newly_consolidated: usize,
    /// Directed links created or raised.
    pub links_strengthened: usize,
    /// Stopped early; the short-term buffer was left in place.
    pub interrupted: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaintenanceReport {
    pub consolidation: ConsolidationReport,
    pub dreamed: Option<Pattern>,
    pub prune: PruneReport,
}

pub struct MemoryController<R = SmallRng> {
    fabric: Arc<Fabric>,
    config: MemoryConfig,
    short_term: Mutex<VecDeque<Pattern>>,
    consolidated: RwLock<Vec<Pattern>>,
    rng: Mutex<R>,
}

impl MemoryController<SmallRng> {
    /// Controller with an OS-seeded rng for dream selection.
    pub fn new(fabric: Arc<Fabric>, config: MemoryConfig) -> Result<Self> {
        Self::with_rng(fabric, config, SmallRng::from_os_rng())
    }

    pub fn seeded(fabric: Arc<Fabric>, config: MemoryConfig, seed: u64) -> Result<Self> {
        Self::with_rng(fabric, config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MemoryController<R> {
    pub fn with_rng(fabric: Arc<Fabric>, config: MemoryConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            short_term: Mutex::new(VecDeque::with_capacity(config.short_term_capacity)),
            consolidated: RwLock::new(Vec::new()),
            rng: Mutex::new(rng),
            fabric,
            config,
        })
    }

    pub fn fabric(&self) -> &Arc<Fabric> {
        &self.fabric
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Record a fired set in short-term memory. Patterns below the minimum
    /// size are dropped. Returns true if the pattern was kept.
    pub fn observe(&self, pattern: Pattern) -> bool {
        if pattern.len() < self.config.min_pattern_size {
            return false;
        }
        let mut buffer = self.short_term.lock();
        if buffer.len() == self.config.short_term_capacity {
            buffer.pop_front();
        }
        buffer.push_back(pattern);
        true
    }

    pub fn short_term_len(&self) -> usize {
        self.short_term.lock().len()
    }

    pub fn consolidate(&self) -> ConsolidationReport {
        self.consolidate_with(&CancelToken::new())
    }

    /// Promote every pattern seen at least `consolidation_threshold` times
    /// in the short-term buffer: each pair of its units gets links in both
    /// directions raised to `consolidation_weight`. The buffer is cleared
    /// afterwards whether or not anything was salient.
    pub fn consolidate_with(&self, cancel: &CancelToken) -> ConsolidationReport {
        let mut report = ConsolidationReport::default();
        let mut buffer = self.short_term.lock();
        if buffer.is_empty() {
            return report;
        }

        let mut counts: HashMap<&Pattern, usize> = HashMap::new();
        let mut order: Vec<&Pattern> = Vec::new();
        for pattern in buffer.iter() {
            let count = counts.entry(pattern).or_insert(0);
            if *count == 0 {
                order.push(pattern);
            }
            *count += 1;
        }
        let salient: Vec<Pattern> = order
            .into_iter()
            .filter(|p| counts[*p] >= self.config.consolidation_threshold)
            .cloned()
            .collect();
        report.salient = salient.len();

        if !salient.is_empty() {
            info!("found {} salient patterns to consolidate", salient.len());
        }

        let weight = self.config.consolidation_weight;
        for pattern in &salient {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }

            let mut strengthened = 0;
            {
                let mut pass = self.fabric.link_pass();
                for (a, b) in pattern.pairs() {
                    if !pass.exists(a) || !pass.exists(b) {
                        continue;
                    }
                    strengthened += usize::from(pass.links.strengthen_to(a, b, weight));
                    strengthened += usize::from(pass.links.strengthen_to(b, a, weight));
                }
            }
            report.links_strengthened += strengthened;

            let mut consolidated = self.consolidated.write();
            if !consolidated.contains(pattern) {
                consolidated.push(pattern.clone());
                report.newly_consolidated += 1;
            }
            debug!(
                "consolidated pattern of size {} ({strengthened} links raised)",
                pattern.len()
            );
        }

        if !report.interrupted {
            buffer.clear();
        }
        report
    }

    /// Pattern completion: push `strength` into every unit the cue reaches
    /// over a strong link. Does not step the fabric.
    pub fn recall(&self, cue: &Pattern, strength: f64) -> Pattern {
        if cue.is_empty() {
            return Pattern::new();
        }

        let threshold = self.config.strong_link_threshold;
        let pass = self.fabric.link_pass();
        let mut excited = Vec::new();
        for source in cue.iter() {
            for (target, link) in pass.links.outgoing(source) {
                if link.weight > threshold && pass.receive(target, strength) {
                    excited.push(target);
                }
            }
        }
        drop(pass);

        let excited: Pattern = excited.into_iter().collect();
        debug!(
            "recall cue of size {} excited {} units",
            cue.len(),
            excited.len()
        );
        excited
    }

    /// [`recall`](Self::recall) at the configured strength.
    pub fn recall_default(&self, cue: &Pattern) -> Pattern {
        self.recall(cue, self.config.recall_strength)
    }

    /// Replay one consolidated pattern, picked at random, at dream
    /// strength. The next `Fabric::step` does the reinforcing.
    pub fn dream(&self) -> Option<Pattern> {
        let pattern = {
            let consolidated = self.consolidated.read();
            let mut rng = self.rng.lock();
            consolidated.choose(&mut *rng).cloned()
        }?;

        debug!("dreaming: replaying a memory of size {}", pattern.len());
        self.fabric.activate(&pattern, self.config.dream_strength);
        Some(pattern)
    }

    pub fn prune(&self, threshold: f64, decay: f64) -> PruneReport {
        self.prune_with(threshold, decay, &CancelToken::new())
    }

    /// Forgetting: decay every link weight and remove those that fall
    /// below `threshold`.
    pub fn prune_with(&self, threshold: f64, decay: f64, cancel: &CancelToken) -> PruneReport {
        let mut pass = self.fabric.link_pass();
        let report = pass
            .links
            .decay_and_prune(threshold, decay, || cancel.is_cancelled());
        drop(pass);

        if report.removed > 0 {
            info!("pruned {} weak links", report.removed);
        }
        report
    }

    /// One slow-cadence maintenance cycle: consolidate, dream, prune with
    /// the configured parameters. Stops between phases once cancelled.
    pub fn maintain(&self, cancel: &CancelToken) -> MaintenanceReport {
        let mut report = MaintenanceReport {
            consolidation: self.consolidate_with(cancel),
            ..MaintenanceReport::default()
        };
        if cancel.is_cancelled() {
            return report;
        }
        report.dreamed = self.dream();
        report.prune = self.prune_with(
            self.config.prune_threshold,
            self.config.prune_decay,
            cancel,
        );
        report
    }

    pub fn consolidated_count(&self) -> usize {
        self.consolidated.read().len()
    }

    pub fn consolidated(&self) -> Vec<Pattern> {
        self.consolidated.read().clone()
    }

    pub fn is_consolidated(&self, pattern: &Pattern) -> bool {
        self.consolidated.read().contains(pattern)
    }

    /// Human-readable labels for the consolidated set, in promotion order.
    pub fn describe(&self, lookup: &dyn SymbolLookup) -> Vec<String> {
        self.consolidated
            .read()
            .iter()
            .map(|p| {
                lookup
                    .symbol_for(p)
                    .unwrap_or_else(|| format!("<unlabeled pattern of {} units>", p.len()))
            })
            .collect()
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            consolidated: self.consolidated(),
        }
    }

    /// Replace the consolidated record with a saved one, dropping duplicates.
    pub fn restore(&self, snapshot: MemorySnapshot) {
        let mut consolidated = self.consolidated.write();
        consolidated.clear();
        for pattern in snapshot.consolidated {
            if !consolidated.contains(&pattern) {
                consolidated.push(pattern);
            }
        }
    }
}
