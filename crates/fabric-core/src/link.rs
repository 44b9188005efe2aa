use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::JOULES_PER_LINK_UPDATE;
use crate::pattern::UnitId;

/// A weighted directed connection. Weight always stays in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub weight: f64,
}

impl Link {
    pub fn new(weight: f64) -> Self {
        Self {
            weight: clamp_weight(weight),
        }
    }

    /// Hebbian step for a co-firing pair. Returns the energy it cost.
    pub fn reinforce(&mut self, learning_rate: f64) -> f64 {
        self.weight = (self.weight + learning_rate).min(1.0);
        JOULES_PER_LINK_UPDATE
    }
}

fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

/// Outcome of one decay-and-remove pass over the link table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub decayed: usize,
    pub removed: usize,
    /// True if the pass stopped early on request.
    pub interrupted: bool,
}

/// Adjacency map from source unit to its outgoing links, at most one per
/// ordered pair. Iteration is ordered by (source, target).
#[derive(Clone, Debug, Default)]
pub struct LinkTable {
    by_source: BTreeMap<UnitId, BTreeMap<UnitId, Link>>,
    count: usize,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Create a link unless one exists. Returns true if created.
    pub fn connect(&mut self, source: UnitId, target: UnitId, weight: f64) -> bool {
        let targets = self.by_source.entry(source).or_default();
        if targets.contains_key(&target) {
            return false;
        }
        targets.insert(target, Link::new(weight));
        self.count += 1;
        true
    }

    /// Raise the link to at least `weight`, creating it if absent.
    /// Never lowers an existing weight. Returns true if anything changed.
    pub fn strengthen_to(&mut self, source: UnitId, target: UnitId, weight: f64) -> bool {
        let weight = clamp_weight(weight);
        let targets = self.by_source.entry(source).or_default();
        match targets.get_mut(&target) {
            Some(link) if link.weight >= weight => false,
            Some(link) => {
                link.weight = weight;
                true
            }
            None => {
                targets.insert(target, Link::new(weight));
                self.count += 1;
                true
            }
        }
    }

    pub fn get(&self, source: UnitId, target: UnitId) -> Option<&Link> {
        self.by_source.get(&source)?.get(&target)
    }

    pub fn weight(&self, source: UnitId, target: UnitId) -> Option<f64> {
        self.get(source, target).map(|l| l.weight)
    }

    pub fn outgoing(&self, source: UnitId) -> impl Iterator<Item = (UnitId, &Link)> {
        self.by_source
            .get(&source)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(&t, l)| (t, l)))
    }

    pub(crate) fn outgoing_mut(&mut self, source: UnitId) -> Option<&mut BTreeMap<UnitId, Link>> {
        self.by_source.get_mut(&source)
    }

    /// All links as (source, target, link).
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, UnitId, &Link)> {
        self.by_source
            .iter()
            .flat_map(|(&s, targets)| targets.iter().map(move |(&t, l)| (s, t, l)))
    }

    /// Multiply every weight by `decay` and drop links that end below
    /// `threshold`. `should_stop` is polled between source units; links of
    /// sources already visited are still removed when it fires.
    pub fn decay_and_prune(
        &mut self,
        threshold: f64,
        decay: f64,
        mut should_stop: impl FnMut() -> bool,
    ) -> PruneReport {
        let mut report = PruneReport::default();
        let mut marked: Vec<(UnitId, UnitId)> = Vec::new();

        for (&source, targets) in self.by_source.iter_mut() {
            if should_stop() {
                report.interrupted = true;
                break;
            }
            for (&target, link) in targets.iter_mut() {
                link.weight = clamp_weight(link.weight * decay);
                report.decayed += 1;
                if link.weight < threshold {
                    marked.push((source, target));
                }
            }
        }

        for (source, target) in marked {
            if let Some(targets) = self.by_source.get_mut(&source)
                && targets.remove(&target).is_some()
            {
                self.count -= 1;
                report.removed += 1;
            }
        }
        self.by_source.retain(|_, targets| !targets.is_empty());

        report
    }
}
