use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable unit identifier. Assigned contiguously by `Fabric::grow`, never reused.
pub type UnitId = usize;

/// An immutable set of unit ids treated as one concept or event.
///
/// Backed by a `BTreeSet` so equality and hashing ignore insertion order
/// while iteration stays deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(BTreeSet<UnitId>);

impl Pattern {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.0.iter().copied()
    }

    pub fn is_subset(&self, other: &Pattern) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_disjoint(&self, other: &Pattern) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn union(&self, other: &Pattern) -> Pattern {
        self.0.union(&other.0).copied().collect()
    }

    /// Every unordered pair `(a, b)` with `a < b`.
    pub fn pairs(&self) -> impl Iterator<Item = (UnitId, UnitId)> + '_ {
        self.0
            .iter()
            .enumerate()
            .flat_map(move |(i, &a)| self.0.iter().skip(i + 1).map(move |&b| (a, b)))
    }
}

impl FromIterator<UnitId> for Pattern {
    fn from_iter<I: IntoIterator<Item = UnitId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeSet<UnitId>> for Pattern {
    fn from(set: BTreeSet<UnitId>) -> Self {
        Self(set)
    }
}

impl<const N: usize> From<[UnitId; N]> for Pattern {
    fn from(ids: [UnitId; N]) -> Self {
        ids.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = UnitId;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, UnitId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl IntoIterator for Pattern {
    type Item = UnitId;
    type IntoIter = std::collections::btree_set::IntoIter<UnitId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}
