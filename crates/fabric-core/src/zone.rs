//! Zones partition the unit id space by functional role ("vision",
//! "language", ...). A zone is a bag of ids, not an owner of units.

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use rand::Rng;
use rand::seq::index;

use crate::error::{FabricError, Result};
use crate::pattern::{Pattern, UnitId};

#[derive(Clone, Debug, Default)]
pub struct ZoneMap {
    zones: BTreeMap<String, Vec<UnitId>>,
}

impl ZoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, zone: &str, ids: Range<UnitId>) {
        self.zones.entry(zone.to_string()).or_default().extend(ids);
    }

    pub fn units(&self, zone: &str) -> Option<&[UnitId]> {
        self.zones.get(zone).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Draw `size` distinct ids from the zone, skipping any in `used`.
    ///
    /// The draw depends only on the free ids and the rng state, so a seeded
    /// rng gives a reproducible pattern.
    pub fn draw_free<R: Rng + ?Sized>(
        &self,
        zone: &str,
        size: usize,
        used: &HashSet<UnitId>,
        rng: &mut R,
    ) -> Result<Pattern> {
        let members = self
            .units(zone)
            .ok_or_else(|| FabricError::UnknownZone(zone.to_string()))?;

        let free: Vec<UnitId> = members
            .iter()
            .copied()
            .filter(|id| !used.contains(id))
            .collect();

        if free.len() < size {
            return Err(FabricError::ZoneExhausted {
                zone: zone.to_string(),
                requested: size,
                available: free.len(),
            });
        }

        Ok(index::sample(rng, free.len(), size)
            .into_iter()
            .map(|i| free[i])
            .collect())
    }
}
