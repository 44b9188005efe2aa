//! The fabric: owner of units, links, zones and the symbol table, and the
//! stepped simulation loop with its power governor.
//!
//! All operations take `&self`. The link table sits behind one exclusive
//! lock that every read-modify-write pass holds for its whole duration;
//! each unit has its own lock so activation from collaborator threads only
//! contends on the ids it touches. Locks are always taken in the order
//! units vector → link table → single unit → governor.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard};
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::clock::{Clock, SystemClock, now_unix_secs};
use crate::config::FabricConfig;
use crate::constants::JOULES_PER_FIRING;
use crate::energy::{BudgetExceeded, PowerMeter};
use crate::error::{FabricError, Result};
use crate::link::LinkTable;
use crate::pattern::{Pattern, UnitId};
use crate::snapshot::{FabricSnapshot, LinkRecord, SNAPSHOT_VERSION, UnitRecord};
use crate::symbols::{SymbolLookup, SymbolTable};
use crate::unit::Unit;
use crate::zone::ZoneMap;

/// Result of [`Fabric::connect`]. Unknown ids are tolerated, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connect {
    Created,
    AlreadyLinked,
    UnknownUnit,
}

/// What one tick produced.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct StepOutcome {
    pub fired: Pattern,
    /// Set when the rolling average power is over budget after this step.
    /// The step's effects stand either way.
    pub budget_exceeded: Option<BudgetExceeded>,
}

impl StepOutcome {
    pub fn is_over_budget(&self) -> bool {
        self.budget_exceeded.is_some()
    }
}

#[derive(Debug)]
struct Governor {
    meter: PowerMeter,
    budget_watts: f64,
}

/// Units and links locked together for one pass over the link table.
pub(crate) struct LinkPass<'a> {
    units: RwLockReadGuard<'a, Vec<Mutex<Unit>>>,
    pub(crate) links: MutexGuard<'a, LinkTable>,
}

impl LinkPass<'_> {
    pub(crate) fn exists(&self, id: UnitId) -> bool {
        id < self.units.len()
    }

    /// Push potential into a unit. False if the id does not exist.
    pub(crate) fn receive(&self, id: UnitId, weight: f64) -> bool {
        match self.units.get(id) {
            Some(cell) => {
                cell.lock().receive(weight);
                true
            }
            None => false,
        }
    }
}

pub struct Fabric {
    config: FabricConfig,
    clock: Arc<dyn Clock>,
    units: RwLock<Vec<Mutex<Unit>>>,
    zones: RwLock<ZoneMap>,
    links: Mutex<LinkTable>,
    symbols: RwLock<SymbolTable>,
    governor: Mutex<Governor>,
}

impl Fabric {
    pub fn new(config: FabricConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: FabricConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let meter = PowerMeter::new(
            clock.now(),
            config.power_smoothing,
            config.min_power_interval_secs,
        );
        Ok(Self {
            governor: Mutex::new(Governor {
                meter,
                budget_watts: config.power_budget_watts,
            }),
            config,
            clock,
            units: RwLock::new(Vec::new()),
            zones: RwLock::new(ZoneMap::new()),
            links: Mutex::new(LinkTable::new()),
            symbols: RwLock::new(SymbolTable::new()),
        })
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub(crate) fn link_pass(&self) -> LinkPass<'_> {
        let units = self.units.read();
        let links = self.links.lock();
        LinkPass { units, links }
    }

    // --- Growth and wiring ---

    /// Allocate `count` units with contiguous ids in `zone`.
    pub fn grow(&self, count: usize, zone: &str) -> Result<Range<UnitId>> {
        let mut units = self.units.write();
        let current = units.len();
        if count > self.config.max_units.saturating_sub(current) {
            return Err(FabricError::CapacityExceeded {
                requested: count,
                current,
                max: self.config.max_units,
            });
        }

        let now = self.clock.now();
        let ids = current..current + count;
        units.extend(ids.clone().map(|id| {
            Mutex::new(Unit::new(
                id,
                zone,
                self.config.unit_threshold,
                self.config.unit_decay,
                now,
            ))
        }));
        self.zones.write().extend(zone, ids.clone());

        info!("added {count} units to zone '{zone}', total {}", units.len());
        Ok(ids)
    }

    /// Create a link unless one already exists for the ordered pair.
    pub fn connect(&self, source: UnitId, target: UnitId, weight: f64) -> Connect {
        let mut pass = self.link_pass();
        if !pass.exists(source) || !pass.exists(target) {
            return Connect::UnknownUnit;
        }
        if pass.links.connect(source, target, weight) {
            Connect::Created
        } else {
            Connect::AlreadyLinked
        }
    }

    /// [`connect`](Self::connect) with the configured default weight.
    pub fn connect_default(&self, source: UnitId, target: UnitId) -> Connect {
        self.connect(source, target, self.config.default_link_weight)
    }

    /// Inject `strength` into every existing unit in `ids`. Unknown ids are
    /// skipped. Returns the number of units touched.
    pub fn activate(&self, ids: impl IntoIterator<Item = UnitId>, strength: f64) -> usize {
        let units = self.units.read();
        let mut touched = 0;
        for id in ids {
            if let Some(cell) = units.get(id) {
                cell.lock().receive(strength);
                touched += 1;
            }
        }
        touched
    }

    // --- Symbols ---

    /// Bind (or rebind) a symbol. Every id must already exist.
    pub fn bind(&self, symbol: &str, ids: impl IntoIterator<Item = UnitId>) -> Result<()> {
        let pattern: Pattern = ids.into_iter().collect();
        let count = self.unit_count();
        if let Some(unit) = pattern.iter().find(|&id| id >= count) {
            return Err(FabricError::UnknownUnit {
                symbol: symbol.to_string(),
                unit,
            });
        }

        debug!("bound symbol '{symbol}' to {} units", pattern.len());
        self.symbols.write().bind(symbol, pattern);
        Ok(())
    }

    /// Pattern bound to `symbol`, or an empty pattern.
    pub fn recall(&self, symbol: &str) -> Pattern {
        self.symbols.read().recall(symbol).cloned().unwrap_or_default()
    }

    /// Draw `size` ids of `zone` that no bound symbol uses yet.
    pub fn draw_free_pattern<R: Rng + ?Sized>(
        &self,
        zone: &str,
        size: usize,
        rng: &mut R,
    ) -> Result<Pattern> {
        let used = self.symbols.read().used_ids();
        self.zones.read().draw_free(zone, size, &used, rng)
    }

    /// Draw a fresh pattern from the zone's free pool and bind it.
    ///
    /// The symbol table stays write-locked across draw and bind so two
    /// concurrent minters never receive overlapping ids.
    pub fn mint_symbol<R: Rng + ?Sized>(
        &self,
        symbol: &str,
        zone: &str,
        size: usize,
        rng: &mut R,
    ) -> Result<Pattern> {
        let mut symbols = self.symbols.write();
        let used = symbols.used_ids();
        let pattern = self.zones.read().draw_free(zone, size, &used, rng)?;
        symbols.bind(symbol, pattern.clone());
        debug!("minted symbol '{symbol}' in zone '{zone}' with {size} units");
        Ok(pattern)
    }

    /// Bound symbol keys, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.symbols
            .read()
            .iter()
            .map(|(k, _)| k.to_string())
            .collect()
    }

    // --- Simulation ---

    /// One tick: integrate and fire, propagate along outgoing links of fired
    /// units with Hebbian reinforcement of co-firing pairs, then update the
    /// power average and check it against the budget.
    pub fn step(&self) -> StepOutcome {
        let now = self.clock.now();
        let pass = self.link_pass();

        let mut fired = BTreeSet::new();
        for cell in pass.units.iter() {
            let mut unit = cell.lock();
            if unit.step(now) {
                fired.insert(unit.id);
            }
        }

        let mut joules = fired.len() as f64 * JOULES_PER_FIRING;
        let LinkPass { units, mut links } = pass;
        for &source in &fired {
            let Some(targets) = links.outgoing_mut(source) else {
                continue;
            };
            for (&target, link) in targets.iter_mut() {
                if let Some(cell) = units.get(target) {
                    cell.lock().receive(link.weight);
                }
                if fired.contains(&target) {
                    joules += link.reinforce(self.config.learning_rate);
                }
            }
        }
        drop(links);
        let unit_count = units.len();
        drop(units);

        let budget_exceeded = {
            let mut governor = self.governor.lock();
            governor.meter.record(joules);
            governor.meter.update(now, unit_count);
            governor.meter.check(governor.budget_watts)
        };
        if let Some(exceeded) = &budget_exceeded {
            warn!("power budget exceeded: {exceeded}");
        }
        trace!("step fired {} units", fired.len());

        StepOutcome {
            fired: Pattern::from(fired),
            budget_exceeded,
        }
    }

    /// Rolling average power estimate in watts.
    pub fn estimated_watts(&self) -> f64 {
        self.governor.lock().meter.average_watts()
    }

    pub fn power_budget(&self) -> f64 {
        self.governor.lock().budget_watts
    }

    /// Change the budget at runtime, e.g. when a caller throttles.
    pub fn set_power_budget(&self, watts: f64) {
        self.governor.lock().budget_watts = watts;
    }

    // --- Queries ---

    pub fn unit_count(&self) -> usize {
        self.units.read().len()
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().len()
    }

    pub fn link_weight(&self, source: UnitId, target: UnitId) -> Option<f64> {
        self.links.lock().weight(source, target)
    }

    /// Outgoing links of `source` as (target, weight).
    pub fn outgoing(&self, source: UnitId) -> Vec<(UnitId, f64)> {
        self.links
            .lock()
            .outgoing(source)
            .map(|(t, l)| (t, l.weight))
            .collect()
    }

    pub fn potential(&self, id: UnitId) -> Option<f64> {
        self.units.read().get(id).map(|cell| cell.lock().potential)
    }

    /// Copy of a unit's current state.
    pub fn unit(&self, id: UnitId) -> Option<Unit> {
        self.units.read().get(id).map(|cell| cell.lock().clone())
    }

    pub fn zone_of(&self, id: UnitId) -> Option<String> {
        self.units.read().get(id).map(|cell| cell.lock().zone.clone())
    }

    pub fn zone_units(&self, zone: &str) -> Vec<UnitId> {
        self.zones
            .read()
            .units(zone)
            .map(<[UnitId]>::to_vec)
            .unwrap_or_default()
    }

    pub fn zones(&self) -> Vec<String> {
        self.zones.read().names().map(str::to_string).collect()
    }

    /// Energy spent by all firings since creation.
    pub fn total_energy_joules(&self) -> f64 {
        self.units
            .read()
            .iter()
            .map(|cell| cell.lock().energy_joules)
            .sum()
    }

    // --- Persistence shape ---

    /// Logical state for a persistence collaborator. Potentials are kept so
    /// a restored fabric resumes mid-integration.
    pub fn snapshot(&self) -> FabricSnapshot {
        let pass = self.link_pass();
        let units = pass
            .units
            .iter()
            .map(|cell| {
                let unit = cell.lock();
                UnitRecord {
                    id: unit.id,
                    zone: unit.zone.clone(),
                    threshold: unit.threshold,
                    potential: unit.potential,
                }
            })
            .collect();
        let links = pass
            .links
            .iter()
            .map(|(source, target, link)| LinkRecord {
                source,
                target,
                weight: link.weight,
            })
            .collect();
        drop(pass);

        let symbols = self
            .symbols
            .read()
            .iter()
            .map(|(k, p)| (k.to_string(), p.clone()))
            .collect();

        FabricSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            taken_at: now_unix_secs(),
            units,
            links,
            symbols,
        }
    }

    /// Rebuild a fabric from a snapshot. Unit ids must be contiguous from 0
    /// and every link and symbol must reference existing units.
    pub fn restore(
        config: FabricConfig,
        clock: Arc<dyn Clock>,
        snapshot: FabricSnapshot,
    ) -> Result<Self> {
        snapshot.check_version()?;
        if snapshot.units.len() > config.max_units {
            return Err(FabricError::CapacityExceeded {
                requested: snapshot.units.len(),
                current: 0,
                max: config.max_units,
            });
        }

        let fabric = Self::with_clock(config, clock)?;
        let now = fabric.clock.now();
        {
            let mut units = fabric.units.write();
            let mut zones = fabric.zones.write();
            for (expected, record) in snapshot.units.into_iter().enumerate() {
                if record.id != expected {
                    return Err(FabricError::CorruptSnapshot(format!(
                        "unit id {} at position {expected}",
                        record.id
                    )));
                }
                let mut unit = Unit::new(
                    record.id,
                    &record.zone,
                    record.threshold,
                    fabric.config.unit_decay,
                    now,
                );
                unit.potential = record.potential;
                zones.extend(&record.zone, record.id..record.id + 1);
                units.push(Mutex::new(unit));
            }
        }

        for link in snapshot.links {
            if fabric.connect(link.source, link.target, link.weight) == Connect::UnknownUnit {
                return Err(FabricError::CorruptSnapshot(format!(
                    "link {} -> {} references a missing unit",
                    link.source, link.target
                )));
            }
        }
        for (symbol, pattern) in snapshot.symbols {
            fabric.bind(&symbol, pattern)?;
        }

        info!(
            "restored fabric with {} units, {} links",
            fabric.unit_count(),
            fabric.link_count()
        );
        Ok(fabric)
    }
}

impl SymbolLookup for Fabric {
    fn symbol_for(&self, pattern: &Pattern) -> Option<String> {
        self.symbols.read().symbol_for(pattern)
    }
}
