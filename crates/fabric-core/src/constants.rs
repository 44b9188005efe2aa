//! Energy model constants and default tuning for the fabric and memory layers.
//!
//! The joule figures are illustrative, loosely scaled from estimates for
//! biological neurons. Only their ratios matter to the budget governor.

/// Energy spent by one unit firing event.
pub const JOULES_PER_FIRING: f64 = 1e-9;

/// Energy spent by one Hebbian weight update on a link.
pub const JOULES_PER_LINK_UPDATE: f64 = 5e-10;

/// Passive draw of a single unit holding its potential.
pub const WATTS_IDLE_PER_UNIT: f64 = 1e-12;

/// Number of recent firing times kept per unit.
pub const FIRING_HISTORY_LEN: usize = 10;

// --- Fabric defaults ---

pub const DEFAULT_MAX_UNITS: usize = 10_000;
pub const DEFAULT_POWER_BUDGET_WATTS: f64 = 20.0;
pub const DEFAULT_THRESHOLD: f64 = 1.0;
pub const DEFAULT_DECAY: f64 = 0.9;
pub const DEFAULT_LINK_WEIGHT: f64 = 0.1;
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Weight of the newest sample in the rolling power average.
pub const DEFAULT_POWER_SMOOTHING: f64 = 0.05;

/// Power updates closer together than this keep accumulating joules.
pub const DEFAULT_MIN_POWER_INTERVAL_SECS: f64 = 0.1;

// --- Memory defaults ---

pub const DEFAULT_SHORT_TERM_CAPACITY: usize = 100;

/// Patterns smaller than this are not memory-worthy.
pub const DEFAULT_MIN_PATTERN_SIZE: usize = 2;

pub const DEFAULT_CONSOLIDATION_THRESHOLD: usize = 3;
pub const DEFAULT_CONSOLIDATION_WEIGHT: f64 = 0.7;

/// Links above this weight count as "strong" for cued recall.
pub const DEFAULT_STRONG_LINK_THRESHOLD: f64 = 0.5;

pub const DEFAULT_RECALL_STRENGTH: f64 = 0.6;
pub const DEFAULT_DREAM_STRENGTH: f64 = 1.1;
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_PRUNE_DECAY: f64 = 0.99;
