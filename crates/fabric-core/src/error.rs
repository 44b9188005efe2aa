use thiserror::Error;

use crate::pattern::UnitId;

/// Errors raised by the fabric core.
///
/// Budget overruns are deliberately absent: they are reported through
/// [`StepOutcome`](crate::fabric::StepOutcome) and never abort a step.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("cannot add {requested} units: {current} allocated, capacity is {max}")]
    CapacityExceeded {
        requested: usize,
        current: usize,
        max: usize,
    },

    #[error("cannot bind symbol '{symbol}': unit {unit} does not exist")]
    UnknownUnit { symbol: String, unit: UnitId },

    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    #[error("zone '{zone}' has {available} free units, {requested} requested")]
    ZoneExhausted {
        zone: String,
        requested: usize,
        available: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config read error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("unsupported snapshot version '{found}'")]
    SnapshotVersion { found: String },
}

pub type Result<T> = std::result::Result<T, FabricError>;
