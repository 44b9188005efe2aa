//! Neural fabric: a sparse, event-driven associative memory substrate.
//!
//! Leaky integrate-and-fire units joined by weighted directed links learn
//! by a local Hebbian rule whenever both ends fire in the same tick. A
//! memory controller watches what fires, promotes recurring patterns into
//! strongly linked assemblies, completes patterns from partial cues,
//! rehearses them offline and lets unused links decay away.
//!
//! Zero I/O apart from reading a config file: sensors, language layers and
//! persistence talk to the core through the operations exported here.

pub mod cancel;
pub mod clock;
pub mod config;
pub mod constants;
pub mod energy;
pub mod error;
pub mod fabric;
pub mod link;
pub mod memory;
pub mod pattern;
pub mod snapshot;
pub mod symbols;
pub mod unit;
pub mod zone;

pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, FabricConfig, MemoryConfig};
pub use energy::{BudgetExceeded, PowerMeter};
pub use error::{FabricError, Result};
pub use fabric::{Connect, Fabric, StepOutcome};
pub use link::{Link, LinkTable, PruneReport};
pub use memory::{ConsolidationReport, MaintenanceReport, MemoryController};
pub use pattern::{Pattern, UnitId};
pub use snapshot::{
    FabricSnapshot, LinkRecord, MemorySnapshot, SNAPSHOT_VERSION, SavedState, UnitRecord,
    export_json, import_json,
};
pub use symbols::{SymbolLookup, SymbolTable};
pub use unit::Unit;
pub use zone::ZoneMap;
