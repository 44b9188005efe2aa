//! Logical shape of persisted state.
//!
//! The core only defines what a persistence collaborator has to keep: units
//! with their zone, every link, the symbol table and the consolidated
//! patterns. JSON helpers turn that into an opaque string; where the string
//! goes is not the core's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FabricError, Result};
use crate::pattern::{Pattern, UnitId};

pub const SNAPSHOT_VERSION: &str = "1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub id: UnitId,
    pub zone: String,
    pub threshold: f64,
    #[serde(default)]
    pub potential: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: UnitId,
    pub target: UnitId,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricSnapshot {
    pub version: String,
    /// Unix seconds.
    #[serde(default)]
    pub taken_at: u64,
    pub units: Vec<UnitRecord>,
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub symbols: BTreeMap<String, Pattern>,
}

impl FabricSnapshot {
    pub fn check_version(&self) -> Result<()> {
        check_version(&self.version)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(default)]
    pub consolidated: Vec<Pattern>,
}

/// Everything a persistence collaborator stores, as one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub version: String,
    pub fabric: FabricSnapshot,
    #[serde(default)]
    pub memory: MemorySnapshot,
}

fn check_version(found: &str) -> Result<()> {
    if found == SNAPSHOT_VERSION {
        Ok(())
    } else {
        Err(FabricError::SnapshotVersion {
            found: found.to_string(),
        })
    }
}

/// Serialize fabric and memory snapshots to a JSON document.
pub fn export_json(fabric: &FabricSnapshot, memory: &MemorySnapshot) -> Result<String> {
    let state = SavedState {
        version: SNAPSHOT_VERSION.to_string(),
        fabric: fabric.clone(),
        memory: memory.clone(),
    };
    Ok(serde_json::to_string_pretty(&state)?)
}

/// Parse a JSON document produced by [`export_json`].
pub fn import_json(json: &str) -> Result<SavedState> {
    let state: SavedState = serde_json::from_str(json)?;
    check_version(&state.version)?;
    state.fabric.check_version()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> FabricSnapshot {
        FabricSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            taken_at: 1_771_632_000,
            units: vec![
                UnitRecord {
                    id: 0,
                    zone: "vision".into(),
                    threshold: 1.0,
                    potential: 0.25,
                },
                UnitRecord {
                    id: 1,
                    zone: "audio".into(),
                    threshold: 1.0,
                    potential: 0.0,
                },
            ],
            links: vec![LinkRecord {
                source: 0,
                target: 1,
                weight: 0.7,
            }],
            symbols: BTreeMap::from([("apple".to_string(), Pattern::from([0, 1]))]),
        }
    }

    #[test]
    fn test_json_document_shape() {
        let memory = MemorySnapshot {
            consolidated: vec![Pattern::from([0, 1])],
        };
        let json = export_json(&snapshot(), &memory).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], SNAPSHOT_VERSION);
        assert_eq!(value["fabric"]["takenAt"], 1_771_632_000u64);
        assert_eq!(value["fabric"]["symbols"]["apple"], serde_json::json!([0, 1]));
        assert_eq!(value["memory"]["consolidated"][0], serde_json::json!([0, 1]));

        let state = import_json(&json).unwrap();
        assert_eq!(state.fabric, snapshot());
        assert_eq!(state.memory, memory);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{
            "version": "1",
            "fabric": {
                "version": "1",
                "units": [{"id": 0, "zone": "vision", "threshold": 1.0}],
                "links": []
            }
        }"#;
        let state = import_json(json).unwrap();
        assert_eq!(state.fabric.units[0].potential, 0.0);
        assert!(state.fabric.symbols.is_empty());
        assert!(state.memory.consolidated.is_empty());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut snap = snapshot();
        snap.version = "0.9".into();
        let json = export_json(&snap, &MemorySnapshot::default()).unwrap();
        assert!(matches!(
            import_json(&json),
            Err(FabricError::SnapshotVersion { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(import_json("not json"), Err(FabricError::Snapshot(_))));
    }
}
