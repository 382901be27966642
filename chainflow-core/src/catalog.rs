//! Scenario catalog.
//!
//! A single lookup table from [`ScenarioKey`] to a validated [`Scenario`].
//! The built-in table covers the five vehicle-registry workflows; a catalog
//! document can replace it:
//!
//! ```yaml
//! scenarios:
//!   - key: mint
//!     nodes: [...]
//!     edges: [...]
//!     steps: [...]
//! ```

use crate::error::CoreError;
use crate::scenario::{Edge, Node, Scenario, ScenarioKey, ScenarioRaw, StepSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const ROW_Y: f64 = 120.0;
const COLUMNS: [f64; 4] = [40.0, 360.0, 680.0, 1000.0];

/// Serialized catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub scenarios: Vec<ScenarioRaw>,
}

/// Read-only table of scenarios.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scenarios: BTreeMap<ScenarioKey, Arc<Scenario>>,
}

impl Catalog {
    /// The five built-in workflows.
    pub fn builtin() -> Self {
        let raws = [
            builtin_raw(
                ScenarioKey::Mint,
                [
                    "👨‍💼 Admin (mint)",
                    "🧠 VehicleToken Contract",
                    "⛓️ Blockchain (PoS)",
                    "💾 MongoDB (VehicleIndex)",
                ],
                [
                    ("n1", "n2", "Mint Vehicle Tx"),
                    ("n2", "n3", "Proof-of-Stake Validation"),
                    ("n3", "n4", "Sync metadata"),
                ],
                [
                    ("Admin submits a mint transaction to the VehicleToken contract", &["n1", "n2"][..]),
                    ("Validators confirm the mint under proof-of-stake", &["n3"][..]),
                    ("Vehicle metadata is synced into the off-chain index", &["n4"][..]),
                ],
            ),
            builtin_raw(
                ScenarioKey::Garage,
                [
                    "🏭 Garage (apply)",
                    "🧾 GarageRegistry Contract",
                    "⛓️ Blockchain",
                    "✅ Admin Approval",
                ],
                [
                    ("n1", "n2", "Submit KYC"),
                    ("n2", "n3", " Tx mined & verified "),
                    ("n3", "n4", "Role granted"),
                ],
                [
                    ("Garage submits its KYC application to the registry", &["n1", "n2"][..]),
                    ("The registration transaction is mined and verified", &["n3"][..]),
                    ("Admin approves and the garage role is granted", &["n4"][..]),
                ],
            ),
            builtin_raw(
                ScenarioKey::Service,
                [
                    "🧰 Garage (add record)",
                    "🧠 ServiceRegistry Contract",
                    "⛓️ Blockchain (PoS)",
                    "💾 MongoDB (Record Cache)",
                ],
                [
                    ("n1", "n2", "Add Record Tx"),
                    ("n2", "n3", "Block Added"),
                    ("n3", "n4", "Sync off-chain DB"),
                ],
                [
                    ("Garage sends a service record to the ServiceRegistry", &["n1", "n2"][..]),
                    ("The record lands in a new block", &["n3"][..]),
                    ("The record cache is synced off-chain", &["n4"][..]),
                ],
            ),
            builtin_raw(
                ScenarioKey::Transfer,
                [
                    "👤 Seller",
                    "👤 Buyer",
                    "🧠 VehicleToken Contract",
                    "⛓️ Blockchain Validation",
                ],
                [
                    ("n1", "n3", "Transfer Tx"),
                    ("n3", "n4", "Consensus Validation"),
                    ("n4", "n2", "Ownership Updated"),
                ],
                [
                    ("Seller and buyer start the transfer", &["n1", "n2"][..]),
                    ("The VehicleToken contract processes the transfer tx", &["n3"][..]),
                    ("The network validates the transfer and ownership is updated", &["n4"][..]),
                ],
            ),
            builtin_raw(
                ScenarioKey::Lookup,
                [
                    "🔍 Public User",
                    "🔗 Contracts: Token + ServiceRegistry",
                    "⛓️ Blockchain Read",
                    "💾 MongoDB Cache / UI",
                ],
                [
                    ("n1", "n2", "Fetch vehicle history"),
                    ("n2", "n3", "On-chain read"),
                    ("n3", "n4", "Show results in UI"),
                ],
                [
                    ("A public user asks the contracts for a vehicle's history", &["n1", "n2"][..]),
                    ("Token and service records are read on-chain", &["n3"][..]),
                    ("Results are shown from the cache-backed UI", &["n4"][..]),
                ],
            ),
        ];

        let mut catalog = Self::default();
        for raw in raws {
            match Scenario::from_raw(raw) {
                Ok(scenario) => {
                    catalog.scenarios.insert(scenario.key, Arc::new(scenario));
                }
                Err(e) => tracing::error!("built-in scenario rejected: {}", e),
            }
        }
        catalog
    }

    /// Validates every scenario in a document.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CoreError> {
        let mut scenarios = BTreeMap::new();
        for raw in document.scenarios {
            let key = raw.key;
            let scenario = Scenario::from_raw(raw)?;
            if scenarios.insert(key, Arc::new(scenario)).is_some() {
                return Err(CoreError::invalid(key.as_str(), "defined more than once"));
            }
        }
        Ok(Self { scenarios })
    }

    pub fn from_yaml(content: &str) -> Result<Self, CoreError> {
        let document: CatalogDocument = serde_yaml::from_str(content)?;
        Self::from_document(document)
    }

    pub fn from_json(content: &str) -> Result<Self, CoreError> {
        let document: CatalogDocument = serde_json::from_str(content)?;
        Self::from_document(document)
    }

    /// Loads a catalog file, choosing the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => {
                return Err(CoreError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        tracing::info!(
            "Loaded {} scenario(s) from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            scenarios: self.scenarios.values().map(|s| s.to_raw()).collect(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, CoreError> {
        Ok(serde_yaml::to_string(&self.to_document())?)
    }

    pub fn get(&self, key: ScenarioKey) -> Option<Arc<Scenario>> {
        self.scenarios.get(&key).cloned()
    }

    /// Looks up a raw picker key. Unknown or missing keys yield `None`.
    pub fn resolve(&self, key: &str) -> Option<Arc<Scenario>> {
        ScenarioKey::from_picker(key).and_then(|k| self.get(k))
    }

    /// Like [`Catalog::resolve`] but reports unknown keys as errors.
    pub fn require(&self, key: &str) -> Result<Arc<Scenario>, CoreError> {
        self.resolve(key).ok_or_else(|| CoreError::UnknownScenario {
            key: key.to_string(),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = ScenarioKey> + '_ {
        self.scenarios.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Four nodes in one row, three numbered edges, one step per edge.
fn builtin_raw(
    key: ScenarioKey,
    labels: [&str; 4],
    edges: [(&str, &str, &str); 3],
    steps: [(&str, &[&str]); 3],
) -> ScenarioRaw {
    ScenarioRaw {
        key,
        nodes: labels
            .iter()
            .zip(COLUMNS)
            .enumerate()
            .map(|(i, (label, x))| Node::new(format!("n{}", i + 1), *label, x, ROW_Y))
            .collect(),
        edges: edges
            .iter()
            .enumerate()
            .map(|(k, (source, target, label))| {
                Edge::new(Scenario::edge_id_for_step(k), *source, *target, *label)
            })
            .collect(),
        steps: steps
            .iter()
            .map(|(description, highlight)| StepSpec::new(*description, highlight.iter().copied()))
            .collect(),
    }
}
