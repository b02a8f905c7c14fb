use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_RISK_RADIUS_M;

/// Default score attribute prefix written to persisted graphs
pub const DEFAULT_ATTRIBUTE_PREFIX: &str = "risk_";

/// Settings of the online routing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Risk-annotated graph produced by the aggregation pipeline
    pub graph_path: PathBuf,
    /// Reject endpoints farther than this from every graph node.
    /// `None` snaps any coordinate to some node.
    pub max_snap_distance_m: Option<f64>,
    /// Per-search deadline, 0 disables it
    pub search_timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            graph_path: PathBuf::from("graph.json"),
            max_snap_distance_m: None,
            search_timeout_ms: 5000,
        }
    }
}

impl RouterConfig {
    pub fn search_timeout(&self) -> Option<Duration> {
        (self.search_timeout_ms > 0).then(|| Duration::from_millis(self.search_timeout_ms))
    }
}

/// Settings of the offline risk aggregation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Incident CSV
    pub incidents_path: PathBuf,
    /// Bare street network (graph JSON without score attributes)
    pub graph_path: PathBuf,
    /// Where the annotated graph is written
    pub output_path: PathBuf,
    /// Incident search radius around each segment midpoint
    pub radius_m: f64,
    /// Explicit bin labels. When unset the distinct incident bins are used.
    pub bins: Option<Vec<String>>,
    /// Prefix of the per-bin score attributes in the output
    pub attribute_prefix: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            incidents_path: PathBuf::from("incidents.csv"),
            graph_path: PathBuf::from("network.json"),
            output_path: PathBuf::from("graph.json"),
            radius_m: DEFAULT_RISK_RADIUS_M,
            bins: None,
            attribute_prefix: DEFAULT_ATTRIBUTE_PREFIX.to_string(),
        }
    }
}
