//! Time-aware safest-route engine.
//!
//! Road segments carry one crime-risk score per time-of-day bin. Scores are
//! produced offline by [`aggregation`] from historical incident records and
//! consumed online by [`routing`], which searches the immutable
//! [`RoadGraph`] for the path with the lowest accumulated risk.

pub mod aggregation;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod spatial;

pub use aggregation::{RiskTable, aggregate_risk};
pub use error::Error;
pub use loading::{AggregationConfig, RouterConfig};
pub use model::{Incident, RoadEdge, RoadGraph, RoadNode, TimeBin, TimeBinSet};
pub use routing::{Route, RouteQuery, Router, SearchLimits};
pub use spatial::SpatialIndex;

/// Stable identifier of a road network node (OSM node id)
pub type NodeId = u64;

/// Non-negative edge weight for a single time bin
pub type RiskScore = f64;

/// Mean Earth radius in meters used for angular/metric conversions
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Search radius used when aggregating incidents onto road segments
pub const DEFAULT_RISK_RADIUS_M: f64 = 200.0;
