pub use crate::{DEFAULT_RISK_RADIUS_M, EARTH_RADIUS_M};

// Offline pipeline
pub use crate::aggregation::{RiskTable, aggregate_risk, mode_with_max_tiebreak};
pub use crate::loading::{
    AggregationConfig, RouterConfig, create_risk_graph, load_incidents, load_road_graph,
    load_street_network, save_road_graph,
};

// Data model
pub use crate::model::{
    Incident, RoadEdge, RoadGraph, RoadNode, RoadSegment, StreetNetwork, TimeBin, TimeBinSet,
};

// Online routing
pub use crate::routing::{
    RiskHeuristic, Route, RouteQuery, Router, SearchLimits, ZeroHeuristic, plan_route,
};
pub use crate::spatial::{NearestNodeLocator, Snap, SpatialIndex};

pub use crate::Error;
pub use crate::NodeId;
pub use crate::RiskScore;
