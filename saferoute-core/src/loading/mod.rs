//! This module is responsible for reading and writing data (street network,
//! incidents, annotated graphs) and running the offline aggregation pipeline.

mod builder;
mod config;
mod graph_io;
mod incidents;

pub use builder::{create_risk_graph, run_aggregation};
pub use config::{AggregationConfig, DEFAULT_ATTRIBUTE_PREFIX, RouterConfig};
pub use graph_io::{
    EdgeRecord, GraphDocument, NodeRecord, SCORE_PREFIXES, load_road_graph, load_street_network,
    road_graph_from_document, save_road_graph,
};
pub use incidents::{load_incidents, normalize_time_bin, read_incidents};
