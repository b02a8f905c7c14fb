//! Data model for risk-weighted routing
//!
//! Road network nodes and edges, time bins and incident records.

pub mod components;
pub mod graph;
pub mod incident;
pub mod time_bin;

pub use components::{Attributes, RoadEdge, RoadNode, RoadSegment};
pub use graph::{RoadGraph, StreetNetwork};
pub use incident::Incident;
pub use time_bin::{TimeBin, TimeBinSet, parse_hour};
