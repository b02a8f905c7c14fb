//! Road network components - nodes, bare segments and risk-annotated edges

use geo::{LineString, Point};
use serde_json::{Map, Value};

use crate::{NodeId, RiskScore};

/// Source attributes carried through unchanged (street name, highway class...)
pub type Attributes = Map<String, Value>;

/// Road graph node
#[derive(Debug, Clone, PartialEq)]
pub struct RoadNode {
    /// OSM ID of the node
    pub id: NodeId,
    /// Node coordinates (x = lon, y = lat)
    pub geometry: Point<f64>,
    pub attributes: Attributes,
}

impl RoadNode {
    pub fn new(id: NodeId, lat: f64, lon: f64) -> Self {
        Self {
            id,
            geometry: Point::new(lon, lat),
            attributes: Attributes::new(),
        }
    }

    pub fn lat(&self) -> f64 {
        self.geometry.y()
    }

    pub fn lon(&self) -> f64 {
        self.geometry.x()
    }
}

/// Road segment before risk annotation
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    /// Parallel edge discriminator between the same pair of nodes
    pub key: u32,
    /// Segment shape, may be empty or a single point
    pub geometry: LineString<f64>,
    /// Source attributes other than per-bin scores
    pub attributes: Attributes,
}

impl RoadSegment {
    pub fn new(key: u32, geometry: LineString<f64>) -> Self {
        Self {
            key,
            geometry,
            attributes: Attributes::new(),
        }
    }

    /// Representative point used for incident lookups.
    ///
    /// This is the midpoint of the first and last vertex, not the centroid of
    /// the curve. For long curved segments the two can differ noticeably.
    pub fn midpoint(&self) -> Option<Point<f64>> {
        let first = self.geometry.0.first()?;
        let last = self.geometry.0.last()?;
        Some(Point::new((first.x + last.x) / 2.0, (first.y + last.y) / 2.0))
    }
}

/// Routable edge carrying one risk score per time bin of the graph
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub key: u32,
    pub geometry: LineString<f64>,
    /// Scores indexed by the position of the bin in the graph's `TimeBinSet`
    pub risk: Vec<RiskScore>,
    pub attributes: Attributes,
}

impl RoadEdge {
    pub fn new(segment: RoadSegment, risk: Vec<RiskScore>) -> Self {
        Self {
            key: segment.key,
            geometry: segment.geometry,
            risk,
            attributes: segment.attributes,
        }
    }

    /// Risk score for the bin at `bin` position, `None` if out of range
    pub fn risk(&self, bin: usize) -> Option<RiskScore> {
        self.risk.get(bin).copied()
    }
}
