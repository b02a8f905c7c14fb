//! Snapping arbitrary coordinates to road graph nodes

use geo::{Distance, Haversine, Point};
use log::trace;
use petgraph::graph::NodeIndex;

use crate::{Error, RoadGraph};

/// Result of snapping a coordinate to the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub node: NodeIndex,
    /// Great-circle distance between the query point and the node
    pub distance_m: f64,
}

/// Finds the closest graph node for a coordinate.
///
/// Without a `max_snap_distance_m` any query returns some node, even one far
/// outside the area covered by the graph.
#[derive(Debug, Clone, Copy)]
pub struct NearestNodeLocator<'a> {
    graph: &'a RoadGraph,
    max_snap_distance_m: Option<f64>,
}

impl<'a> NearestNodeLocator<'a> {
    pub fn new(graph: &'a RoadGraph) -> Self {
        Self {
            graph,
            max_snap_distance_m: None,
        }
    }

    #[must_use]
    pub fn with_max_distance(mut self, max_snap_distance_m: Option<f64>) -> Self {
        self.max_snap_distance_m = max_snap_distance_m;
        self
    }

    pub fn locate(&self, point: Point<f64>) -> Result<Snap, Error> {
        let position = self
            .graph
            .spatial_index()
            .nearest(point)
            .ok_or(Error::EmptyGraph)?;
        let node = NodeIndex::new(position);
        let geometry = self
            .graph
            .node(node)
            .ok_or(Error::InvalidNodeIndex)?
            .geometry;
        let distance_m = Haversine.distance(point, geometry);

        if let Some(max_m) = self.max_snap_distance_m
            && distance_m > max_m
        {
            trace!("Point {point:?} is {distance_m:.0} m from the nearest node (max: {max_m} m)");
            return Err(Error::OutOfCoverageSnap { distance_m, max_m });
        }

        Ok(Snap { node, distance_m })
    }
}

impl RoadGraph {
    /// Nearest node without a distance cap
    pub fn nearest_node(&self, point: Point<f64>) -> Option<(NodeIndex, f64)> {
        NearestNodeLocator::new(self)
            .locate(point)
            .ok()
            .map(|snap| (snap.node, snap.distance_m))
    }
}
