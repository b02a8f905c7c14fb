//! Routable road graph store

use hashbrown::HashMap;
use log::debug;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use super::{RoadEdge, RoadNode, RoadSegment, TimeBin, TimeBinSet};
use crate::{Error, NodeId, RiskScore, spatial::SpatialIndex};

/// Bare road network as delivered by the map source, before risk annotation
pub type StreetNetwork = DiGraph<RoadNode, RoadSegment>;

/// Road graph with per-bin risk scores on every edge.
///
/// Built once, then shared read-only (typically behind an `Arc`) between
/// concurrent route requests. Nothing mutates nodes or edges after
/// construction.
#[derive(Debug)]
pub struct RoadGraph {
    pub graph: DiGraph<RoadNode, RoadEdge>,
    bins: TimeBinSet,
    node_ids: HashMap<NodeId, NodeIndex>,
    node_index: SpatialIndex,
}

impl RoadGraph {
    /// Joins a street network with one score row per edge (in edge index
    /// order). Every row must hold exactly one score per bin.
    pub fn from_parts(
        network: StreetNetwork,
        bins: TimeBinSet,
        edge_risk: Vec<Vec<RiskScore>>,
    ) -> Result<Self, Error> {
        if network.node_count() == 0 || network.edge_count() == 0 {
            return Err(Error::EmptyGraph);
        }
        if edge_risk.len() != network.edge_count() {
            return Err(Error::InvalidData(format!(
                "Got risk scores for {} edges, graph has {}",
                edge_risk.len(),
                network.edge_count()
            )));
        }
        for (edge, scores) in edge_risk.iter().enumerate() {
            if scores.len() != bins.len() {
                return Err(Error::InconsistentBins { edge });
            }
            if let Some(score) = scores.iter().find(|s| !s.is_finite() || **s < 0.0) {
                return Err(Error::InvalidData(format!(
                    "Edge {edge} has invalid risk score {score}"
                )));
            }
        }

        let (nodes, edges) = network.into_nodes_edges();
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_ids = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let id = node.weight.id;
            let index = graph.add_node(node.weight);
            if node_ids.insert(id, index).is_some() {
                return Err(Error::InvalidData(format!("Duplicate node id {id}")));
            }
        }
        for (edge, scores) in edges.into_iter().zip(edge_risk) {
            let (source, target) = (edge.source(), edge.target());
            graph.add_edge(source, target, RoadEdge::new(edge.weight, scores));
        }

        let node_index = SpatialIndex::build(graph.node_weights().map(|node| node.geometry));
        debug!(
            "Road graph ready: {} nodes, {} edges, {} time bins",
            graph.node_count(),
            graph.edge_count(),
            bins.len()
        );

        Ok(Self {
            graph,
            bins,
            node_ids,
            node_index,
        })
    }

    pub fn bins(&self) -> &TimeBinSet {
        &self.bins
    }

    /// Position of a bin label, failing with `BinNotFound` when the graph
    /// carries no scores for it
    pub fn bin_position(&self, label: &str) -> Result<usize, Error> {
        self.bins
            .position(label)
            .ok_or_else(|| Error::BinNotFound(label.to_string()))
    }

    pub fn bin(&self, position: usize) -> Option<&TimeBin> {
        self.bins.get(position)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&RoadNode> {
        self.graph.node_weight(index)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&RoadEdge> {
        self.graph.edge_weight(index)
    }

    /// Graph index of the node with the given OSM id
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_ids.get(&id).copied()
    }

    /// Spatial index over node coordinates. Entry data is the node index.
    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.node_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn segment() -> RoadSegment {
        RoadSegment::new(0, LineString::new(vec![]))
    }

    fn network() -> StreetNetwork {
        let mut network = StreetNetwork::new();
        let a = network.add_node(RoadNode::new(10, 34.0, -118.0));
        let b = network.add_node(RoadNode::new(20, 34.001, -118.0));
        network.add_edge(a, b, segment());
        network.add_edge(b, a, segment());
        network
    }

    #[test]
    fn builds_store_with_scores() {
        let bins = TimeBinSet::from_labels(["08", "20"]).unwrap();
        let graph =
            RoadGraph::from_parts(network(), bins, vec![vec![1.0, 2.0], vec![3.0, 0.0]]).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node_index(20), Some(NodeIndex::new(1)));
        assert_eq!(graph.bin_position("20").unwrap(), 1);
        assert_eq!(graph.edge(EdgeIndex::new(1)).unwrap().risk(0), Some(3.0));
        assert_eq!(graph.spatial_index().len(), 2);
    }

    #[test]
    fn rejects_empty_graph() {
        let bins = TimeBinSet::from_labels(["08"]).unwrap();
        let result = RoadGraph::from_parts(StreetNetwork::new(), bins, vec![]);
        assert!(matches!(result, Err(Error::EmptyGraph)));
    }

    #[test]
    fn rejects_missing_bin_scores() {
        let bins = TimeBinSet::from_labels(["08", "20"]).unwrap();
        let result = RoadGraph::from_parts(network(), bins, vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(Error::InconsistentBins { edge: 1 })));
    }

    #[test]
    fn rejects_negative_scores() {
        let bins = TimeBinSet::from_labels(["08"]).unwrap();
        let result = RoadGraph::from_parts(network(), bins, vec![vec![1.0], vec![-1.0]]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn unknown_bin_is_reported() {
        let bins = TimeBinSet::from_labels(["08"]).unwrap();
        let graph = RoadGraph::from_parts(network(), bins, vec![vec![1.0], vec![1.0]]).unwrap();
        assert!(matches!(graph.bin_position("09"), Err(Error::BinNotFound(bin)) if bin == "09"));
    }
}
