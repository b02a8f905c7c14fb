//! Node-link JSON persistence of road graphs.
//!
//! Nodes carry `id`, `y` (lat) and `x` (lon). Edges carry `u`, `v`, `key`,
//! an optional `geometry` as `[lon, lat]` pairs and one `risk_<bin>` (or
//! `severity_<bin>`) attribute per time bin. Scores may be stored as numbers
//! or numeric strings and are converted once, here, on load. Any other node
//! or edge attribute is kept as is and written back on save.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use geo::{Coord, LineString};
use hashbrown::HashMap;
use log::info;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Error, NodeId, RiskScore, RoadGraph,
    model::{Attributes, RoadNode, RoadSegment, StreetNetwork, TimeBinSet},
};

/// Attribute prefixes recognised as per-bin scores
pub const SCORE_PREFIXES: [&str; 2] = ["risk_", "severity_"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    /// Latitude
    pub y: f64,
    /// Longitude
    pub x: f64,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub u: NodeId,
    pub v: NodeId,
    #[serde(default)]
    pub key: u32,
    /// `[lon, lat]` vertices, a straight segment between `u` and `v` if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<[f64; 2]>>,
    /// Everything else, including the per-bin scores
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl GraphDocument {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open graph file '{}': {}", path.display(), e),
            )
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Serializable form of `graph` with scores under `<prefix><bin>`
    pub fn from_graph(graph: &RoadGraph, prefix: &str) -> Self {
        let nodes = graph
            .graph
            .node_weights()
            .map(|node| NodeRecord {
                id: node.id,
                y: node.lat(),
                x: node.lon(),
                attributes: node.attributes.clone(),
            })
            .collect();

        let edges = graph
            .graph
            .edge_references()
            .map(|edge| {
                let road_edge = edge.weight();
                let mut attributes = road_edge.attributes.clone();
                attributes.extend(
                    graph
                        .bins()
                        .iter()
                        .zip(&road_edge.risk)
                        .map(|(bin, score)| (format!("{prefix}{}", bin.label()), Value::from(*score))),
                );

                EdgeRecord {
                    u: graph.graph[edge.source()].id,
                    v: graph.graph[edge.target()].id,
                    key: road_edge.key,
                    geometry: Some(road_edge.geometry.coords().map(|c| [c.x, c.y]).collect()),
                    attributes,
                }
            })
            .collect();

        Self { nodes, edges }
    }

    /// Builds the bare street network. Score attributes are split off and
    /// returned in edge index order, everything else stays on the segments.
    pub fn into_network(self) -> Result<(StreetNetwork, Vec<Attributes>), Error> {
        let mut network = StreetNetwork::with_capacity(self.nodes.len(), self.edges.len());
        let mut indices = HashMap::with_capacity(self.nodes.len());

        for record in self.nodes {
            let mut node = RoadNode::new(record.id, record.y, record.x);
            node.attributes = record.attributes;
            let index = network.add_node(node);
            if indices.insert(record.id, index).is_some() {
                return Err(Error::InvalidData(format!("Duplicate node id {}", record.id)));
            }
        }

        let mut scores = Vec::with_capacity(self.edges.len());
        for record in self.edges {
            let lookup = |id: NodeId| {
                indices
                    .get(&id)
                    .copied()
                    .ok_or_else(|| Error::InvalidData(format!("Edge references unknown node {id}")))
            };
            let (source, target) = (lookup(record.u)?, lookup(record.v)?);

            let geometry = match record.geometry {
                Some(vertices) => vertices
                    .into_iter()
                    .map(|[x, y]| Coord { x, y })
                    .collect::<LineString<f64>>(),
                None => LineString::from(vec![
                    network[source].geometry.0,
                    network[target].geometry.0,
                ]),
            };

            let (edge_scores, attributes): (Attributes, Attributes) = record
                .attributes
                .into_iter()
                .partition(|(name, _)| is_score_attribute(name));

            network.add_edge(
                source,
                target,
                RoadSegment {
                    key: record.key,
                    geometry,
                    attributes,
                },
            );
            scores.push(edge_scores);
        }

        Ok((network, scores))
    }
}

fn is_score_attribute(name: &str) -> bool {
    SCORE_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Converts a stored score to a number
fn coerce_score(value: &Value) -> Option<RiskScore> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Per-bin scores of one edge, keyed by bin label
fn edge_scores(
    attributes: &Attributes,
    edge: usize,
) -> Result<HashMap<&str, RiskScore>, Error> {
    let mut scores = HashMap::new();
    for (name, value) in attributes {
        let Some(label) = SCORE_PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
        else {
            continue;
        };
        let score = coerce_score(value).ok_or_else(|| {
            Error::InvalidData(format!("Edge {edge}: '{name}' is not numeric ({value})"))
        })?;
        scores.insert(label, score);
    }
    Ok(scores)
}

/// Builds the routable store from a parsed document.
///
/// The bin set comes from the first edge; every other edge must carry
/// exactly the same bins.
pub fn road_graph_from_document(document: GraphDocument) -> Result<RoadGraph, Error> {
    let (network, attributes) = document.into_network()?;
    let Some(first) = attributes.first() else {
        return Err(Error::EmptyGraph);
    };

    let labels: Vec<&str> = edge_scores(first, 0)?.into_keys().collect();
    if labels.is_empty() {
        return Err(Error::InvalidData(
            "Edges carry no risk_/severity_ score attributes".to_string(),
        ));
    }
    let bins = TimeBinSet::from_labels(&labels)?;

    let rows = attributes
        .iter()
        .enumerate()
        .map(|(edge, attributes)| {
            let scores = edge_scores(attributes, edge)?;
            if scores.len() != bins.len() {
                return Err(Error::InconsistentBins { edge });
            }
            bins.iter()
                .map(|bin| {
                    scores
                        .get(bin.label())
                        .copied()
                        .ok_or(Error::InconsistentBins { edge })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    RoadGraph::from_parts(network, bins, rows)
}

/// Loads a risk-annotated graph
pub fn load_road_graph(path: &Path) -> Result<RoadGraph, Error> {
    let graph = road_graph_from_document(GraphDocument::read(path)?)?;
    info!(
        "Loaded road graph from {}: {} nodes, {} edges, {} time bins",
        path.display(),
        graph.node_count(),
        graph.edge_count(),
        graph.bins().len()
    );
    Ok(graph)
}

/// Loads a street network, ignoring any score attributes
pub fn load_street_network(path: &Path) -> Result<StreetNetwork, Error> {
    let (network, _) = GraphDocument::read(path)?.into_network()?;
    Ok(network)
}

pub fn save_road_graph(graph: &RoadGraph, path: &Path, prefix: &str) -> Result<(), Error> {
    GraphDocument::from_graph(graph, prefix).write(path)?;
    info!("Saved road graph to {}", path.display());
    Ok(())
}
