#![allow(dead_code)]

use saferoute_core::loading::road_graph_from_document;
use saferoute_core::prelude::*;
use serde_json::{Value, json};

/// Node `i` sits at `(34.0 + i * 0.01, -118.0)`, ~1.1 km apart
pub fn node_position(i: usize) -> (f64, f64) {
    (34.0 + i as f64 * 0.01, -118.0)
}

/// Undirected graph from `(from, to, risk)` triples in a single bin `label`
pub fn undirected_graph(node_count: usize, edges: &[(usize, usize, f64)], label: &str) -> RoadGraph {
    let nodes: Vec<Value> = (0..node_count)
        .map(|i| {
            let (lat, lon) = node_position(i);
            json!({"id": i, "y": lat, "x": lon})
        })
        .collect();
    let attribute = format!("risk_{label}");
    let edges: Vec<Value> = edges
        .iter()
        .flat_map(|&(from, to, risk)| {
            [
                json!({"u": from, "v": to, attribute.as_str(): risk}),
                json!({"u": to, "v": from, attribute.as_str(): risk}),
            ]
        })
        .collect();

    let document = serde_json::from_value(json!({"nodes": nodes, "edges": edges})).unwrap();
    road_graph_from_document(document).unwrap()
}
