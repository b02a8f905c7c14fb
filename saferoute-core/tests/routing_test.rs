mod common;

use std::sync::Arc;

use petgraph::graph::NodeIndex;
use saferoute_core::loading::road_graph_from_document;
use saferoute_core::prelude::*;
use serde_json::json;

use common::{node_position, undirected_graph};

/// A-B-C-D chain plus a direct A-C edge. In bin "08" the chain is safer,
/// in bin "20" the direct edge is.
fn diamond() -> RoadGraph {
    let nodes: Vec<_> = (0..4)
        .map(|i| {
            let (lat, lon) = node_position(i);
            json!({"id": 100 + i, "y": lat, "x": lon})
        })
        .collect();
    let mut edges = Vec::new();
    for (from, to, day, night) in [(0, 1, 1, 4), (1, 2, 1, 4), (2, 3, 1, 1), (0, 2, 5, 2)] {
        for (u, v) in [(from, to), (to, from)] {
            edges.push(json!({
                "u": 100 + u,
                "v": 100 + v,
                "risk_08": day.to_string(),
                "risk_20": night.to_string(),
            }));
        }
    }
    let document = serde_json::from_value(json!({"nodes": nodes, "edges": edges})).unwrap();
    road_graph_from_document(document).unwrap()
}

fn near(i: usize) -> String {
    let (lat, lon) = node_position(i);
    format!("{},{}", lat + 0.0001, lon)
}

#[test]
fn end_to_end_morning_route_avoids_risky_shortcut() {
    let router = Router::new(Arc::new(diamond()), RouterConfig::default());
    let query = RouteQuery::parse(Some(&near(0)), Some(&near(3)), Some("08:45:00")).unwrap();

    let route = router.find_safest_route(&query).unwrap();
    assert_eq!(route.time_bin, "08");
    assert_eq!(route.nodes, vec![100, 101, 102, 103]);
    assert_eq!(route.total_risk, 3.0);
    assert_eq!(route.coordinates.len(), 4);
    assert_eq!(route.coordinates[3], node_position(3));
}

#[test]
fn end_to_end_night_route_uses_shortcut() {
    let router = Router::new(Arc::new(diamond()), RouterConfig::default());
    let query = RouteQuery::parse(Some(&near(0)), Some(&near(3)), Some("23:10:00")).unwrap();

    let route = router.find_safest_route(&query).unwrap();
    assert_eq!(route.time_bin, "20");
    assert_eq!(route.nodes, vec![100, 102, 103]);
    assert_eq!(route.total_risk, 3.0);
}

#[test]
fn hours_before_first_bin_use_earliest_bin() {
    let router = Router::new(Arc::new(diamond()), RouterConfig::default());
    let query = RouteQuery::parse(Some(&near(0)), Some(&near(3)), Some("03:00:00")).unwrap();
    assert_eq!(router.find_safest_route(&query).unwrap().time_bin, "08");
}

#[test]
fn endpoints_snapping_to_one_node_give_single_node_route() {
    let router = Router::new(Arc::new(diamond()), RouterConfig::default());
    let query = RouteQuery::parse(Some(&near(2)), Some(&near(2)), Some("12:00:00")).unwrap();
    let route = router.find_safest_route(&query).unwrap();
    assert_eq!(route.nodes, vec![102]);
    assert_eq!(route.total_risk, 0.0);
}

#[test]
fn snap_distance_cap_rejects_out_of_coverage_queries() {
    let config = RouterConfig {
        max_snap_distance_m: Some(500.0),
        ..RouterConfig::default()
    };
    let router = Router::new(Arc::new(diamond()), config);

    let query = RouteQuery::parse(Some(&near(0)), Some("40.7,-74.0"), Some("12:00:00")).unwrap();
    assert!(matches!(
        router.find_safest_route(&query),
        Err(Error::OutOfCoverageSnap { .. })
    ));
}

#[test]
fn disjoint_components_report_no_path() {
    let graph = undirected_graph(4, &[(0, 1, 1.0), (2, 3, 1.0)], "08");
    let router = Router::new(Arc::new(graph), RouterConfig::default());
    let query = RouteQuery::parse(Some(&near(0)), Some(&near(3)), Some("09:00:00")).unwrap();
    assert!(matches!(
        router.find_safest_route(&query),
        Err(Error::NoPathFound)
    ));
}

#[test]
fn concurrent_requests_share_one_graph() {
    let router = Router::new(Arc::new(diamond()), RouterConfig::default());
    let query = RouteQuery::parse(Some(&near(0)), Some(&near(3)), Some("08:00:00")).unwrap();
    let expected = router.find_safest_route(&query).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let router = router.clone();
                let query = query.clone();
                scope.spawn(move || router.find_safest_route(&query).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
    assert_eq!(Arc::strong_count(router.graph()), 1);
}

/// Deterministic pseudo-random generator for graph fixtures
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn minimum_by_enumeration(
    adjacency: &[Vec<(usize, f64)>],
    node: usize,
    target: usize,
    visited: &mut Vec<bool>,
    cost: f64,
    best: &mut Option<f64>,
) {
    if node == target {
        *best = Some(best.map_or(cost, |b: f64| b.min(cost)));
        return;
    }
    visited[node] = true;
    for &(next, weight) in &adjacency[node] {
        if !visited[next] {
            minimum_by_enumeration(adjacency, next, target, visited, cost + weight, best);
        }
    }
    visited[node] = false;
}

#[test]
fn planner_matches_exhaustive_enumeration() {
    let mut rng = Lcg(42);

    for _ in 0..25 {
        let node_count = 4 + rng.next(6) as usize;
        let mut edges = Vec::new();
        for from in 0..node_count {
            for to in from + 1..node_count {
                if rng.next(100) < 40 {
                    edges.push((from, to, rng.next(10) as f64));
                }
            }
        }
        if edges.is_empty() {
            continue;
        }
        let graph = undirected_graph(node_count, &edges, "00");

        let mut adjacency = vec![Vec::new(); node_count];
        for &(from, to, weight) in &edges {
            adjacency[from].push((to, weight));
            adjacency[to].push((from, weight));
        }

        for source in 0..node_count {
            for target in 0..node_count {
                let mut best = None;
                let mut visited = vec![false; node_count];
                minimum_by_enumeration(&adjacency, source, target, &mut visited, 0.0, &mut best);

                let result = plan_route(
                    &graph,
                    NodeIndex::new(source),
                    NodeIndex::new(target),
                    "00",
                    SearchLimits::default(),
                );
                match (best, result) {
                    (Some(expected), Ok(route)) => {
                        assert_eq!(route.total_risk, expected, "{source} -> {target}");
                        assert_eq!(route.nodes.first(), Some(&(source as NodeId)));
                        assert_eq!(route.nodes.last(), Some(&(target as NodeId)));
                    }
                    (None, Err(Error::NoPathFound)) => {}
                    (expected, result) => {
                        panic!("{source} -> {target}: expected {expected:?}, got {result:?}")
                    }
                }
            }
        }
    }
}
