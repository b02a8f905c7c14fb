//! Minimum-risk path search over a [`RoadGraph`]

use std::{
    collections::BinaryHeap,
    time::{Duration, Instant},
};

use hashbrown::{HashMap, hash_map::Entry};
use log::{debug, trace};
use petgraph::{graph::NodeIndex, visit::EdgeRef};
use serde::Serialize;

use super::state::State;
use crate::{Error, NodeId, RiskScore, RoadGraph};

/// How many frontier pops happen between two deadline checks
const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Lower bound on the risk still to be collected between `node` and `target`.
///
/// Implementations must be admissible and consistent with respect to the
/// risk metric of `bin`. Physical distance does not bound risk and must not
/// be used here.
pub trait RiskHeuristic {
    fn estimate(&self, graph: &RoadGraph, node: NodeIndex, target: NodeIndex, bin: usize)
    -> RiskScore;
}

/// Uninformed search: plain Dijkstra on accumulated risk
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl RiskHeuristic for ZeroHeuristic {
    fn estimate(&self, _: &RoadGraph, _: NodeIndex, _: NodeIndex, _: usize) -> RiskScore {
        0.0
    }
}

/// Bounds on a single search
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    fn expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Safest route between two graph nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// OSM ids of the visited nodes, source first
    pub nodes: Vec<NodeId>,
    /// `(lat, lon)` of the visited nodes
    pub coordinates: Vec<(f64, f64)>,
    /// Label of the time bin whose scores were used
    pub time_bin: String,
    /// Sum of the edge scores along the route
    pub total_risk: RiskScore,
}

/// Finds the route with the lowest accumulated risk for bin `bin_label`.
///
/// # Errors
///
/// `BinNotFound` before any search work if the graph has no scores for the
/// bin, `NoPathFound` if `target` is unreachable from `source`,
/// `SearchTimeout` when the deadline in `limits` passes mid-search.
pub fn plan_route(
    graph: &RoadGraph,
    source: NodeIndex,
    target: NodeIndex,
    bin_label: &str,
    limits: SearchLimits,
) -> Result<Route, Error> {
    plan_route_with_heuristic(graph, source, target, bin_label, limits, &ZeroHeuristic)
}

/// [`plan_route`] with an explicit, admissible risk heuristic
pub fn plan_route_with_heuristic<H: RiskHeuristic + ?Sized>(
    graph: &RoadGraph,
    source: NodeIndex,
    target: NodeIndex,
    bin_label: &str,
    limits: SearchLimits,
    heuristic: &H,
) -> Result<Route, Error> {
    let bin = graph.bin_position(bin_label)?;
    if graph.node(source).is_none() || graph.node(target).is_none() {
        return Err(Error::InvalidNodeIndex);
    }

    let (path, total_risk) = if source == target {
        (vec![source], 0.0)
    } else {
        safest_path(graph, source, target, bin, limits, heuristic)?
    };

    debug!(
        "Route of {} nodes with total risk {total_risk} in bin {bin_label}",
        path.len()
    );

    let mut nodes = Vec::with_capacity(path.len());
    let mut coordinates = Vec::with_capacity(path.len());
    for index in path {
        let node = graph.node(index).ok_or(Error::InvalidNodeIndex)?;
        nodes.push(node.id);
        coordinates.push((node.lat(), node.lon()));
    }

    Ok(Route {
        nodes,
        coordinates,
        time_bin: bin_label.to_string(),
        total_risk,
    })
}

/// Best-first search on accumulated risk (+ heuristic). The target counts as
/// reached only when it is popped from the frontier, never when it is first
/// discovered, so a cheaper path still waiting in the frontier always wins.
fn safest_path<H: RiskHeuristic + ?Sized>(
    graph: &RoadGraph,
    source: NodeIndex,
    target: NodeIndex,
    bin: usize,
    limits: SearchLimits,
    heuristic: &H,
) -> Result<(Vec<NodeIndex>, RiskScore), Error> {
    let estimated_nodes = graph.node_count().min(1000);
    let mut costs: HashMap<NodeIndex, RiskScore> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        priority: heuristic.estimate(graph, source, target, bin),
        cost: 0.0,
        node: source,
    });
    costs.insert(source, 0.0);

    let mut pops = 0usize;
    while let Some(State { cost, node, .. }) = heap.pop() {
        if pops % DEADLINE_CHECK_INTERVAL == 0 && limits.expired() {
            debug!("Route search stopped after {pops} expansions: deadline passed");
            return Err(Error::SearchTimeout);
        }
        pops += 1;

        if node == target {
            trace!("Target settled after {pops} expansions");
            return Ok((trace_back(&predecessors, source, target), cost));
        }

        // Stale entry, a cheaper path to this node was already expanded
        if costs.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }

        for edge in graph.graph.edges(node) {
            let next = edge.target();
            let risk = edge.weight().risk(bin).ok_or(Error::InconsistentBins {
                edge: edge.id().index(),
            })?;
            let next_cost = cost + risk;

            let improved = match costs.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    true
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        true
                    } else {
                        false
                    }
                }
            };

            if improved {
                predecessors.insert(next, node);
                heap.push(State {
                    priority: next_cost + heuristic.estimate(graph, next, target, bin),
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    Err(Error::NoPathFound)
}

fn trace_back(
    predecessors: &HashMap<NodeIndex, NodeIndex>,
    source: NodeIndex,
    target: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        match predecessors.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
