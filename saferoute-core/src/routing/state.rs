use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

use crate::RiskScore;

/// Frontier entry. `priority` is the accumulated risk plus the heuristic
/// estimate, `cost` the accumulated risk alone.
#[derive(Copy, Clone, Debug)]
pub(super) struct State {
    pub(super) priority: RiskScore,
    pub(super) cost: RiskScore,
    pub(super) node: NodeIndex,
}

// Min-heap by priority, ties go to the lower node index
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}
