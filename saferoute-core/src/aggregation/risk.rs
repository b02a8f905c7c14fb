use geo::Point;
use itertools::Itertools;
use log::{info, warn};
use rayon::prelude::*;

use crate::{
    Error, Incident, RiskScore, RoadGraph,
    model::{RoadSegment, StreetNetwork, TimeBinSet},
    spatial::{SpatialIndex, angular_radius},
};

/// Risk scores for every (edge, bin) pair of a street network
#[derive(Debug, Clone, PartialEq)]
pub struct RiskTable {
    bins: TimeBinSet,
    /// One column per bin, one entry per edge in edge index order
    columns: Vec<Vec<RiskScore>>,
}

impl RiskTable {
    pub fn bins(&self) -> &TimeBinSet {
        &self.bins
    }

    pub fn column(&self, bin: usize) -> Option<&[RiskScore]> {
        self.columns.get(bin).map(Vec::as_slice)
    }

    pub fn score(&self, edge: usize, bin: usize) -> Option<RiskScore> {
        self.columns.get(bin)?.get(edge).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Attaches the scores to the network they were computed for
    pub fn annotate(self, network: StreetNetwork) -> Result<RoadGraph, Error> {
        let rows = (0..self.edge_count())
            .map(|edge| self.columns.iter().map(|column| column[edge]).collect())
            .collect();
        RoadGraph::from_parts(network, self.bins, rows)
    }
}

/// Computes a score for every edge of `network` in every bin of `bins`.
///
/// Each incident counts towards the bin matched by
/// [`TimeBinSet::match_label`]. Incidents matching no bin are ignored. Bins
/// without incidents score 0 on every edge.
pub fn aggregate_risk(
    network: &StreetNetwork,
    incidents: &[Incident],
    bins: &TimeBinSet,
    radius_m: f64,
) -> RiskTable {
    let midpoints: Vec<Option<Point<f64>>> =
        network.edge_weights().map(RoadSegment::midpoint).collect();

    let degenerate = midpoints.iter().filter(|point| point.is_none()).count();
    if degenerate > 0 {
        warn!("{degenerate} edges have no geometry and will score 0 in every bin");
    }

    let by_bin = incidents
        .iter()
        .filter_map(|incident| {
            bins.match_label(&incident.time_bin)
                .map(|position| (position, incident))
        })
        .into_group_map();

    let matched: usize = by_bin.values().map(Vec::len).sum();
    let unmatched = incidents.len() - matched;
    if matched == 0 && unmatched > 0 {
        warn!(
            "None of the {unmatched} incidents matches a configured time bin, every edge will score 0"
        );
    } else if unmatched > 0 {
        warn!("{unmatched} incidents fall outside the configured time bins");
    }

    let columns = bins
        .iter()
        .enumerate()
        .map(|(position, bin)| {
            info!("Processing risk for time bin: {bin}");
            let bin_incidents = by_bin
                .get(&position)
                .map(Vec::as_slice)
                .unwrap_or_default();
            score_bin(&midpoints, bin_incidents, radius_m)
        })
        .collect();

    RiskTable {
        bins: bins.clone(),
        columns,
    }
}

/// Scores all edges for a single bin. Edges are independent: each one only
/// reads the shared incident index and produces its own entry.
fn score_bin(
    midpoints: &[Option<Point<f64>>],
    incidents: &[&Incident],
    radius_m: f64,
) -> Vec<RiskScore> {
    if incidents.is_empty() {
        return vec![0.0; midpoints.len()];
    }

    let index = SpatialIndex::build(incidents.iter().map(|incident| incident.location));
    let levels: Vec<u32> = incidents.iter().map(|incident| incident.risk_level).collect();
    let radius = angular_radius(radius_m);

    midpoints
        .par_iter()
        .map(|midpoint| {
            midpoint.map_or(0.0, |point| compute_score(&index, &levels, point, radius))
        })
        .collect()
}

/// Mode of the risk levels of incidents within the angular `radius` of
/// `point`, or 0 when there are none. `levels` is indexed like `index`.
pub fn compute_score(
    index: &SpatialIndex,
    levels: &[u32],
    point: Point<f64>,
    radius: f64,
) -> RiskScore {
    let matched = index.query_radius(point, radius);
    mode_with_max_tiebreak(matched.iter().map(|&position| levels[position]))
        .map_or(0.0, f64::from)
}

/// Most frequent value. Among equally frequent values the highest wins.
pub fn mode_with_max_tiebreak(levels: impl IntoIterator<Item = u32>) -> Option<u32> {
    levels
        .into_iter()
        .counts()
        .into_iter()
        .max_by_key(|&(level, count)| (count, level))
        .map(|(level, _)| level)
}
