use geo::{ConvexHull, Intersects, MultiPoint};
use log::info;

use super::config::AggregationConfig;
use super::graph_io::{load_street_network, save_road_graph};
use super::incidents::load_incidents;
use super::SCORE_PREFIXES;
use crate::{
    Error, Incident, RoadGraph, aggregate_risk,
    model::{StreetNetwork, TimeBinSet},
};

/// Runs the offline pipeline: loads the street network and the incidents,
/// aggregates per-bin risk onto every edge and returns the annotated graph
///
/// # Errors
///
/// Returns an error if there are problems reading or processing data
pub fn create_risk_graph(config: &AggregationConfig) -> Result<RoadGraph, Error> {
    validate_config(config)?;

    info!(
        "Processing street network: {}",
        config.graph_path.display()
    );

    // Parse the network in a separate thread while the incidents are read
    let graph_path = config.graph_path.clone();
    let network_handle = std::thread::spawn(move || load_street_network(&graph_path));

    info!("Processing incident data: {}", config.incidents_path.display());
    let incidents = load_incidents(&config.incidents_path)?;

    let network = network_handle
        .join()
        .map_err(|_| Error::UnrecoverableError("Street network loading thread panicked"))??;

    validate_network_incident_overlap(&network, &incidents);

    let bins = match &config.bins {
        Some(labels) => TimeBinSet::from_labels(labels)?,
        None => TimeBinSet::from_labels(incidents.iter().map(|incident| &incident.time_bin))?,
    };
    info!(
        "Aggregating {} incidents onto {} edges in {} time bins (radius {} m)",
        incidents.len(),
        network.edge_count(),
        bins.len(),
        config.radius_m
    );

    let graph = aggregate_risk(&network, &incidents, &bins, config.radius_m).annotate(network)?;
    info!("Risk graph created successfully");
    Ok(graph)
}

/// [`create_risk_graph`] followed by writing the result to
/// `config.output_path`
pub fn run_aggregation(config: &AggregationConfig) -> Result<RoadGraph, Error> {
    let graph = create_risk_graph(config)?;
    save_road_graph(&graph, &config.output_path, &config.attribute_prefix)?;
    Ok(graph)
}

fn validate_config(config: &AggregationConfig) -> Result<(), Error> {
    if !config.incidents_path.exists() {
        return Err(Error::InvalidData(format!(
            "Incident file not found: {}",
            config.incidents_path.display()
        )));
    }

    if !config.graph_path.exists() {
        return Err(Error::InvalidData(format!(
            "Street network file not found: {}",
            config.graph_path.display()
        )));
    }

    if !(config.radius_m.is_finite() && config.radius_m > 0.0) {
        return Err(Error::InvalidData(format!(
            "Search radius must be positive, got {}",
            config.radius_m
        )));
    }

    if config.bins.as_ref().is_some_and(Vec::is_empty) {
        return Err(Error::InvalidData(
            "Explicit time bin list is empty".to_string(),
        ));
    }

    if !SCORE_PREFIXES.contains(&config.attribute_prefix.as_str()) {
        return Err(Error::InvalidData(format!(
            "Unsupported score attribute prefix '{}'",
            config.attribute_prefix
        )));
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn validate_network_incident_overlap(network: &StreetNetwork, incidents: &[Incident]) {
    if incidents.is_empty() {
        return;
    }

    let graph_nodes: MultiPoint = network
        .node_weights()
        .map(|node| node.geometry)
        .collect();
    let graph_hull = graph_nodes.convex_hull();

    let incidents_outside_hull = incidents
        .iter()
        .filter(|incident| !incident.location.intersects(&graph_hull))
        .count();

    let total_incidents = incidents.len();

    let percentage = (incidents_outside_hull as f64 / total_incidents as f64) * 100.0;
    if incidents_outside_hull > 0 {
        log::warn!(
            "{incidents_outside_hull} of {total_incidents} incidents ({percentage:.1}%) are outside \
        the street network coverage area. Only those within the search radius of an edge \
        contribute to its score."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn rejects_invalid_config() {
        let missing = AggregationConfig {
            incidents_path: PathBuf::from("/nonexistent/incidents.csv"),
            ..AggregationConfig::default()
        };
        assert!(matches!(validate_config(&missing), Err(Error::InvalidData(_))));

        let dir = tempfile::tempdir().unwrap();
        let incidents_path = dir.path().join("incidents.csv");
        let graph_path = dir.path().join("network.json");
        std::fs::write(&incidents_path, "lat,lon,time_bin,risk_level\n").unwrap();
        std::fs::write(&graph_path, r#"{"nodes": [], "edges": []}"#).unwrap();

        let base = AggregationConfig {
            incidents_path,
            graph_path,
            ..AggregationConfig::default()
        };
        assert!(validate_config(&base).is_ok());

        let missing_network = AggregationConfig {
            graph_path: dir.path().join("absent.json"),
            ..base.clone()
        };
        assert!(matches!(
            validate_config(&missing_network),
            Err(Error::InvalidData(message)) if message.contains("absent.json")
        ));

        let bad_radius = AggregationConfig {
            radius_m: 0.0,
            ..base.clone()
        };
        assert!(validate_config(&bad_radius).is_err());

        let no_bins = AggregationConfig {
            bins: Some(vec![]),
            ..base.clone()
        };
        assert!(validate_config(&no_bins).is_err());

        let bad_prefix = AggregationConfig {
            attribute_prefix: "danger_".to_string(),
            ..base
        };
        assert!(validate_config(&bad_prefix).is_err());
    }
}
