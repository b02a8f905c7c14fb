use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use saferoute_core::loading::{load_road_graph, run_aggregation};
use saferoute_core::{AggregationConfig, RouteQuery, Router, RouterConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(version, about = "Time-aware safest-route tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every street segment from historical incidents and write the
    /// annotated graph
    Aggregate {
        /// TOML file with aggregation settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Incident CSV
        #[arg(long)]
        incidents: Option<PathBuf>,
        /// Bare street network JSON
        #[arg(long)]
        network: Option<PathBuf>,
        /// Output graph JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Incident search radius in meters
        #[arg(long)]
        radius: Option<f64>,
        /// Explicit time bin label, may be repeated
        #[arg(long = "bin")]
        bins: Vec<String>,
    },
    /// Find the safest route and print it as JSON
    Route {
        /// Annotated graph JSON
        #[arg(short, long, default_value = "graph.json")]
        graph: PathBuf,
        /// Source as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        source: String,
        /// Destination as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        destination: String,
        /// Departure time, HH:MM:SS
        #[arg(long)]
        time: String,
        /// Reject endpoints farther than this many meters from the network
        #[arg(long)]
        max_snap_distance: Option<f64>,
    },
}

fn read_aggregation_config(path: Option<&Path>) -> CliResult<AggregationConfig> {
    match path {
        Some(path) => Ok(toml::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(AggregationConfig::default()),
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Aggregate {
            config,
            incidents,
            network,
            output,
            radius,
            bins,
        } => {
            let mut config = read_aggregation_config(config.as_deref())?;
            if let Some(incidents) = incidents {
                config.incidents_path = incidents;
            }
            if let Some(network) = network {
                config.graph_path = network;
            }
            if let Some(output) = output {
                config.output_path = output;
            }
            if let Some(radius) = radius {
                config.radius_m = radius;
            }
            if !bins.is_empty() {
                config.bins = Some(bins);
            }

            let graph = run_aggregation(&config)?;
            info!(
                "Wrote {} edges in {} time bins to {}",
                graph.edge_count(),
                graph.bins().len(),
                config.output_path.display()
            );
        }
        Command::Route {
            graph,
            source,
            destination,
            time,
            max_snap_distance,
        } => {
            let query = RouteQuery::parse(Some(&source), Some(&destination), Some(&time))?;
            let config = RouterConfig {
                graph_path: graph,
                max_snap_distance_m: max_snap_distance,
                ..RouterConfig::default()
            };
            let road_graph = load_road_graph(&config.graph_path)?;
            let router = Router::new(Arc::new(road_graph), config);

            let route = router.find_safest_route(&query)?;
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
    }

    Ok(())
}
