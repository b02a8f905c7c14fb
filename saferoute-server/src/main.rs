mod api;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use saferoute_core::{Router, loading::load_road_graph};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Serves safest-route queries over a risk-annotated road graph
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Annotated graph JSON, overrides `router.graph_path`
    #[arg(short, long)]
    graph: Option<PathBuf>,
    /// Listen address, overrides `listen`
    #[arg(short, long)]
    listen: Option<SocketAddr>,
    /// Reject endpoints farther than this many meters from the network
    #[arg(long)]
    max_snap_distance: Option<f64>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, Box<dyn std::error::Error + Send + Sync>> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(graph) = self.graph {
            config.router.graph_path = graph;
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if self.max_snap_distance.is_some() {
            config.router.max_snap_distance_m = self.max_snap_distance;
        }
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_config()?;

    let graph_path = config.router.graph_path.clone();
    info!("Loading graph from {}", graph_path.display());
    let graph = tokio::task::spawn_blocking(move || load_road_graph(&graph_path)).await??;
    info!(
        "Graph ready: {} nodes, {} edges, {} time bins",
        graph.node_count(),
        graph.edge_count(),
        graph.bins().len()
    );

    let router = Router::new(Arc::new(graph), config.router.clone());
    let app = api::app(router, config.request_timeout(), config.concurrency_limit);

    let listener = TcpListener::bind(config.listen).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
