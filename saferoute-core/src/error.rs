use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Time bin '{0}' not found in graph edges")]
    BinNotFound(String),
    #[error("No path found between the requested nodes")]
    NoPathFound,
    #[error("Graph has no nodes or no edges")]
    EmptyGraph,
    #[error("Nearest graph node is {distance_m:.0} m away (limit {max_m:.0} m)")]
    OutOfCoverageSnap { distance_m: f64, max_m: f64 },
    #[error("Edge {edge} does not carry the same time bins as the rest of the graph")]
    InconsistentBins { edge: usize },
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Route search exceeded its deadline")]
    SearchTimeout,
    #[error("Unrecoverable error: {0}")]
    UnrecoverableError(&'static str),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
