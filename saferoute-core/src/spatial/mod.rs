//! Spatial lookups: radius queries for incident aggregation and nearest-node
//! snapping for route requests

mod index;
mod locator;

pub use index::{IndexedPoint, SpatialIndex, angular_radius};
pub use locator::{NearestNodeLocator, Snap};
