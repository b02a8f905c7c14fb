//! Radius and nearest-neighbour queries over a fixed set of points.
//!
//! Points are stored as `[lat, lon]` in radians and compared with a flat
//! (chord) metric. A radius of `meters / EARTH_RADIUS_M` then approximates a
//! great-circle neighbourhood. The approximation is fine at sub-kilometer
//! scale and gets worse with larger radii and higher latitudes (longitude
//! differences are not scaled by `cos(lat)`).

use geo::Point;
use rstar::{PointDistance, RTree, primitives::GeomWithData};

use crate::EARTH_RADIUS_M;

/// Index entry: radian coordinates plus the position of the source point
pub type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Converts a real-world distance to the angular radius used by the index
pub fn angular_radius(meters: f64) -> f64 {
    meters / EARTH_RADIUS_M
}

fn to_radians(point: Point<f64>) -> [f64; 2] {
    [point.y().to_radians(), point.x().to_radians()]
}

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Builds the index. Entry data is the position of each point in the
    /// input sequence.
    pub fn build(points: impl IntoIterator<Item = Point<f64>>) -> Self {
        let entries = points
            .into_iter()
            .enumerate()
            .map(|(position, point)| GeomWithData::new(to_radians(point), position))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Positions of all points within the angular `radius` of `point`,
    /// in ascending order
    pub fn query_radius(&self, point: Point<f64>, radius: f64) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance(to_radians(point), radius * radius)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }

    /// Same as [`query_radius`](Self::query_radius) with the radius in meters
    pub fn query_radius_m(&self, point: Point<f64>, meters: f64) -> Vec<usize> {
        self.query_radius(point, angular_radius(meters))
    }

    /// Position of the closest indexed point, `None` for an empty index
    pub fn nearest(&self, point: Point<f64>) -> Option<usize> {
        self.nearest_with_distance(point).map(|(position, _)| position)
    }

    /// Closest indexed point together with its angular (chord) distance
    pub fn nearest_with_distance(&self, point: Point<f64>) -> Option<(usize, f64)> {
        let query = to_radians(point);
        self.tree
            .nearest_neighbor(&query)
            .map(|entry| (entry.data, entry.distance_2(&query).sqrt()))
    }
}
