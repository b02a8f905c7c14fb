//! Request pipeline: time bin resolution, endpoint snapping and planning

use std::sync::Arc;

use geo::Point;
use log::debug;

use super::planner::{Route, SearchLimits, plan_route};
use crate::{
    Error, RoadGraph, RouterConfig,
    model::{TimeBin, parse_hour},
    spatial::NearestNodeLocator,
};

/// Validated route request
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    /// Source coordinates (x = lon, y = lat)
    pub source: Point<f64>,
    /// Destination coordinates (x = lon, y = lat)
    pub destination: Point<f64>,
    hour: u8,
}

impl RouteQuery {
    /// Builds a query from `(lat, lon)` pairs and an `HH:MM:SS` time
    pub fn new(source: (f64, f64), destination: (f64, f64), time: &str) -> Result<Self, Error> {
        Ok(Self {
            source: to_point(source)?,
            destination: to_point(destination)?,
            hour: parse_hour(time)?,
        })
    }

    /// Builds a query from raw boundary strings: `"lat,lon"` coordinates and
    /// an `HH:MM:SS` time. Absent or blank values are `MissingInput`.
    pub fn parse(
        source: Option<&str>,
        destination: Option<&str>,
        time: Option<&str>,
    ) -> Result<Self, Error> {
        let source = required(source, "source")?;
        let destination = required(destination, "destination")?;
        let time = required(time, "time")?;

        Self::new(
            parse_coordinate(source)?,
            parse_coordinate(destination)?,
            time,
        )
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, Error> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(Error::MissingInput(name))
}

/// Parses a `"lat,lon"` pair
pub fn parse_coordinate(value: &str) -> Result<(f64, f64), Error> {
    let invalid = || Error::InvalidInput(format!("Expected 'lat,lon', got '{value}'"));

    let (lat, lon) = value.split_once(',').ok_or_else(invalid)?;
    let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok((lat, lon))
}

fn to_point((lat, lon): (f64, f64)) -> Result<Point<f64>, Error> {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
        return Err(Error::InvalidInput(format!("Latitude {lat} out of range")));
    }
    if !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
        return Err(Error::InvalidInput(format!("Longitude {lon} out of range")));
    }
    Ok(Point::new(lon, lat))
}

/// Shared, read-only routing service over one [`RoadGraph`].
///
/// Cloning is cheap and every clone routes against the same graph.
#[derive(Debug, Clone)]
pub struct Router {
    graph: Arc<RoadGraph>,
    config: RouterConfig,
}

impl Router {
    pub fn new(graph: Arc<RoadGraph>, config: RouterConfig) -> Self {
        Self { graph, config }
    }

    pub fn graph(&self) -> &Arc<RoadGraph> {
        &self.graph
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Time bin whose scores apply at `hour`
    pub fn resolve_bin(&self, hour: u8) -> &TimeBin {
        self.graph.bins().bin_at(hour)
    }

    /// Safest route with the configured search timeout
    pub fn find_safest_route(&self, query: &RouteQuery) -> Result<Route, Error> {
        let limits = self
            .config
            .search_timeout()
            .map(SearchLimits::with_timeout)
            .unwrap_or_default();
        self.find_safest_route_with_limits(query, limits)
    }

    pub fn find_safest_route_with_limits(
        &self,
        query: &RouteQuery,
        limits: SearchLimits,
    ) -> Result<Route, Error> {
        let bin = self.resolve_bin(query.hour());

        let locator =
            NearestNodeLocator::new(&self.graph).with_max_distance(self.config.max_snap_distance_m);
        let source = locator.locate(query.source)?;
        let target = locator.locate(query.destination)?;
        debug!(
            "Routing {:?} -> {:?} in bin {bin} (snapped {:.0} m / {:.0} m)",
            source.node, target.node, source.distance_m, target.distance_m
        );

        plan_route(&self.graph, source.node, target.node, bin.label(), limits)
    }
}
