use geo::Point;

/// Historical incident reduced to what the aggregation needs
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    /// Incident location (x = lon, y = lat)
    pub location: Point<f64>,
    /// Label of the time bin the incident timestamp falls into
    pub time_bin: String,
    /// Ordinal severity class
    pub risk_level: u32,
}

impl Incident {
    pub fn new(lat: f64, lon: f64, time_bin: impl Into<String>, risk_level: u32) -> Self {
        Self {
            location: Point::new(lon, lat),
            time_bin: time_bin.into(),
            risk_level,
        }
    }
}
