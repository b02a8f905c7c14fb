//! Incident CSV parsing

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};
use log::{info, warn};
use serde::Deserialize;

use crate::{Error, Incident};

#[derive(Debug, Deserialize)]
struct IncidentRecord {
    #[serde(alias = "LAT", alias = "latitude", alias = "Latitude")]
    lat: f64,
    #[serde(alias = "LON", alias = "longitude", alias = "Longitude")]
    lon: f64,
    #[serde(alias = "TIME_BIN", alias = "time", alias = "TIME")]
    time_bin: String,
    #[serde(alias = "Risk Level_y", alias = "Risk Level", alias = "RISK_LEVEL")]
    risk_level: String,
}

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Reduces a time or date-time string to its `HH:MM:SS` bin label
pub fn normalize_time_bin(raw: &str) -> Option<String> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|date_time| date_time.time())
        })
        .map(|time| time.format("%H:%M:%S").to_string())
}

/// Accepts integral values written either as `3` or `3.0`
fn parse_risk_level(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|level| level.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(level))
            .map(|level| level as u32)
    })
}

impl IncidentRecord {
    fn into_incident(self) -> Option<Incident> {
        let valid_location = self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon);
        if !valid_location {
            return None;
        }

        Some(Incident::new(
            self.lat,
            self.lon,
            normalize_time_bin(&self.time_bin)?,
            parse_risk_level(&self.risk_level)?,
        ))
    }
}

/// Reads incidents from CSV. Malformed rows are skipped and counted.
pub fn read_incidents<R: Read>(reader: R) -> Result<Vec<Incident>, Error> {
    let mut incidents = Vec::new();
    let mut skipped = 0usize;

    let mut reader = csv::Reader::from_reader(reader);
    reader.headers()?;

    for record in reader.deserialize::<IncidentRecord>() {
        match record.ok().and_then(IncidentRecord::into_incident) {
            Some(incident) => incidents.push(incident),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} malformed incident rows");
    }
    if incidents.is_empty() && skipped > 0 {
        return Err(Error::InvalidData(
            "No valid incident rows (check the column names)".to_string(),
        ));
    }
    incidents.shrink_to_fit();
    Ok(incidents)
}

pub fn load_incidents(path: &Path) -> Result<Vec<Incident>, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open incident file '{}': {}", path.display(), e),
        )
    })?;
    let incidents = read_incidents(file)?;
    info!("Loaded {} incidents from {}", incidents.len(), path.display());
    Ok(incidents)
}
