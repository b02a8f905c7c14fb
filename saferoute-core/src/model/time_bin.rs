//! Time-of-day bins and the resolver that maps a query hour onto them

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveTime, Timelike};

use crate::Error;

/// A discrete interval of the day identified by its label (e.g. `08:00:00`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeBin {
    label: String,
    start_hour: u8,
}

impl TimeBin {
    /// Parses a bin label. The start hour is the integer before the first `:`
    /// (or the whole label when there is none).
    pub fn parse(label: &str) -> Result<Self, Error> {
        let label = label.trim();
        let hour_part = label.split(':').next().unwrap_or(label);
        let start_hour = hour_part
            .parse::<u8>()
            .ok()
            .filter(|hour| *hour < 24)
            .ok_or_else(|| Error::InvalidData(format!("Invalid time bin label '{label}'")))?;

        Ok(Self {
            label: label.to_string(),
            start_hour,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }
}

impl Ord for TimeBin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_hour
            .cmp(&other.start_hour)
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for TimeBin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Sorted, deduplicated and non-empty set of time bins known to a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBinSet {
    bins: Vec<TimeBin>,
}

impl TimeBinSet {
    pub fn new(bins: impl IntoIterator<Item = TimeBin>) -> Result<Self, Error> {
        let mut bins: Vec<TimeBin> = bins.into_iter().collect();
        bins.sort();
        bins.dedup();

        if bins.is_empty() {
            return Err(Error::InvalidData("Time bin set is empty".to_string()));
        }
        Ok(Self { bins })
    }

    pub fn from_labels<I, S>(labels: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bins = labels
            .into_iter()
            .map(|label| TimeBin::parse(label.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(bins)
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeBin> {
        self.bins.iter()
    }

    pub fn get(&self, position: usize) -> Option<&TimeBin> {
        self.bins.get(position)
    }

    /// Position of the bin with the given label
    pub fn position(&self, label: &str) -> Option<usize> {
        self.bins.iter().position(|bin| bin.label == label)
    }

    /// Bin an incident labelled `label` belongs to: the bin with exactly
    /// that label, otherwise the first bin starting in the same hour
    /// (`08:00:00` incidents count towards an `08` bin)
    pub fn match_label(&self, label: &str) -> Option<usize> {
        self.position(label).or_else(|| {
            let start_hour = TimeBin::parse(label).ok()?.start_hour;
            self.bins.iter().position(|bin| bin.start_hour == start_hour)
        })
    }

    /// Returns the position of the latest bin starting at or before `hour`.
    /// Hours that precede every bin fall back to the earliest bin.
    pub fn resolve(&self, hour: u8) -> usize {
        self.bins
            .partition_point(|bin| bin.start_hour <= hour)
            .saturating_sub(1)
    }

    /// Bin whose scores apply at `hour`
    pub fn bin_at(&self, hour: u8) -> &TimeBin {
        &self.bins[self.resolve(hour)]
    }

    /// Resolves a wall-clock `HH:MM:SS` string to a bin
    pub fn resolve_time(&self, time: &str) -> Result<&TimeBin, Error> {
        Ok(self.bin_at(parse_hour(time)?))
    }
}

/// Extracts the hour from an `HH:MM:SS` (or `HH:MM`) wall-clock string
pub fn parse_hour(time: &str) -> Result<u8, Error> {
    let time = time.trim();
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map(|parsed| parsed.hour() as u8)
        .map_err(|e| Error::InvalidInput(format!("Invalid time '{time}': {e}")))
}
