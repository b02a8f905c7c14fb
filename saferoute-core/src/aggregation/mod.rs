//! Offline aggregation of historical incidents onto road segments.
//!
//! Each time bin is processed independently: incidents of that bin are put
//! into a [`SpatialIndex`](crate::SpatialIndex) and every segment takes the
//! mode of the risk levels found around its midpoint.

mod risk;

pub use risk::{RiskTable, aggregate_risk, compute_score, mode_with_max_tiebreak};
