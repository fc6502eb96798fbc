// One merged station row as produced by the feed client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Station metadata merged with its live status at fetch time. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSnapshot {
    pub station_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub num_bikes_available: u32,
    pub num_docks_available: u32,
    pub capacity: Option<u32>,
    /// Bikes over capacity, clamped to [0, 1].
    pub percent_full: f64,
    /// `None` when the upstream status document carries no installation flag.
    pub is_installed: Option<bool>,
    pub last_reported: Option<DateTime<Utc>>,
}
