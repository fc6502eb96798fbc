// Network-wide totals at one point in time; the unit of persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRecord {
    pub timestamp: DateTime<Utc>,
    pub total_bikes: u64,
    pub total_docks: u64,
    pub active_stations: u64,
    /// Mean per-station fill fraction. NaN when built from an empty station table.
    pub avg_percent_full: f64,
}

impl AggregateRecord {
    /// True when the record was built from an empty table and carries no usable fill fraction.
    pub fn is_degenerate(&self) -> bool {
        self.avg_percent_full.is_nan()
    }
}
