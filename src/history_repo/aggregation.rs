// Reduces a full station table to one network-wide AggregateRecord.

use chrono::{DateTime, SubsecRound, Utc};

use crate::models::{AggregateRecord, StationSnapshot};

/// Builds the aggregate for `stations` stamped at `now` (truncated to microseconds,
/// the precision the history codecs keep).
///
/// `active_stations` counts rows flagged installed when any row carries the flag,
/// otherwise every row. `avg_percent_full` is the unweighted mean over all rows and
/// is NaN for an empty table.
pub fn build_aggregate(stations: &[StationSnapshot], now: DateTime<Utc>) -> AggregateRecord {
    let total_bikes = stations
        .iter()
        .map(|s| s.num_bikes_available as u64)
        .sum();
    let total_docks = stations
        .iter()
        .map(|s| s.num_docks_available as u64)
        .sum();

    let has_flag = stations.iter().any(|s| s.is_installed.is_some());
    let active_stations = if has_flag {
        stations
            .iter()
            .filter(|s| s.is_installed == Some(true))
            .count() as u64
    } else {
        stations.len() as u64
    };

    AggregateRecord {
        timestamp: now.trunc_subsecs(6),
        total_bikes,
        total_docks,
        active_stations,
        avg_percent_full: mean_f64(stations.iter().map(|s| s.percent_full)),
    }
}

fn mean_f64(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return f64::NAN;
    }
    sum / (n as f64)
}
