// Due-time gate: at most one stored sample per MIN_SAMPLE_INTERVAL.

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::AggregateRecord;

/// Fixed minimum spacing between stored samples.
pub const MIN_SAMPLE_INTERVAL: TimeDelta = TimeDelta::minutes(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Empty history.
    Bootstrap,
    Due { elapsed: TimeDelta },
    NotDue { elapsed: TimeDelta },
}

impl GateDecision {
    pub fn should_append(&self) -> bool {
        !matches!(self, Self::NotDue { .. })
    }
}

/// Latest timestamp in the log, independent of stored order.
pub fn last_timestamp(records: &[AggregateRecord]) -> Option<DateTime<Utc>> {
    records.iter().map(|r| r.timestamp).max()
}

/// Inclusive at the boundary. A clock that moved backwards is never due.
pub fn evaluate(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> GateDecision {
    let Some(last) = last else {
        return GateDecision::Bootstrap;
    };
    let elapsed = now - last;
    if elapsed >= MIN_SAMPLE_INTERVAL {
        GateDecision::Due { elapsed }
    } else {
        GateDecision::NotDue { elapsed }
    }
}
