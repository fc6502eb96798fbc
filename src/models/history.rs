// Results handed to history consumers and to refresh callers

use chrono::TimeDelta;
use serde::Serialize;

use super::AggregateRecord;
use crate::history_repo::CodecKind;

/// Recent history for trend consumers. `NoData` means nothing is stored at all and is
/// distinct from a short (or, for `n == 0`, empty) tail of a populated log.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotHistory {
    NoData,
    /// Oldest first.
    Records(Vec<AggregateRecord>),
}

impl SnapshotHistory {
    pub fn len(&self) -> usize {
        match self {
            Self::NoData => 0,
            Self::Records(r) => r.len(),
        }
    }

    /// True only for `NoData`.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// At least two points are needed to draw a trend.
    pub fn is_trend_ready(&self) -> bool {
        self.len() >= 2
    }

    pub fn records(&self) -> &[AggregateRecord] {
        match self {
            Self::NoData => &[],
            Self::Records(r) => r,
        }
    }

    pub fn into_records(self) -> Vec<AggregateRecord> {
        match self {
            Self::NoData => Vec::new(),
            Self::Records(r) => r,
        }
    }
}

/// What a single `record_snapshot_if_due` call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RecordOutcome {
    /// Appended and persisted with the given codec.
    Recorded { codec: CodecKind },
    /// The last stored record is younger than the sampling interval.
    NotDue {
        #[serde(rename = "elapsedMs", serialize_with = "serialize_elapsed")]
        elapsed: TimeDelta,
    },
    /// Station table was empty; no fill fraction to store.
    SkippedEmptyTable,
    /// Every codec failed to write; retried on the next due call.
    PersistFailed,
}

impl RecordOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

fn serialize_elapsed<S: serde::Serializer>(elapsed: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(elapsed.num_milliseconds())
}
