// Recent-history reads for trend consumers.

use super::HistoryStore;
use crate::models::AggregateRecord;
use tracing::instrument;

/// Sorts by timestamp (stable) and keeps the last `n`, oldest first.
pub fn tail_sorted(mut records: Vec<AggregateRecord>, n: usize) -> Vec<AggregateRecord> {
    records.sort_by_key(|r| r.timestamp);
    let skip = records.len().saturating_sub(n);
    records.split_off(skip)
}

impl HistoryStore {
    /// Up to `n` most recent records, oldest first. Empty when there is no readable history.
    #[instrument(skip(self), fields(repo = "history", operation = "recent"))]
    pub async fn recent(&self, n: usize) -> Vec<AggregateRecord> {
        tail_sorted(self.load().await.records, n)
    }
}
