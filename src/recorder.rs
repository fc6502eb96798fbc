// Snapshot recorder: the refresh-cycle entry points over HistoryStore.
// Constructed once per process and shared by Arc; appends are serialised in-process.

use std::sync::Arc;

use chrono::TimeDelta;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::clock::Clock;
use crate::history_repo::aggregation::build_aggregate;
use crate::history_repo::gate::{self, GateDecision};
use crate::history_repo::{HistoryStore, reader};
use crate::models::{RecordOutcome, SnapshotHistory, StationSnapshot};

pub struct SnapshotRecorder {
    store: Arc<HistoryStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl SnapshotRecorder {
    pub fn new(store: Arc<HistoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Appends one aggregate of `stations` if the last stored sample is at least
    /// one minute old. Empty tables are never stored.
    #[instrument(skip(self, stations), fields(operation = "record_snapshot_if_due", stations = stations.len()))]
    pub async fn record_snapshot_if_due(&self, stations: &[StationSnapshot]) -> RecordOutcome {
        if stations.is_empty() {
            tracing::debug!("empty station table, snapshot skipped");
            return RecordOutcome::SkippedEmptyTable;
        }

        let _guard = self.write_lock.lock().await;
        let loaded = self.store.load().await;
        let now = self.clock.now();
        let decision = gate::evaluate(gate::last_timestamp(&loaded.records), now);
        if let GateDecision::NotDue { elapsed } = decision {
            if elapsed < TimeDelta::zero() {
                tracing::warn!(
                    elapsed_ms = elapsed.num_milliseconds(),
                    "wall clock is behind the last stored snapshot; recording stalls until it catches up"
                );
            }
            return RecordOutcome::NotDue { elapsed };
        }

        let record = build_aggregate(stations, now);
        match self.store.append_loaded(loaded, record).await {
            Ok(codec) => {
                tracing::debug!(%codec, ?decision, "snapshot recorded");
                RecordOutcome::Recorded { codec }
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot not persisted this cycle");
                RecordOutcome::PersistFailed
            }
        }
    }

    /// Last `n` snapshots, oldest first, or `NoData` when nothing is stored.
    #[instrument(skip(self), fields(operation = "get_snapshot_history"))]
    pub async fn get_snapshot_history(&self, n: usize) -> SnapshotHistory {
        let loaded = self.store.load().await;
        if loaded.records.is_empty() {
            return SnapshotHistory::NoData;
        }
        SnapshotHistory::Records(reader::tail_sorted(loaded.records, n))
    }
}
