// Background poller: each tick fetches the merged station table and offers it to the
// recorder. The recorder's gate decides whether anything is written.

use crate::feed::StationSource;
use crate::models::RecordOutcome;
use crate::recorder::SnapshotRecorder;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, interval};
use tracing::Instrument;

/// Source, recorder and shutdown for the worker.
pub struct WorkerDeps<S> {
    pub source: Arc<S>,
    pub recorder: Arc<SnapshotRecorder>,
    pub stats: Arc<WorkerStats>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub refresh_interval: Duration,
    /// How often to log app stats (real time).
    pub stats_log_interval: Duration,
}

/// Counters shared with whoever wants to report them.
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub cycles_total: AtomicU64,
    pub snapshots_recorded_total: AtomicU64,
    pub fetch_failures_total: AtomicU64,
    pub persist_failures_total: AtomicU64,
}

impl WorkerStats {
    fn observe(&self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Recorded { .. } => {
                self.snapshots_recorded_total.fetch_add(1, Ordering::Relaxed);
            }
            RecordOutcome::PersistFailed => {
                self.persist_failures_total.fetch_add(1, Ordering::Relaxed);
            }
            RecordOutcome::NotDue { .. } | RecordOutcome::SkippedEmptyTable => {}
        }
    }
}

pub fn spawn<S: StationSource>(
    deps: WorkerDeps<S>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        source,
        recorder,
        stats,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        refresh_interval,
        stats_log_interval,
    } = config;

    let refresh_ms = refresh_interval.as_millis() as u64;
    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", refresh_ms);

    tokio::spawn(async move {
        let mut tick = interval(refresh_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First stats tick fires immediately; nothing to report yet.
        stats_log_tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    stats.cycles_total.fetch_add(1, Ordering::Relaxed);
                    let stations = match source.stations().await {
                        Ok(s) => s,
                        Err(e) => {
                            stats.fetch_failures_total.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(
                                error = %e,
                                operation = "fetch_stations",
                                "station feed fetch failed"
                            );
                            continue;
                        }
                    };
                    let outcome = recorder.record_snapshot_if_due(&stations).await;
                    stats.observe(&outcome);
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        cycles_total = stats.cycles_total.load(Ordering::Relaxed),
                        snapshots_recorded_total = stats.snapshots_recorded_total.load(Ordering::Relaxed),
                        fetch_failures_total = stats.fetch_failures_total.load(Ordering::Relaxed),
                        persist_failures_total = stats.persist_failures_total.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
    }
    .instrument(worker_span))
}
