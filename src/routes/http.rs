// GET handlers: version, history, stations

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::{AggregateRecord, RecordOutcome, SnapshotHistory, StationSnapshot};
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    n: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    status: &'static str,
    trend_ready: bool,
    records: Vec<AggregateRecord>,
}

/// GET /api/history — most recent snapshots, oldest first. `status` is "collecting" when
/// nothing has been recorded yet.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let n = q.n.unwrap_or(state.config.history.default_limit);
    let history = state.recorder.get_snapshot_history(n).await;
    let status = match history {
        SnapshotHistory::NoData => "collecting",
        SnapshotHistory::Records(_) => "ok",
    };
    Json(HistoryResponse {
        status,
        trend_ready: history.is_trend_ready(),
        records: history.into_records(),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct StationsQuery {
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StationsResponse {
    snapshot: RecordOutcome,
    stations: Vec<StationSnapshot>,
}

/// GET /api/stations — live merged table. Each call is a refresh event and may record a snapshot.
pub(super) async fn stations_handler(
    State(state): State<AppState>,
    Query(q): Query<StationsQuery>,
) -> impl IntoResponse {
    match state.feed.merged_stations(q.refresh).await {
        Ok(stations) => {
            let snapshot = state.recorder.record_snapshot_if_due(&stations).await;
            Json(StationsResponse { snapshot, stations }).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "merged_stations", "station feed fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
