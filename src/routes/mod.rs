// HTTP routes

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::feed::FeedClient;
use crate::recorder::SnapshotRecorder;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) feed: Arc<FeedClient>,
    pub(crate) recorder: Arc<SnapshotRecorder>,
    pub(crate) config: AppConfig,
}

pub fn app(feed: Arc<FeedClient>, recorder: Arc<SnapshotRecorder>, config: AppConfig) -> Router {
    let state = AppState {
        feed,
        recorder,
        config,
    };
    Router::new()
        .route("/", get(|| async { "bikeshare-history: snapshot recorder is running" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/history", get(http::history_handler)) // GET /api/history?n=
        .route("/api/stations", get(http::stations_handler)) // GET /api/stations?refresh=
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
