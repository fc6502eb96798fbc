// Integration tests: HTTP endpoints over a temp history file

mod common;

use axum_test::TestServer;
use bikeshare_history::clock::MockClock;
use bikeshare_history::config::{AppConfig, FeedConfig};
use bikeshare_history::feed::FeedClient;
use bikeshare_history::history_repo::HistoryStore;
use bikeshare_history::recorder::SnapshotRecorder;
use bikeshare_history::routes;
use chrono::TimeDelta;
use common::{fake_upstream, feed_config, station, t0};
use std::sync::Arc;
use tempfile::TempDir;

const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "127.0.0.1"

[feed]
station_information_url = "http://127.0.0.1:9/station_information.json"
station_status_url = "http://127.0.0.1:9/station_status.json"
request_timeout_secs = 1

[history]
path = "unused"
default_limit = 3

[polling]
enabled = false
refresh_interval_secs = 0
stats_log_interval_secs = 60
"#;

fn test_app(dir: &TempDir) -> (TestServer, Arc<SnapshotRecorder>, Arc<MockClock>) {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    test_app_with_feed(dir, config.feed.clone())
}

fn test_app_with_feed(
    dir: &TempDir,
    feed_config: FeedConfig,
) -> (TestServer, Arc<SnapshotRecorder>, Arc<MockClock>) {
    let mut config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    config.feed = feed_config;
    let feed = Arc::new(FeedClient::new(&config.feed).unwrap());
    let clock = Arc::new(MockClock::with_time(t0()));
    let store = Arc::new(HistoryStore::new(dir.path().join("snapshots.bin")));
    let recorder = Arc::new(SnapshotRecorder::new(store, clock.clone()));
    let app = routes::app(feed, recorder.clone(), config);
    (TestServer::new(app).unwrap(), recorder, clock)
}

#[tokio::test]
async fn test_root_endpoint() {
    let dir = TempDir::new().unwrap();
    let (server, _, _) = test_app(&dir);
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("bikeshare-history: snapshot recorder is running");
}

#[tokio::test]
async fn test_version_endpoint() {
    let dir = TempDir::new().unwrap();
    let (server, _, _) = test_app(&dir);
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("bikeshare-history")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_history_collecting_when_empty() {
    let dir = TempDir::new().unwrap();
    let (server, _, _) = test_app(&dir);
    let response = server.get("/api/history").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "collecting");
    assert_eq!(json["trendReady"], false);
    assert_eq!(json["records"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_history_returns_recent_records() {
    let dir = TempDir::new().unwrap();
    let (server, recorder, clock) = test_app(&dir);
    for bikes in [10, 20, 30, 40, 50] {
        recorder
            .record_snapshot_if_due(&[station("a", bikes, 5, None)])
            .await;
        clock.advance(TimeDelta::minutes(1));
    }

    // default_limit = 3
    let json: serde_json::Value = server.get("/api/history").await.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["trendReady"], true);
    let bikes: Vec<u64> = json["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["totalBikes"].as_u64().unwrap())
        .collect();
    assert_eq!(bikes, vec![30, 40, 50]);

    let json: serde_json::Value = server.get("/api/history").add_query_param("n", 1).await.json();
    assert_eq!(json["trendReady"], false);
    assert_eq!(json["records"][0]["totalBikes"], 50);
    assert_eq!(json["records"][0]["activeStations"], 1);
}

#[tokio::test]
async fn test_stations_reports_bad_gateway_when_feed_down() {
    let dir = TempDir::new().unwrap();
    let (server, _, _) = test_app(&dir);
    let response = server.get("/api/stations").await;
    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = response.json();
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_history_zero_limit_on_populated_store_is_not_collecting() {
    let dir = TempDir::new().unwrap();
    let (server, recorder, _) = test_app(&dir);
    recorder
        .record_snapshot_if_due(&[station("a", 3, 3, None)])
        .await;

    let json: serde_json::Value = server.get("/api/history").add_query_param("n", 0).await.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["trendReady"], false);
    assert_eq!(json["records"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_stations_refresh_records_once_per_interval() {
    let (base, hits) = fake_upstream().await;
    let dir = TempDir::new().unwrap();
    let (server, _, clock) = test_app_with_feed(&dir, feed_config(&base));

    let response = server.get("/api/stations").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["snapshot"]["outcome"], "recorded");
    assert_eq!(json["snapshot"]["codec"], "columnar");
    assert_eq!(json["stations"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["stations"][0]["percentFull"], 0.5);

    clock.advance(TimeDelta::seconds(10));
    let json: serde_json::Value = server.get("/api/stations").await.json();
    assert_eq!(json["snapshot"]["outcome"], "notDue");
    assert_eq!(json["snapshot"]["elapsedMs"], 10_000);

    // Second call was served from the feed cache.
    assert_eq!(hits.status.load(std::sync::atomic::Ordering::SeqCst), 1);

    let history: serde_json::Value = server.get("/api/history").await.json();
    assert_eq!(history["status"], "ok");
    let records = history["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["totalBikes"], 6);
    assert_eq!(records[0]["totalDocks"], 8);
    assert_eq!(records[0]["activeStations"], 1);
}
