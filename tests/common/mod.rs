// Shared test helpers
#![allow(dead_code)]

use axum::{Json, Router, extract::State, routing::get};
use bikeshare_history::config::FeedConfig;
use bikeshare_history::models::*;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn station(id: &str, bikes: u32, docks: u32, is_installed: Option<bool>) -> StationSnapshot {
    let cap = (bikes + docks).max(1);
    StationSnapshot {
        station_id: id.into(),
        name: format!("Station {id}"),
        lat: 40.7,
        lng: -74.0,
        num_bikes_available: bikes,
        num_docks_available: docks,
        capacity: Some(bikes + docks),
        percent_full: bikes as f64 / cap as f64,
        is_installed,
        last_reported: None,
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn record(timestamp: DateTime<Utc>, total_bikes: u64) -> AggregateRecord {
    AggregateRecord {
        timestamp,
        total_bikes,
        total_docks: 200,
        active_stations: 10,
        avg_percent_full: 0.25,
    }
}

#[derive(Clone, Default)]
pub struct Hits {
    pub information: Arc<AtomicUsize>,
    pub status: Arc<AtomicUsize>,
}

async fn information_doc(State(hits): State<Hits>) -> Json<serde_json::Value> {
    hits.information.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "last_updated": 1748779200,
        "ttl": 5,
        "data": { "stations": [
            { "station_id": "1", "name": "One", "lat": 40.1, "lon": -73.1, "capacity": 10 },
            { "station_id": "2", "name": "Two", "lat": 40.2, "lon": -73.2, "capacity": 4 }
        ]}
    }))
}

async fn status_doc(State(hits): State<Hits>) -> Json<serde_json::Value> {
    hits.status.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "last_updated": 1748779200,
        "ttl": 5,
        "data": { "stations": [
            { "station_id": "1", "num_bikes_available": 5, "num_docks_available": 5, "is_installed": 1, "last_reported": 1748779100 },
            { "station_id": "2", "num_bikes_available": 1, "num_docks_available": 3, "is_installed": 0, "last_reported": 1748779150 }
        ]}
    }))
}

/// Local GBFS upstream with two stations; counts requests per document.
pub async fn fake_upstream() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/station_information.json", get(information_doc))
        .route("/station_status.json", get(status_doc))
        .with_state(hits.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), hits)
}

pub fn feed_config(base: &str) -> FeedConfig {
    FeedConfig {
        station_information_url: format!("{base}/station_information.json"),
        station_status_url: format!("{base}/station_status.json"),
        request_timeout_secs: 5,
        information_ttl_secs: 60,
        status_ttl_secs: 30,
    }
}
