// Feed client: GBFS merge rules and TTL caching against a local fake upstream

mod common;

use bikeshare_history::feed::{
    FeedClient, StationInformation, StationSource, StationStatus, merge_stations, percent_full,
};
use common::{fake_upstream, feed_config};
use serde_json::json;
use std::sync::atomic::Ordering;

fn info(id: &str, capacity: Option<u32>) -> StationInformation {
    StationInformation {
        station_id: id.into(),
        name: format!("Station {id}"),
        lat: 40.7,
        lng: -74.0,
        capacity,
    }
}

fn status(id: &str, bikes: u32, docks: u32, installed: Option<bool>) -> StationStatus {
    StationStatus {
        station_id: id.into(),
        num_bikes_available: Some(bikes),
        num_docks_available: Some(docks),
        is_installed: installed,
        last_reported: Some(1_748_779_200),
    }
}

#[test]
fn percent_full_uses_capacity_then_falls_back() {
    assert_eq!(percent_full(5, 5, Some(20)), 0.25);
    assert_eq!(percent_full(3, 1, None), 0.75);
    assert_eq!(percent_full(0, 0, None), 0.0);
    assert_eq!(percent_full(4, 0, Some(0)), 1.0);
    assert_eq!(percent_full(30, 0, Some(20)), 1.0);
}

#[test]
fn merge_left_joins_information_onto_status() {
    let information = vec![info("a", Some(10)), info("b", None), info("c", Some(8))];
    let statuses = vec![status("a", 4, 6, Some(true)), status("b", 1, 3, Some(false))];

    let merged = merge_stations(&information, &statuses);
    assert_eq!(merged.len(), 3);

    assert_eq!(merged[0].station_id, "a");
    assert_eq!(merged[0].num_bikes_available, 4);
    assert_eq!(merged[0].percent_full, 0.4);
    assert_eq!(merged[0].is_installed, Some(true));
    assert!(merged[0].last_reported.is_some());

    assert_eq!(merged[1].percent_full, 0.25);
    assert_eq!(merged[1].is_installed, Some(false));

    // No status row: zero counts, no flag.
    assert_eq!(merged[2].num_bikes_available, 0);
    assert_eq!(merged[2].num_docks_available, 0);
    assert_eq!(merged[2].percent_full, 0.0);
    assert_eq!(merged[2].is_installed, None);
}

#[test]
fn gbfs_documents_deserialize_with_lon_and_int_flags() {
    let info: StationInformation = serde_json::from_value(json!({
        "station_id": 72, "name": "W 52 St", "lat": 40.76, "lon": -73.99, "capacity": 55
    }))
    .unwrap();
    assert_eq!(info.station_id, "72");
    assert_eq!(info.lng, -73.99);

    let st: StationStatus = serde_json::from_value(json!({
        "station_id": "72", "num_bikes_available": 3, "num_docks_available": 50,
        "is_installed": 1, "last_reported": 1748779200
    }))
    .unwrap();
    assert_eq!(st.is_installed, Some(true));

    let st: StationStatus = serde_json::from_value(json!({ "station_id": "73" })).unwrap();
    assert_eq!(st.num_bikes_available, None);
    assert_eq!(st.is_installed, None);
}

#[tokio::test]
async fn client_fetches_and_merges_feed() {
    let (base, _hits) = fake_upstream().await;
    let client = FeedClient::new(&feed_config(&base)).unwrap();

    let stations = client.stations().await.unwrap();
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].name, "One");
    assert_eq!(stations[0].lng, -73.1);
    assert_eq!(stations[0].percent_full, 0.5);
    assert_eq!(stations[1].percent_full, 0.25);
    assert_eq!(stations[1].is_installed, Some(false));
}

#[tokio::test]
async fn client_caches_within_ttl_and_force_refetches() {
    let (base, hits) = fake_upstream().await;
    let client = FeedClient::new(&feed_config(&base)).unwrap();

    client.merged_stations(false).await.unwrap();
    client.merged_stations(false).await.unwrap();
    assert_eq!(hits.information.load(Ordering::SeqCst), 1);
    assert_eq!(hits.status.load(Ordering::SeqCst), 1);

    client.merged_stations(true).await.unwrap();
    assert_eq!(hits.information.load(Ordering::SeqCst), 2);
    assert_eq!(hits.status.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_reports_upstream_errors() {
    let (base, _hits) = fake_upstream().await;
    let mut config = feed_config(&base);
    config.station_status_url = format!("{base}/missing.json");
    let client = FeedClient::new(&config).unwrap();
    assert!(client.merged_stations(false).await.is_err());
}
