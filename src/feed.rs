// GBFS feed client: station_information + station_status, each cached for its own TTL,
// merged into one StationSnapshot row per station.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::instrument;

use crate::config::FeedConfig;
use crate::models::StationSnapshot;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Anything that can produce a fresh merged station table.
pub trait StationSource: Send + Sync + 'static {
    fn stations(&self) -> impl Future<Output = Result<Vec<StationSnapshot>, FeedError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GbfsEnvelope<T> {
    data: GbfsStations<T>,
}

#[derive(Debug, Deserialize)]
struct GbfsStations<T> {
    stations: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationInformation {
    #[serde(deserialize_with = "deserialize_id")]
    pub station_id: String,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationStatus {
    #[serde(deserialize_with = "deserialize_id")]
    pub station_id: String,
    #[serde(default)]
    pub num_bikes_available: Option<u32>,
    #[serde(default)]
    pub num_docks_available: Option<u32>,
    /// GBFS 1.x publishes 0/1, 2.x+ publishes booleans.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_installed: Option<bool>,
    /// Unix seconds.
    #[serde(default)]
    pub last_reported: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Int(i64),
}

fn deserialize_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match IdRepr::deserialize(d)? {
        IdRepr::Str(s) => s,
        IdRepr::Int(i) => i.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

fn deserialize_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(Option::<FlagRepr>::deserialize(d)?.map(|f| match f {
        FlagRepr::Bool(b) => b,
        FlagRepr::Int(i) => i != 0,
    }))
}

/// Left join of station metadata onto live status by `station_id`.
/// Stations without a status row report zero bikes and docks.
pub fn merge_stations(
    information: &[StationInformation],
    status: &[StationStatus],
) -> Vec<StationSnapshot> {
    let by_id: HashMap<&str, &StationStatus> =
        status.iter().map(|s| (s.station_id.as_str(), s)).collect();

    information
        .iter()
        .map(|info| {
            let st = by_id.get(info.station_id.as_str());
            let bikes = st.and_then(|s| s.num_bikes_available).unwrap_or(0);
            let docks = st.and_then(|s| s.num_docks_available).unwrap_or(0);
            StationSnapshot {
                station_id: info.station_id.clone(),
                name: info.name.clone(),
                lat: info.lat,
                lng: info.lng,
                num_bikes_available: bikes,
                num_docks_available: docks,
                capacity: info.capacity,
                percent_full: percent_full(bikes, docks, info.capacity),
                is_installed: st.and_then(|s| s.is_installed),
                last_reported: st
                    .and_then(|s| s.last_reported)
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            }
        })
        .collect()
}

/// Capacity falls back to bikes + docks; zero capacity counts as one dock.
pub fn percent_full(bikes: u32, docks: u32, capacity: Option<u32>) -> f64 {
    let cap = capacity.unwrap_or(bikes.saturating_add(docks)).max(1);
    (bikes as f64 / cap as f64).clamp(0.0, 1.0)
}

struct Cached<T> {
    fetched_at: Instant,
    value: Arc<Vec<T>>,
}

type Slot<T> = RwLock<Option<Cached<T>>>;

pub struct FeedClient {
    client: Client,
    information_url: String,
    status_url: String,
    information_ttl: Duration,
    status_ttl: Duration,
    information: Slot<StationInformation>,
    status: Slot<StationStatus>,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            client,
            information_url: config.station_information_url.clone(),
            status_url: config.station_status_url.clone(),
            information_ttl: Duration::from_secs(config.information_ttl_secs),
            status_ttl: Duration::from_secs(config.status_ttl_secs),
            information: RwLock::new(None),
            status: RwLock::new(None),
        })
    }

    pub async fn clear_cache(&self) {
        *self.information.write().await = None;
        *self.status.write().await = None;
    }

    /// Fresh merged table; `force` drops both cached documents first.
    #[instrument(skip(self), fields(operation = "merged_stations"))]
    pub async fn merged_stations(&self, force: bool) -> Result<Vec<StationSnapshot>, FeedError> {
        if force {
            self.clear_cache().await;
        }
        let information = self
            .cached(&self.information, &self.information_url, self.information_ttl)
            .await?;
        let status = self
            .cached(&self.status, &self.status_url, self.status_ttl)
            .await?;
        Ok(merge_stations(&information, &status))
    }

    async fn cached<T: DeserializeOwned>(
        &self,
        slot: &Slot<T>,
        url: &str,
        ttl: Duration,
    ) -> Result<Arc<Vec<T>>, FeedError> {
        {
            let guard = slot.read().await;
            if let Some(c) = guard.as_ref()
                && c.fetched_at.elapsed() < ttl
            {
                return Ok(c.value.clone());
            }
        }
        let envelope: GbfsEnvelope<T> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let value = Arc::new(envelope.data.stations);
        tracing::debug!(url, stations = value.len(), "feed document fetched");
        *slot.write().await = Some(Cached {
            fetched_at: Instant::now(),
            value: value.clone(),
        });
        Ok(value)
    }
}

impl StationSource for FeedClient {
    async fn stations(&self) -> Result<Vec<StationSnapshot>, FeedError> {
        self.merged_stations(false).await
    }
}
