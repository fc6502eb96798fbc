use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_station_information_url")]
    pub station_information_url: String,
    #[serde(default = "default_station_status_url")]
    pub station_status_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Station metadata changes rarely; cached longer than live status.
    #[serde(default = "default_information_ttl_secs")]
    pub information_ttl_secs: u64,
    #[serde(default = "default_status_ttl_secs")]
    pub status_ttl_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            station_information_url: default_station_information_url(),
            station_status_url: default_station_status_url(),
            request_timeout_secs: default_request_timeout_secs(),
            information_ttl_secs: default_information_ttl_secs(),
            status_ttl_secs: default_status_ttl_secs(),
        }
    }
}

fn default_station_information_url() -> String {
    "https://gbfs.citibikenyc.com/gbfs/en/station_information.json".into()
}

fn default_station_status_url() -> String {
    "https://gbfs.citibikenyc.com/gbfs/en/station_status.json".into()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_information_ttl_secs() -> u64 {
    60
}

fn default_status_ttl_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_path")]
    pub path: String,
    /// Snapshots returned by /api/history when `n` is omitted (about 3 hours at 1/min).
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            default_limit: default_history_limit(),
        }
    }
}

fn default_history_path() -> String {
    "data/snapshots.bin".into()
}

fn default_history_limit() -> usize {
    180
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// When false, snapshots are only recorded on GET /api/stations.
    #[serde(default = "default_polling_enabled")]
    pub enabled: bool,
    pub refresh_interval_secs: u64,
    /// How often to log app stats (cycles, snapshots recorded, fetch failures) at INFO level.
    pub stats_log_interval_secs: u64,
}

fn default_polling_enabled() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.feed.station_information_url.is_empty(),
            "feed.station_information_url must be non-empty"
        );
        anyhow::ensure!(
            !self.feed.station_status_url.is_empty(),
            "feed.station_status_url must be non-empty"
        );
        anyhow::ensure!(
            self.feed.request_timeout_secs > 0,
            "feed.request_timeout_secs must be > 0, got {}",
            self.feed.request_timeout_secs
        );
        anyhow::ensure!(
            self.feed.information_ttl_secs > 0,
            "feed.information_ttl_secs must be > 0, got {}",
            self.feed.information_ttl_secs
        );
        anyhow::ensure!(
            self.feed.status_ttl_secs > 0,
            "feed.status_ttl_secs must be > 0, got {}",
            self.feed.status_ttl_secs
        );
        anyhow::ensure!(
            !self.history.path.is_empty(),
            "history.path must be non-empty"
        );
        anyhow::ensure!(
            self.history.default_limit > 0,
            "history.default_limit must be > 0, got {}",
            self.history.default_limit
        );
        if self.polling.enabled {
            anyhow::ensure!(
                self.polling.refresh_interval_secs > 0,
                "polling.refresh_interval_secs must be > 0 when polling is enabled, got {}",
                self.polling.refresh_interval_secs
            );
        }
        anyhow::ensure!(
            self.polling.stats_log_interval_secs > 0,
            "polling.stats_log_interval_secs must be > 0, got {}",
            self.polling.stats_log_interval_secs
        );
        Ok(())
    }
}
