use anyhow::Result;
use bikeshare_history::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let feed = Arc::new(
        feed::FeedClient::new(&app_config.feed).map_err(|e| anyhow::anyhow!("feed client: {}", e))?,
    );
    let store = Arc::new(history_repo::HistoryStore::new(&app_config.history.path));
    let existing = store.load().await;
    tracing::info!(
        path = %store.path().display(),
        outcome = ?existing.outcome,
        records = existing.records.len(),
        "history opened"
    );
    let recorder = Arc::new(recorder::SnapshotRecorder::new(
        store,
        Arc::new(clock::SystemClock),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = if app_config.polling.enabled {
        Some(worker::spawn(
            worker::WorkerDeps {
                source: feed.clone(),
                recorder: recorder.clone(),
                stats: Arc::new(worker::WorkerStats::default()),
                shutdown_rx,
            },
            worker::WorkerConfig {
                refresh_interval: Duration::from_secs(app_config.polling.refresh_interval_secs),
                stats_log_interval: Duration::from_secs(
                    app_config.polling.stats_log_interval_secs,
                ),
            },
        ))
    } else {
        tracing::info!("polling disabled; snapshots recorded on /api/stations requests only");
        None
    };

    let app = routes::app(feed, recorder, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            if let Some(handle) = worker_handle {
                let _ = handle.await;
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
