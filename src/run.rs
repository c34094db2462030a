//! Application execution logic.
//!
//! Wires the stores, the subscription index, the delivery engine and the
//! inbound server together, then serves until a shutdown signal arrives.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;

use webhook_hub::config::{ConfigError, ValidatedConfig, load_webhooks};
use webhook_hub::delivery::{DeliveryEngine, RetryRegistry};
use webhook_hub::inbound::InboundReceiver;
use webhook_hub::inbound::server;
use webhook_hub::log::{DeliveryLogger, JsonlLogStore, LogError, LogStore, TracingLogStore};
use webhook_hub::model::{DeliveryLogEntry, WebhookDefinition};
use webhook_hub::store::{EventBus, MemoryConfigStore, MemoryRecordStore};
use webhook_hub::subscription::{SubscriptionIndex, spawn_refresher};
use webhook_hub::webhook::{HttpClient, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to bind the inbound listener.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address from the configuration
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The inbound server stopped with an error.
    #[error("Inbound server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Delivery log backend chosen by configuration.
#[derive(Debug)]
pub enum HubLogStore {
    /// Entries emitted as tracing events only.
    Tracing(TracingLogStore),
    /// Entries appended to a JSON-lines file.
    Jsonl(JsonlLogStore),
}

impl HubLogStore {
    /// Uses a JSON-lines file when `path` is set, tracing otherwise.
    pub fn from_path(path: Option<&Path>) -> Self {
        path.map_or_else(
            || Self::Tracing(TracingLogStore::new()),
            |path| Self::Jsonl(JsonlLogStore::new(path)),
        )
    }
}

impl LogStore for HubLogStore {
    async fn append(&self, entry: DeliveryLogEntry) -> Result<(), LogError> {
        match self {
            Self::Tracing(store) => store.append(entry).await,
            Self::Jsonl(store) => store.append(entry).await,
        }
    }
}

/// Detects edits to the config file by its modification time.
#[derive(Debug)]
pub struct ConfigReloader {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl ConfigReloader {
    /// Starts watching `path`; its current state counts as already loaded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_modified = modified(&path);
        Self {
            path,
            last_modified,
        }
    }

    /// Re-reads the webhooks if the file changed since the last poll.
    ///
    /// Returns `None` when the file is unchanged or unreadable.
    pub fn poll(&mut self) -> Option<Result<Vec<WebhookDefinition>, ConfigError>> {
        let current = modified(&self.path)?;
        if self.last_modified == Some(current) {
            return None;
        }
        self.last_modified = Some(current);
        Some(load_webhooks(&self.path))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Polls `reloader` every `interval` and swaps in new webhook definitions.
///
/// A file that fails validation is reported and the running set is kept.
fn spawn_reloader(
    mut reloader: ConfigReloader,
    interval: Duration,
    config: Arc<MemoryConfigStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match reloader.poll() {
                None => {}
                Some(Ok(webhooks)) => {
                    tracing::info!(
                        path = %reloader.path.display(),
                        count = webhooks.len(),
                        "Reloaded webhook definitions"
                    );
                    config.replace_all(webhooks);
                }
                Some(Err(e)) => {
                    tracing::warn!("Config reload failed, keeping current webhooks: {e}");
                }
            }
        }
    })
}

/// The running hub: every background task plus the inbound router.
struct Hub<H> {
    engine: Arc<DeliveryEngine<H, HubLogStore>>,
    router: Router,
    tasks: Vec<JoinHandle<()>>,
}

impl<H: HttpClient + 'static> Hub<H> {
    /// Builds every component and starts the background tasks.
    ///
    /// Must be called from within a tokio runtime.
    fn start(config: ValidatedConfig, client: H) -> Self {
        let config_store = Arc::new(MemoryConfigStore::with_definitions(config.webhooks));
        let bus = EventBus::new();
        let records = Arc::new(MemoryRecordStore::with_notifier(bus.clone()));
        let log = Arc::new(HubLogStore::from_path(config.log_file.as_deref()));

        let index = Arc::new(SubscriptionIndex::new());
        let retries = Arc::new(RetryRegistry::new());
        let mut tasks = vec![spawn_refresher(
            Arc::clone(&config_store),
            Arc::clone(&index),
            Arc::clone(&retries),
        )];

        let mut engine = DeliveryEngine::new(client, index, DeliveryLogger::new(Arc::clone(&log)))
            .with_retry_policy(config.retry_policy)
            .with_retry_registry(retries);
        if let Some(limit) = config.max_in_flight {
            engine = engine.with_max_in_flight(limit);
        }
        let engine = Arc::new(engine);
        tasks.push(engine.listen(&bus));

        if let (Some(path), Some(interval)) = (config.config_path, config.reload_interval) {
            tracing::info!(
                "Watching {} for webhook changes every {}s",
                path.display(),
                interval.as_secs()
            );
            tasks.push(spawn_reloader(
                ConfigReloader::new(path),
                interval,
                Arc::clone(&config_store),
            ));
        }

        let receiver = InboundReceiver::new(
            Arc::clone(&config_store),
            Arc::clone(&records),
            DeliveryLogger::new(Arc::clone(&log)),
        );
        let router = server::router(Arc::new(receiver), config.max_body_bytes);

        Self {
            engine,
            router,
            tasks,
        }
    }

    /// Cancels pending retries and stops the background tasks.
    fn stop(self) {
        let cancelled = self.engine.shutdown();
        if cancelled > 0 {
            tracing::info!(cancelled, "Cancelled pending retries");
        }
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Executes the hub until a shutdown signal (Ctrl+C / SIGTERM).
///
/// # Errors
///
/// Returns an error if the listen address cannot be bound or the server
/// fails while running.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires
/// signal handling and a real socket.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let addr = config.listen;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RunError::Bind { addr, source })?;

    let hub = Hub::start(config, ReqwestClient::new());
    let result = server::serve(listener, hub.router.clone(), shutdown_signal()).await;

    tracing::info!("Shutdown signal received, stopping...");
    hub.stop();
    result.map_err(RunError::Serve)
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
