//! HTTP surface for the inbound receiver.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router, body::Bytes};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::log::LogStore;
use crate::store::{ConfigStore, RecordStore};

use super::InboundReceiver;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the router:
///
/// - `POST /webhooks/receive/{webhook_id}`: inbound webhook endpoint
/// - `GET /health`: liveness probe
///
/// Bodies larger than `max_body_bytes` are refused with 413 before they
/// reach the receiver.
pub fn router<C, R, L>(receiver: Arc<InboundReceiver<C, R, L>>, max_body_bytes: usize) -> Router
where
    C: ConfigStore + 'static,
    R: RecordStore + 'static,
    L: LogStore + 'static,
{
    Router::new()
        .route("/webhooks/receive/{webhook_id}", post(receive::<C, R, L>))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(receiver)
}

async fn receive<C, R, L>(
    State(receiver): State<Arc<InboundReceiver<C, R, L>>>,
    Path(webhook_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>)
where
    C: ConfigStore + 'static,
    R: RecordStore + 'static,
    L: LogStore + 'static,
{
    let response = receiver.receive(&webhook_id, &body, &headers).await;
    (response.status, Json(response.body))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serves `router` on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Inbound server listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Inbound server stopped");
    Ok(())
}
