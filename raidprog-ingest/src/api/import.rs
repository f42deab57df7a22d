//! Import API handlers
//!
//! POST /import, GET /import/queue

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::{import_request, QueueState};
use crate::AppState;

/// Headers set by a reverse proxy, checked in order
const FORWARDED_HEADERS: [&str; 2] = ["x-real-ip", "x-forwarded-for"];

/// POST /import query
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// Report URL or bare report id
    #[serde(default)]
    pub r: String,
}

/// POST /import response
#[derive(Debug, Serialize)]
pub struct ImportAccepted {
    pub report_id: String,
    pub queue_length: usize,
}

/// GET /import/queue response
#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub state: QueueState,
    pub processing: Option<String>,
    pub pending: Vec<String>,
}

/// Client address for rate limiting
///
/// Proxy headers win over the socket peer; the first X-Forwarded-For entry
/// is the originating client.
fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    for name in FORWARDED_HEADERS {
        let value = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(value) = value {
            return Some(value.to_string());
        }
    }
    peer.map(|addr| addr.ip().to_string())
}

/// POST /import?r=<report url or id>
///
/// Queues the report for the import worker. Returns 202 Accepted.
pub async fn submit_import(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(query): Query<ImportQuery>,
) -> ApiResult<(StatusCode, Json<ImportAccepted>)> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let client = client_address(&headers, peer).unwrap_or_default();

    let report_id =
        import_request::submit(&state.limiter, &state.queue, &state.engine, &client, &query.r)
            .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ImportAccepted {
            report_id,
            queue_length: state.queue.len().await,
        }),
    ))
}

/// GET /import/queue
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    Json(QueueStatusResponse {
        state: state.queue.state().await,
        processing: state.queue.processing().await,
        pending: state.queue.pending().await,
    })
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import", post(submit_import))
        .route("/import/queue", get(queue_status))
}
