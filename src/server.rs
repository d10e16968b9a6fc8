//! HTTP front door. Every method and path lands in the same handler.

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::cache::{CachedResponse, ResponseCache};
use crate::consts::GEO_HEADERS;
use crate::engine::{Engine, InboundRequest};

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

pub struct AppState {
    pub engine: Arc<dyn Engine>,
    /// `None` disables caching.
    pub cache: Option<Arc<dyn ResponseCache>>,
    pub cache_ttl: Duration,
    /// Cancelled on shutdown; aborts in-flight polls.
    pub shutdown: CancellationToken,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `state.shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn handle(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if uri.path().ends_with("favicon.ico") {
        return StatusCode::OK.into_response();
    }

    let cache = state.cache.as_ref().filter(|_| method == Method::GET);
    let url = request_url(&headers, &uri);

    if let Some(cache) = cache {
        match cache.get(&url).await {
            Ok(Some(hit)) => return respond(hit, "hit"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, url = %url, "cache lookup failed"),
        }
    }

    let request = InboundRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: query_map(&uri),
        geo: geo_signal(&headers),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    match state.engine.handle(&request, &state.shutdown).await {
        Ok(rendered) => {
            let response = CachedResponse {
                content_type: rendered.media_type.as_str().to_string(),
                body: rendered.body,
            };
            if let Some(cache) = cache
                && let Err(e) = cache.put(&url, &response, state.cache_ttl).await
            {
                warn!(error = %e, url = %url, "cache store failed");
            }
            respond(response, "miss")
        }
        Err(e) => {
            error!(error = %e, method = %method, path = uri.path(), "request failed");
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, e.to_string()).into_response()
        }
    }
}

fn respond(response: CachedResponse, cache_status: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, response.content_type),
            (X_CACHE, cache_status.to_string()),
        ],
        response.body,
    )
        .into_response()
}

/// Decoded query pairs. A query that cannot be decoded counts as empty.
pub fn query_map(uri: &Uri) -> BTreeMap<String, String> {
    Query::<BTreeMap<String, String>>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default()
}

/// Host plus path and query; the cache key source.
fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    format!("{host}{path_and_query}")
}

fn geo_signal(headers: &HeaderMap) -> String {
    GEO_HEADERS
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok())
        .unwrap_or("")
        .to_string()
}
