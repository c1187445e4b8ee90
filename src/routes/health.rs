use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "LuckyX Engine",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

/// Library stats
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LibraryStats {
    playlists: usize,
    channels: usize,
    favorites: usize,
}

/// Resolver stats
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolverStats {
    fallback_proxies: usize,
    attempt_timeout_ms: u64,
    secure_context: bool,
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    uptime: u64,
    library: LibraryStats,
    resolver: ResolverStats,
}

/// GET /health - Service health with library counts
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    let playlists = state.library.list();
    let library = LibraryStats {
        playlists: playlists.len(),
        channels: playlists.iter().map(|p| p.channel_count).sum(),
        favorites: playlists.iter().map(|p| p.favorite_count).sum(),
    };

    let resolver = ResolverStats {
        fallback_proxies: state.config.fallback_proxies.len(),
        attempt_timeout_ms: state.config.attempt_timeout_ms,
        secure_context: state.config.secure_context,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime,
        library,
        resolver,
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Liveness probe (for Kubernetes)
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
