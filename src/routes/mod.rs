pub mod channels;
pub mod guide;
pub mod health;
pub mod playlist;
pub mod settings;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::services::library::PlaylistEntry;
use crate::services::xtream::XtreamError;
use crate::AppState;

/// Request body cap. Playlist text arrives JSON-escaped, so the cap leaves
/// room above the import limit, which is checked on the decoded content.
fn body_limit(max_m3u_size_mb: usize) -> usize {
    max_m3u_size_mb * 1024 * 1024 * 2 + 1024 * 1024
}

/// Every endpoint with its middleware
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = body_limit(state.config.max_m3u_size_mb);

    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/live", get(health::live))
        // Library
        .route("/api/playlists", get(playlist::list_playlists))
        .route("/api/playlists/m3u", post(playlist::import_m3u))
        .route("/api/playlists/m3u-url", post(playlist::import_m3u_url))
        .route("/api/playlists/xtream", post(playlist::import_xtream))
        .route("/api/playlists/custom", post(playlist::create_custom))
        .route("/api/playlists/export", get(playlist::export_library))
        .route("/api/playlists/restore", post(playlist::restore_library))
        .route("/api/playlists/:id", delete(playlist::delete_playlist))
        .route("/api/playlists/:id/active", put(playlist::set_active))
        // Catalog
        .route("/api/playlists/:id/channels", get(channels::list_channels))
        .route("/api/playlists/:id/favorites", get(channels::list_favorites))
        .route(
            "/api/playlists/:id/channels/:cid",
            get(channels::get_channel).patch(channels::update_channel),
        )
        .route(
            "/api/playlists/:id/channels/:cid/favorite",
            post(channels::toggle_favorite),
        )
        // Guide
        .route(
            "/api/playlists/:id/channels/:cid/epg",
            get(guide::channel_guide),
        )
        .route("/api/playlists/:id/epg", post(guide::batch_guide))
        // Settings
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Error shape shared by every handler
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

pub fn xtream_error(err: XtreamError) -> ApiError {
    let status = match &err {
        XtreamError::Auth => StatusCode::UNAUTHORIZED,
        XtreamError::AccessBlocked(_) => StatusCode::FORBIDDEN,
        XtreamError::Transport(_) | XtreamError::Protocol(_) => StatusCode::BAD_GATEWAY,
    };
    tracing::error!("Xtream request failed: {}", err);
    api_error(status, err.to_string())
}

pub fn find_playlist(state: &AppState, playlist_id: &str) -> Result<Arc<PlaylistEntry>, ApiError> {
    state
        .library
        .get(playlist_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Playlist not found"))
}
