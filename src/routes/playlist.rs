//! Playlist import and library management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{api_error, xtream_error, ApiError};
use crate::models::{
    Channel, CustomPlaylistRequest, ImportResponse, LibrarySnapshot, M3uTextRequest,
    M3uUrlRequest, PlaylistSummary, XtreamImportRequest,
};
use crate::services::library::PlaylistEntry;
use crate::services::m3u_parser::parse_m3u_report;
use crate::services::xtream::{xtream_login, XtreamCredentials};
use crate::AppState;

const DEFAULT_M3U_NAME: &str = "M3U Playlist";
const DEFAULT_XTREAM_NAME: &str = "Xtream Playlist";

fn playlist_name(requested: Option<&str>, fallback: &str) -> String {
    requested
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn max_bytes(state: &AppState) -> usize {
    state.config.max_m3u_size_mb * 1024 * 1024
}

fn too_large(state: &AppState) -> ApiError {
    api_error(
        StatusCode::PAYLOAD_TOO_LARGE,
        format!("Playlist exceeds {} MB", state.config.max_m3u_size_mb),
    )
}

fn check_size(state: &AppState, len: usize) -> Result<(), ApiError> {
    if len > max_bytes(state) {
        return Err(too_large(state));
    }
    Ok(())
}

/// Parse M3U text into channels; an empty result is an error for the caller
fn parse_channels(content: &str) -> Result<Vec<Channel>, ApiError> {
    let report = parse_m3u_report(content);
    if !report.anomalies.is_empty() {
        tracing::info!(
            "M3U parsed with {} skipped fragments",
            report.anomalies.len()
        );
    }

    if report.channels.is_empty() {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No channels found in playlist",
        ));
    }
    Ok(report.channels)
}

fn add_playlist(
    state: &AppState,
    name: &str,
    channels: Vec<Channel>,
    xtream_config: Option<XtreamCredentials>,
) -> (StatusCode, Json<ImportResponse>) {
    created(state, &state.library.add(name, channels, xtream_config))
}

fn created(state: &AppState, entry: &PlaylistEntry) -> (StatusCode, Json<ImportResponse>) {
    let is_active = state
        .library
        .active()
        .map(|active| active.id == entry.id)
        .unwrap_or(false);

    (
        StatusCode::CREATED,
        Json(ImportResponse {
            playlist: entry.summary(is_active),
        }),
    )
}

async fn import_xtream_account(
    state: &AppState,
    name: &str,
    creds: XtreamCredentials,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    if creds.url.trim().is_empty() || creds.username.is_empty() || creds.password.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Server URL, username and password are required",
        ));
    }

    let channels = xtream_login(&state.resolver, &creds)
        .await
        .map_err(xtream_error)?;

    if channels.is_empty() {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Subscription Error: No channels found.",
        ));
    }

    Ok(add_playlist(state, name, channels, Some(creds)))
}

/// GET /api/playlists - Summaries of every playlist
pub async fn list_playlists(State(state): State<Arc<AppState>>) -> Json<Vec<PlaylistSummary>> {
    Json(state.library.list())
}

/// POST /api/playlists/m3u - Import pasted or uploaded M3U text
pub async fn import_m3u(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<M3uTextRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    check_size(&state, payload.content.len())?;
    let channels = parse_channels(&payload.content)?;
    let name = playlist_name(payload.name.as_deref(), DEFAULT_M3U_NAME);

    Ok(add_playlist(&state, &name, channels, None))
}

/// POST /api/playlists/m3u-url - Download and import a remote playlist.
/// Provider `get.php` links are imported through the Player API instead.
pub async fn import_m3u_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<M3uUrlRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let url = payload.url.trim();
    if url.is_empty() || !url.starts_with("http") {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid URL"));
    }

    if let Some(mut creds) = XtreamCredentials::from_m3u_url(url) {
        tracing::info!("Xtream playlist link detected, importing via Player API");
        creds.proxy_url = payload.proxy_url.clone();
        let name = playlist_name(payload.name.as_deref(), DEFAULT_XTREAM_NAME);
        return import_xtream_account(&state, &name, creds).await;
    }

    let resolved = state
        .resolver
        .fetch_limited(url, payload.proxy_url.as_deref(), max_bytes(&state))
        .await
        .map_err(|e| {
            if e.is_too_large() {
                return too_large(&state);
            }
            tracing::error!("Playlist download failed for {}: {}", url, e);
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    if resolved.is_unauthorized() {
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "Playlist server rejected the request (401)",
        ));
    }

    tracing::info!(
        "Downloaded playlist via {} ({} bytes)",
        resolved.route,
        resolved.body.len()
    );
    let channels = parse_channels(&resolved.body)?;
    let name = playlist_name(payload.name.as_deref(), DEFAULT_M3U_NAME);

    Ok(add_playlist(&state, &name, channels, None))
}

/// POST /api/playlists/xtream - Log in to an Xtream account and import live channels
pub async fn import_xtream(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<XtreamImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let name = playlist_name(payload.name.as_deref(), DEFAULT_XTREAM_NAME);
    import_xtream_account(&state, &name, payload.credentials).await
}

/// POST /api/playlists/custom - New playlist from channels picked anywhere in the library
pub async fn create_custom(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CustomPlaylistRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Playlist name is required"));
    }
    if payload.channel_ids.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Select at least one channel"));
    }

    let entry = state
        .library
        .create_custom(name, &payload.channel_ids)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "None of the selected channels exist"))?;

    Ok(created(&state, &entry))
}

/// DELETE /api/playlists/:id
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.library.remove(&playlist_id) {
        tracing::info!("Playlist removed: {}", playlist_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "Playlist not found"))
    }
}

/// PUT /api/playlists/:id/active
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<PlaylistSummary>>, ApiError> {
    if !state.library.set_active(&playlist_id) {
        return Err(api_error(StatusCode::NOT_FOUND, "Playlist not found"));
    }
    Ok(Json(state.library.list()))
}

/// GET /api/playlists/export - Full library for the persistence layer
pub async fn export_library(State(state): State<Arc<AppState>>) -> Json<LibrarySnapshot> {
    Json(LibrarySnapshot {
        playlists: state.library.snapshot(),
        active_id: state.library.active().map(|p| p.id.clone()),
        settings: state.settings.read().clone(),
    })
}

/// POST /api/playlists/restore - Replace the library with a saved snapshot
pub async fn restore_library(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<LibrarySnapshot>,
) -> Json<Vec<PlaylistSummary>> {
    let count = snapshot.playlists.len();
    state.library.restore(snapshot.playlists, snapshot.active_id);
    *state.settings.write() = snapshot.settings.normalized();

    tracing::info!("Library restored with {} playlists", count);
    Json(state.library.list())
}
