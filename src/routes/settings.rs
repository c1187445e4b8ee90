use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::Settings;
use crate::AppState;

/// GET /api/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings.read().clone())
}

/// PUT /api/settings - Replace settings; the guide shift is clamped to ±12 h
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Json<Settings> {
    let settings = settings.normalized();
    *state.settings.write() = settings.clone();

    tracing::info!(
        "Settings updated: show_adult={}, epg_shift={}",
        settings.show_adult,
        settings.epg_shift
    );
    Json(settings)
}
