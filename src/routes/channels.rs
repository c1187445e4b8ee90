//! Channel browsing and editing inside one playlist
//!
//! Every handler goes through the playlist's catalog, so a favorite toggled
//! from the detail view shows up in the grid and the favorites list at once.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::{api_error, find_playlist, ApiError};
use crate::models::{Channel, ChannelEdit, ChannelsQuery, ChannelsResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub channel_id: String,
    pub is_favorite: bool,
}

fn channel_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Channel not found")
}

/// GET /api/playlists/:id/channels?q=&limit=&offset=
/// Search over name and group, minus adult groups unless enabled in settings
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
    Query(query): Query<ChannelsQuery>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    let show_adult = state.settings.read().show_adult;
    let limit = query.limit.min(state.config.max_items_page);

    let view = playlist
        .catalog
        .search(query.q.as_deref().unwrap_or_default())
        .apply_adult_filter(show_adult);
    let total = view.count();
    let items = view.window(query.offset, limit);

    Ok(Json(ChannelsResponse {
        has_more: query.offset + items.len() < total,
        items,
        total,
        limit,
        offset: query.offset,
    }))
}

/// GET /api/playlists/:id/favorites
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    Ok(Json(playlist.catalog.favorites()))
}

/// GET /api/playlists/:id/channels/:cid
pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path((playlist_id, channel_id)): Path<(String, String)>,
) -> Result<Json<Channel>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    playlist
        .catalog
        .get(&channel_id)
        .map(Json)
        .ok_or_else(channel_not_found)
}

/// PATCH /api/playlists/:id/channels/:cid
pub async fn update_channel(
    State(state): State<Arc<AppState>>,
    Path((playlist_id, channel_id)): Path<(String, String)>,
    Json(edit): Json<ChannelEdit>,
) -> Result<Json<Channel>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    let channel = playlist
        .catalog
        .update_channel(&channel_id, edit)
        .ok_or_else(channel_not_found)?;

    tracing::info!("Channel edited: {} in {}", channel.id, playlist.name);
    Ok(Json(channel))
}

/// POST /api/playlists/:id/channels/:cid/favorite
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path((playlist_id, channel_id)): Path<(String, String)>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    let is_favorite = playlist
        .catalog
        .toggle_favorite(&channel_id)
        .ok_or_else(channel_not_found)?;

    Ok(Json(FavoriteResponse {
        channel_id,
        is_favorite,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::m3u_parser::parse_m3u;

    const SAMPLE: &str = "#EXTM3U\n\
        #EXTINF:-1 group-title=\"News\",BBC News\nhttp://s/1\n\
        #EXTINF:-1 group-title=\"XXX\",Late\nhttp://s/2\n\
        #EXTINF:-1 group-title=\"Movies\",Action\nhttp://s/3\n\
        #EXTINF:-1 group-title=\"News\",CNN\nhttp://s/4\n";

    fn setup(max_items_page: usize) -> (Arc<AppState>, String, Vec<Channel>) {
        let config = Config {
            max_items_page,
            fallback_proxies: vec![],
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        let entry = state.library.add("P", parse_m3u(SAMPLE), None);
        let channels = entry.catalog.snapshot();
        (state, entry.id.clone(), channels)
    }

    fn query(q: Option<&str>, limit: usize, offset: usize) -> Query<ChannelsQuery> {
        Query(ChannelsQuery {
            q: q.map(str::to_string),
            limit,
            offset,
        })
    }

    #[tokio::test]
    async fn test_listing_hides_adult_by_default() {
        let (state, id, _) = setup(5000);

        let Json(page) = list_channels(State(state.clone()), Path(id.clone()), query(None, 50, 0))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|c| c.group != "XXX"));

        state.settings.write().show_adult = true;
        let Json(page) = list_channels(State(state), Path(id), query(None, 50, 0))
            .await
            .unwrap();
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_listing_search_and_window() {
        let (state, id, _) = setup(1);

        let Json(page) = list_channels(State(state), Path(id), query(Some("news"), 50, 0))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.limit, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "BBC News");
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_unknown_playlist() {
        let (state, _, _) = setup(5000);
        let err = list_channels(State(state), Path("missing".to_string()), query(None, 50, 0))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_favorite_visible_everywhere() {
        let (state, id, channels) = setup(5000);
        let cid = channels[2].id.clone();

        let Json(toggled) = toggle_favorite(State(state.clone()), Path((id.clone(), cid.clone())))
            .await
            .unwrap();
        assert!(toggled.is_favorite);

        let Json(detail) = get_channel(State(state.clone()), Path((id.clone(), cid.clone())))
            .await
            .unwrap();
        assert!(detail.is_favorite);

        let Json(favorites) = list_favorites(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, cid);

        let err = toggle_favorite(State(state), Path((id, "nope".to_string())))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_channel() {
        let (state, id, channels) = setup(5000);
        let cid = channels[0].id.clone();

        let Json(updated) = update_channel(
            State(state.clone()),
            Path((id.clone(), cid.clone())),
            Json(ChannelEdit {
                name: Some("BBC World".to_string()),
                ..ChannelEdit::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "BBC World");
        assert_eq!(updated.group, "News");

        let Json(detail) = get_channel(State(state), Path((id, cid))).await.unwrap();
        assert_eq!(detail.name, "BBC World");
    }
}
