//! Short EPG for Xtream channels
//!
//! Guide requests never fail because of the provider: an unreachable server
//! or an unreadable answer is just an empty guide.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::{find_playlist, ApiError};
use crate::models::{Channel, GuideBatchRequest, GuideResponse};
use crate::services::guide::GuideLoad;
use crate::AppState;

fn to_response(channel_id: String, load: GuideLoad, shift_hours: i32) -> GuideResponse {
    let pending = load == GuideLoad::Pending;
    GuideResponse::new(channel_id, pending, load.into_programs(), shift_hours)
}

/// GET /api/playlists/:id/channels/:cid/epg
pub async fn channel_guide(
    State(state): State<Arc<AppState>>,
    Path((playlist_id, channel_id)): Path<(String, String)>,
) -> Result<Json<GuideResponse>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    let shift = state.settings.read().epg_shift;

    let load = match (&playlist.xtream_config, playlist.catalog.get(&channel_id)) {
        (Some(creds), Some(channel)) => state.guide.load(creds, &channel).await,
        _ => GuideLoad::Unavailable,
    };

    Ok(Json(to_response(channel_id, load, shift)))
}

/// POST /api/playlists/:id/epg - Guides for several channels, loaded concurrently
pub async fn batch_guide(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
    Json(payload): Json<GuideBatchRequest>,
) -> Result<Json<Vec<GuideResponse>>, ApiError> {
    let playlist = find_playlist(&state, &playlist_id)?;
    let shift = state.settings.read().epg_shift;

    let Some(creds) = &playlist.xtream_config else {
        return Ok(Json(
            payload
                .channel_ids
                .into_iter()
                .map(|id| to_response(id, GuideLoad::Unavailable, shift))
                .collect(),
        ));
    };

    let channels: Vec<Channel> = payload
        .channel_ids
        .iter()
        .filter_map(|id| playlist.catalog.get(id))
        .collect();

    let mut loaded = state.guide.load_many(creds, &channels).await;

    let responses = payload
        .channel_ids
        .into_iter()
        .map(|id| {
            let load = loaded
                .iter()
                .position(|(loaded_id, _)| *loaded_id == id)
                .map(|idx| loaded.swap_remove(idx).1)
                .unwrap_or(GuideLoad::Unavailable);
            to_response(id, load, shift)
        })
        .collect();

    Ok(Json(responses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::m3u_parser::parse_m3u;
    use crate::services::xtream::XtreamCredentials;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state() -> Arc<AppState> {
        let config = Config {
            fallback_proxies: vec![],
            ..Config::default()
        };
        Arc::new(AppState::new(config).unwrap())
    }

    fn channel(id: &str, stream_id: Option<&str>) -> Channel {
        Channel {
            id: id.to_string(),
            stream_id: stream_id.map(str::to_string),
            name: id.to_string(),
            url: "http://s".to_string(),
            logo: None,
            group: "Live TV".to_string(),
            tvg_id: None,
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn test_m3u_playlist_has_no_guide() {
        let state = state();
        let entry = state
            .library
            .add("M3U", parse_m3u("#EXTINF:-1,One\nhttp://s/1"), None);
        let cid = entry.catalog.snapshot()[0].id.clone();

        let Json(guide) = channel_guide(State(state), Path((entry.id.clone(), cid)))
            .await
            .unwrap();
        assert!(!guide.pending);
        assert!(guide.programs.is_empty());
    }

    #[tokio::test]
    async fn test_batch_guide_per_channel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/player_api.php"))
            .and(query_param("stream_id", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "epg_listings": [{
                    "title": "TmV3cw==",
                    "start": "2024-01-01 21:00:00",
                    "end": "2024-01-01 22:00:00",
                    "start_timestamp": 1704142800,
                    "stop_timestamp": 1704146400
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/player_api.php"))
            .and(query_param("stream_id", "2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let state = state();
        state.settings.write().epg_shift = -1;
        let creds = XtreamCredentials {
            url: server.uri(),
            username: "u".to_string(),
            password: "p".to_string(),
            proxy_url: None,
        };
        let entry = state.library.add(
            "Xtream",
            vec![
                channel("xtream_1", Some("1")),
                channel("xtream_2", Some("2")),
                channel("plain", None),
            ],
            Some(creds),
        );

        let Json(guides) = batch_guide(
            State(state),
            Path(entry.id.clone()),
            Json(GuideBatchRequest {
                channel_ids: vec![
                    "xtream_1".to_string(),
                    "xtream_2".to_string(),
                    "plain".to_string(),
                    "missing".to_string(),
                ],
            }),
        )
        .await
        .unwrap();

        assert_eq!(guides.len(), 4);
        assert_eq!(guides[0].channel_id, "xtream_1");
        assert_eq!(guides[0].programs[0].program.title, "News");
        assert_eq!(guides[0].programs[0].time_label, "20:00–21:00");
        assert!(guides[1].programs.is_empty());
        assert!(guides[2].programs.is_empty());
        assert_eq!(guides[3].channel_id, "missing");
        assert!(guides.iter().all(|g| !g.pending));
    }
}
