//! The set of imported playlists
//!
//! Playlists are added whole and removed whole; inside a playlist only the
//! catalog mutates. The library hands plain [`Playlist`] values to and from
//! whoever persists them.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Channel, Playlist, PlaylistSummary};
use crate::services::catalog::Catalog;
use crate::services::xtream::XtreamCredentials;

/// One imported playlist
#[derive(Debug)]
pub struct PlaylistEntry {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub xtream_config: Option<XtreamCredentials>,
    pub catalog: Catalog,
}

impl PlaylistEntry {
    fn from_playlist(playlist: Playlist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            created_at: playlist.created_at,
            xtream_config: playlist.xtream_config,
            catalog: Catalog::new(playlist.channels),
        }
    }

    pub fn to_playlist(&self) -> Playlist {
        Playlist {
            id: self.id.clone(),
            name: self.name.clone(),
            channels: self.catalog.snapshot(),
            created_at: self.created_at,
            xtream_config: self.xtream_config.clone(),
        }
    }

    pub fn summary(&self, is_active: bool) -> PlaylistSummary {
        PlaylistSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            channel_count: self.catalog.len(),
            favorite_count: self.catalog.favorite_count(),
            created_at: self.created_at,
            is_xtream: self.xtream_config.is_some(),
            is_active,
        }
    }
}

#[derive(Debug, Default)]
struct LibraryState {
    playlists: Vec<Arc<PlaylistEntry>>,
    active_id: Option<String>,
}

/// Playlist collection with an active selection
#[derive(Debug, Default)]
pub struct Library {
    state: RwLock<LibraryState>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a freshly imported playlist. The first playlist becomes active.
    pub fn add(
        &self,
        name: &str,
        channels: Vec<Channel>,
        xtream_config: Option<XtreamCredentials>,
    ) -> Arc<PlaylistEntry> {
        let entry = Arc::new(PlaylistEntry::from_playlist(Playlist {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            channels,
            created_at: chrono::Utc::now().timestamp_millis(),
            xtream_config,
        }));

        let mut state = self.state.write();
        state.playlists.push(Arc::clone(&entry));
        if state.active_id.is_none() {
            state.active_id = Some(entry.id.clone());
        }

        tracing::info!(
            "Playlist added: {} ({} channels)",
            entry.name,
            entry.catalog.len()
        );
        entry
    }

    /// Remove a playlist and its channels
    pub fn remove(&self, playlist_id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.playlists.len();
        state.playlists.retain(|p| p.id != playlist_id);
        let removed = state.playlists.len() != before;

        if removed && state.active_id.as_deref() == Some(playlist_id) {
            state.active_id = None;
        }
        removed
    }

    pub fn get(&self, playlist_id: &str) -> Option<Arc<PlaylistEntry>> {
        self.state
            .read()
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .cloned()
    }

    pub fn list(&self) -> Vec<PlaylistSummary> {
        let state = self.state.read();
        let active = Self::active_in(&state).map(|p| p.id.clone());
        state
            .playlists
            .iter()
            .map(|p| p.summary(active.as_deref() == Some(p.id.as_str())))
            .collect()
    }

    pub fn set_active(&self, playlist_id: &str) -> bool {
        let mut state = self.state.write();
        if state.playlists.iter().any(|p| p.id == playlist_id) {
            state.active_id = Some(playlist_id.to_string());
            true
        } else {
            false
        }
    }

    /// Active playlist, falling back to the first one
    pub fn active(&self) -> Option<Arc<PlaylistEntry>> {
        Self::active_in(&self.state.read()).cloned()
    }

    fn active_in(state: &LibraryState) -> Option<&Arc<PlaylistEntry>> {
        state
            .active_id
            .as_deref()
            .and_then(|id| state.playlists.iter().find(|p| p.id == id))
            .or_else(|| state.playlists.first())
    }

    /// Build a playlist from channels picked across all playlists. Channels
    /// keep their ids and flags. `None` when nothing matched.
    pub fn create_custom(&self, name: &str, channel_ids: &[String]) -> Option<Arc<PlaylistEntry>> {
        let wanted: HashSet<&str> = channel_ids.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();

        let channels: Vec<Channel> = self
            .state
            .read()
            .playlists
            .iter()
            .flat_map(|p| p.catalog.snapshot())
            .filter(|c| wanted.contains(c.id.as_str()) && seen.insert(c.id.clone()))
            .collect();

        if channels.is_empty() {
            return None;
        }

        Some(self.add(name, channels, None))
    }

    /// Plain copies of every playlist, for persistence
    pub fn snapshot(&self) -> Vec<Playlist> {
        self.state
            .read()
            .playlists
            .iter()
            .map(|p| p.to_playlist())
            .collect()
    }

    /// Replace the library with previously persisted playlists
    pub fn restore(&self, playlists: Vec<Playlist>, active_id: Option<String>) {
        let entries: Vec<_> = playlists
            .into_iter()
            .map(|p| Arc::new(PlaylistEntry::from_playlist(p)))
            .collect();

        let mut state = self.state.write();
        state.active_id = active_id.filter(|id| entries.iter().any(|p| &p.id == id));
        state.playlists = entries;
    }
}
