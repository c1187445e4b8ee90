use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::services::xtream::XtreamCredentials;

/// Display name used when the source gives a channel no usable name
pub const UNNAMED_CHANNEL: &str = "Unnamed Channel";

/// Default group for M3U entries without a `group-title`
pub const DEFAULT_M3U_GROUP: &str = "General";

/// Default group for Xtream streams without a category
pub const DEFAULT_XTREAM_GROUP: &str = "Live TV";

/// Single playable channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    /// Provider-side stream id, used as the EPG lookup key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvg_id: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Channel {
    /// Whether the group looks like adult content ("adult" / "xxx")
    pub fn is_adult(&self) -> bool {
        let group = self.group.to_lowercase();
        group.contains("adult") || group.contains("xxx")
    }

    /// Case-insensitive substring match on name or group.
    /// `needle` must already be lower-cased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.group.to_lowercase().contains(needle)
    }
}

/// Fallback for blank channel names
pub fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNNAMED_CHANNEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Manual edit applied to a channel. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Playlist as exchanged with the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub channels: Vec<Channel>,
    /// Unix milliseconds
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xtream_config: Option<XtreamCredentials>,
}

/// Lightweight listing entry for a playlist
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub channel_count: usize,
    pub favorite_count: usize,
    pub created_at: i64,
    pub is_xtream: bool,
    pub is_active: bool,
}

/// One guide entry, built per request and never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgProgram {
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<i64>,
}

impl EpgProgram {
    /// `HH:MM–HH:MM` in UTC shifted by `shift_hours`
    pub fn time_label(&self, shift_hours: i32) -> String {
        format!(
            "{}–{}",
            format_epg_time(self.start_timestamp, shift_hours),
            format_epg_time(self.end_timestamp, shift_hours)
        )
    }
}

/// Render a guide timestamp as `HH:MM`, or `--:--` when unknown
pub fn format_epg_time(timestamp: Option<i64>, shift_hours: i32) -> String {
    let Some(ts) = timestamp.filter(|ts| *ts > 0) else {
        return "--:--".to_string();
    };

    let Some(shifted) = ts.checked_add(i64::from(shift_hours) * 3600) else {
        return "--:--".to_string();
    };
    match Utc.timestamp_opt(shifted, 0).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Settings the engine acts on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub show_adult: bool,
    /// Guide time shift in hours
    #[serde(default)]
    pub epg_shift: i32,
}

impl Settings {
    pub fn normalized(mut self) -> Self {
        self.epg_shift = self.epg_shift.clamp(-12, 12);
        self
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Import raw M3U text (pasted or uploaded file)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct M3uTextRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub content: String,
}

/// Import a remote M3U playlist
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct M3uUrlRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
}

/// Import an Xtream Codes account
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XtreamImportRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub credentials: XtreamCredentials,
}

/// Build a custom playlist from channels already imported
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlaylistRequest {
    pub name: String,
    pub channel_ids: Vec<String>,
}

/// Batch guide request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideBatchRequest {
    pub channel_ids: Vec<String>,
}

/// Query parameters for the channel listing
#[derive(Debug, Deserialize)]
pub struct ChannelsQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

// ============================================================================
// Responses
// ============================================================================

/// Paginated channels response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    pub items: Vec<Channel>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Result of an import
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub playlist: PlaylistSummary,
}

/// Guide entry with its display time range
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProgram {
    #[serde(flatten)]
    pub program: EpgProgram,
    pub time_label: String,
}

/// Guide for one channel
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideResponse {
    pub channel_id: String,
    /// Another request for this channel is still in flight
    pub pending: bool,
    pub programs: Vec<GuideProgram>,
}

impl GuideResponse {
    pub fn new(channel_id: String, pending: bool, programs: Vec<EpgProgram>, shift_hours: i32) -> Self {
        let programs = programs
            .into_iter()
            .map(|program| GuideProgram {
                time_label: program.time_label(shift_hours),
                program,
            })
            .collect();
        Self {
            channel_id,
            pending,
            programs,
        }
    }
}

/// Everything needed to rebuild the engine state after a restart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    pub playlists: Vec<Playlist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_id: Option<String>,
    #[serde(default)]
    pub settings: Settings,
}
