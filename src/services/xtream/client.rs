//! Xtream Codes API Client
//!
//! Player API v2 client. Every request goes through the
//! [`FallbackResolver`]; the client never opens a connection itself.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::*;
use crate::models::{display_name, Channel, EpgProgram, DEFAULT_XTREAM_GROUP};
use crate::services::resolver::{FallbackResolver, ResolveError, Resolved};

/// Prefix of channel ids minted from provider stream ids
pub const XTREAM_ID_PREFIX: &str = "xtream_";

/// Standard alphabet, padding optional (providers often drop it)
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Xtream API Error types
#[derive(Debug, Error)]
pub enum XtreamError {
    /// Provider rejected the credentials
    #[error("Login Failed: Check your credentials.")]
    Auth,
    /// Provider answered 403 on the routes it could be reached by
    #[error("Access Blocked (403): Provider blocked browser/proxy access.\n{0}")]
    AccessBlocked(ResolveError),
    /// No route produced a usable response
    #[error("{0}")]
    Transport(ResolveError),
    /// Response did not have the expected shape
    #[error("Unexpected provider response: {0}")]
    Protocol(String),
}

impl From<ResolveError> for XtreamError {
    fn from(err: ResolveError) -> Self {
        if err.has_status(403) {
            XtreamError::AccessBlocked(err)
        } else {
            XtreamError::Transport(err)
        }
    }
}

/// Base64 decode with a raw fallback.
///
/// Guide titles and descriptions are base64 by convention only; anything
/// that does not decode to UTF-8 text is returned unchanged.
pub fn safe_decode(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    LENIENT_BASE64
        .decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Xtream API Client bound to one account
pub struct XtreamClient<'a> {
    resolver: &'a FallbackResolver,
    creds: &'a XtreamCredentials,
}

impl<'a> XtreamClient<'a> {
    pub fn new(resolver: &'a FallbackResolver, creds: &'a XtreamCredentials) -> Self {
        Self { resolver, creds }
    }

    /// Resolve one player_api.php call
    async fn get(&self, action: Option<&str>) -> Result<Resolved, XtreamError> {
        debug!("Xtream API request: {}", action.unwrap_or("login"));

        let url = self.creds.api_url(action);
        let resolved = self
            .resolver
            .fetch(&url, self.creds.proxy_url.as_deref())
            .await?;

        if resolved.is_unauthorized() {
            return Err(XtreamError::Auth);
        }

        Ok(resolved)
    }

    async fn get_json(&self, action: Option<&str>) -> Result<Value, XtreamError> {
        let resolved = self.get(action).await?;
        serde_json::from_str(&resolved.body).map_err(|e| {
            debug!(
                "Response text: {}",
                resolved.body.chars().take(500).collect::<String>()
            );
            XtreamError::Protocol(format!(
                "{} returned invalid JSON: {}",
                action.unwrap_or("login"),
                e
            ))
        })
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Login call; fails with `Auth` unless `user_info` says otherwise
    pub async fn get_auth(&self) -> Result<XtreamUserInfo, XtreamError> {
        let value = self.get_json(None).await?;

        let user_info = value
            .get("user_info")
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value::<XtreamUserInfo>(v.clone()).ok())
            .ok_or(XtreamError::Auth)?;

        if !user_info.is_authenticated() {
            return Err(XtreamError::Auth);
        }

        if !user_info.is_active() {
            warn!(
                "Xtream account status is {:?}, continuing",
                user_info.status
            );
        }

        Ok(user_info)
    }

    // ========================================================================
    // Live Streams
    // ========================================================================

    /// Get all live streams. Unreadable records are skipped.
    pub async fn get_live_streams(&self) -> Result<Vec<XtreamLiveStream>, XtreamError> {
        let value = self.get_json(Some("get_live_streams")).await?;

        let Value::Array(items) = value else {
            return Err(XtreamError::Protocol(
                "Subscription Error: No channels found.".to_string(),
            ));
        };

        let total = items.len();
        let streams: Vec<XtreamLiveStream> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        if streams.len() < total {
            warn!("Skipped {} unreadable live stream records", total - streams.len());
        }

        Ok(streams)
    }

    /// Category id to name map
    pub async fn get_live_categories(&self) -> Result<HashMap<String, String>, XtreamError> {
        let value = self.get_json(Some("get_live_categories")).await?;
        let categories: Vec<XtreamCategory> = serde_json::from_value(value)
            .map_err(|e| XtreamError::Protocol(format!("get_live_categories: {}", e)))?;

        Ok(categories
            .into_iter()
            .filter_map(|c| c.category_id.map(|id| (id, c.category_name)))
            .collect())
    }

    /// Authenticate and import the live channel list
    pub async fn login_and_list(&self) -> Result<Vec<Channel>, XtreamError> {
        let user_info = self.get_auth().await?;
        info!(
            "Xtream login ok for {} (status: {:?}, expires: {:?})",
            self.creds.base_url(),
            user_info.status,
            user_info.exp_date
        );

        let streams = self.get_live_streams().await?;

        // get_live_streams usually carries only category ids
        let needs_categories = streams
            .iter()
            .any(|s| blank(&s.category_name) && !blank(&s.category_id));
        let categories = if needs_categories {
            match self.get_live_categories().await {
                Ok(map) => map,
                Err(e) => {
                    warn!("Live categories unavailable, using default group: {}", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        let channels: Vec<Channel> = streams
            .into_iter()
            .filter_map(|stream| self.to_channel(stream, &categories))
            .collect();

        info!("Xtream import: {} live channels", channels.len());
        Ok(channels)
    }

    fn to_channel(
        &self,
        stream: XtreamLiveStream,
        categories: &HashMap<String, String>,
    ) -> Option<Channel> {
        let Some(stream_id) = stream.stream_id.filter(|id| !id.trim().is_empty()) else {
            warn!("Skipping live stream without stream_id: {:?}", stream.name);
            return None;
        };

        let group = non_blank(stream.category_name)
            .or_else(|| {
                stream
                    .category_id
                    .as_ref()
                    .and_then(|id| categories.get(id).cloned())
            })
            .unwrap_or_else(|| DEFAULT_XTREAM_GROUP.to_string());

        Some(Channel {
            id: format!("{}{}", XTREAM_ID_PREFIX, stream_id),
            url: self.creds.live_url(&stream_id),
            name: display_name(stream.name.as_deref().unwrap_or_default()),
            logo: non_blank(stream.stream_icon),
            group,
            tvg_id: non_blank(stream.epg_channel_id),
            stream_id: Some(stream_id),
            is_favorite: false,
        })
    }

    // ========================================================================
    // EPG
    // ========================================================================

    /// Get short EPG for a stream
    pub async fn get_short_epg(&self, stream_id: &str) -> Result<Vec<EpgProgram>, XtreamError> {
        let action = format!("get_short_epg&stream_id={}", urlencoding::encode(stream_id));
        let value = self.get_json(Some(&action)).await?;

        let listings: XtreamEpgListings = serde_json::from_value(value)
            .map_err(|e| XtreamError::Protocol(format!("get_short_epg: {}", e)))?;

        let total = listings.epg_listings.as_ref().map_or(0, Vec::len);
        let programs: Vec<EpgProgram> = listings.entries().into_iter().map(to_program).collect();
        if programs.len() < total {
            warn!(
                "Skipped {} unreadable EPG entries for stream {}",
                total - programs.len(),
                stream_id
            );
        }

        Ok(programs)
    }

    /// Short EPG that never fails: any error becomes an empty guide
    pub async fn fetch_epg(&self, stream_id: &str) -> Vec<EpgProgram> {
        match self.get_short_epg(stream_id).await {
            Ok(programs) => programs,
            Err(e) => {
                warn!("EPG unavailable for stream {}: {}", stream_id, e);
                Vec::new()
            }
        }
    }
}

fn to_program(entry: XtreamEpgEntry) -> EpgProgram {
    let end_timestamp = entry.end_ts();
    let description = entry
        .description
        .as_deref()
        .map(safe_decode)
        .filter(|d| !d.is_empty());

    EpgProgram {
        title: safe_decode(entry.title.as_deref().unwrap_or_default()),
        start: entry.start.unwrap_or_default(),
        end: entry.end.unwrap_or_default(),
        description,
        start_timestamp: entry.start_timestamp,
        end_timestamp,
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Authenticate and list live channels
pub async fn xtream_login(
    resolver: &FallbackResolver,
    creds: &XtreamCredentials,
) -> Result<Vec<Channel>, XtreamError> {
    XtreamClient::new(resolver, creds).login_and_list().await
}

/// Short EPG for one stream; empty on any failure
pub async fn xtream_fetch_epg(
    resolver: &FallbackResolver,
    creds: &XtreamCredentials,
    stream_id: &str,
) -> Vec<EpgProgram> {
    XtreamClient::new(resolver, creds).fetch_epg(stream_id).await
}
