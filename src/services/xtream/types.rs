//! Xtream Codes API Types
//!
//! Wire types for the three Player API calls the engine makes, plus the
//! credentials every call carries. Providers disagree on whether ids and
//! timestamps are strings or numbers, so those fields accept both.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provider account, passed as is to every client call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XtreamCredentials {
    /// Server base URL as typed by the user (scheme optional)
    pub url: String,
    pub username: String,
    pub password: String,
    /// Caller's own proxy, tried right after the direct route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl XtreamCredentials {
    /// Server URL with a scheme and without trailing slash
    pub fn base_url(&self) -> String {
        let trimmed = self.url.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.starts_with("http") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        }
    }

    /// Build the player_api.php URL, optionally with an action
    pub fn api_url(&self, action: Option<&str>) -> String {
        let mut url = format!(
            "{}/player_api.php?username={}&password={}",
            self.base_url(),
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password)
        );
        if let Some(action) = action {
            url.push_str("&action=");
            url.push_str(action);
        }
        url
    }

    /// Build playback URL for live streams
    pub fn live_url(&self, stream_id: &str) -> String {
        format!(
            "{}/live/{}/{}/{}.ts",
            self.base_url(),
            self.username,
            self.password,
            stream_id
        )
    }
}

// ============================================================================
// Lenient field helpers
// ============================================================================

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// ============================================================================
// Authentication
// ============================================================================

/// `user_info` object of the login response
#[derive(Debug, Deserialize, Clone, Default)]
pub struct XtreamUserInfo {
    /// `1`/`0`, number or string depending on the panel
    #[serde(default)]
    pub auth: Option<Value>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub exp_date: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub max_connections: Option<String>,
}

impl XtreamUserInfo {
    /// Panels report a rejected login as `auth: 0` with no username
    pub fn is_authenticated(&self) -> bool {
        let auth_zero = match &self.auth {
            Some(Value::Number(n)) => n.as_i64() == Some(0),
            Some(Value::String(s)) => s.trim() == "0",
            _ => false,
        };
        let has_username = self
            .username
            .as_deref()
            .map(|u| !u.is_empty())
            .unwrap_or(false);

        !(auth_zero && !has_username)
    }

    /// Check if account is active (missing status counts as active)
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(true)
    }
}

// ============================================================================
// Live Streams
// ============================================================================

/// Live stream (channel) record from `get_live_streams`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct XtreamLiveStream {
    #[serde(default, deserialize_with = "string_or_number")]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_channel_id: Option<String>,
}

/// Category from `get_live_categories`
#[derive(Debug, Deserialize, Clone)]
pub struct XtreamCategory {
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: Option<String>,
    pub category_name: String,
}

// ============================================================================
// EPG
// ============================================================================

/// Short EPG entry (from get_short_epg)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct XtreamEpgEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub start_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "timestamp")]
    pub end_timestamp: Option<i64>,
    /// Name most panels actually use for the end time
    #[serde(default, deserialize_with = "timestamp")]
    pub stop_timestamp: Option<i64>,
}

impl XtreamEpgEntry {
    pub fn end_ts(&self) -> Option<i64> {
        self.end_timestamp.or(self.stop_timestamp)
    }
}

/// EPG listings container. Absent `epg_listings` means no guide; entries
/// are kept raw so one unreadable record does not hide the rest.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct XtreamEpgListings {
    #[serde(default)]
    pub epg_listings: Option<Vec<Value>>,
}

impl XtreamEpgListings {
    /// Readable entries, in provider order
    pub fn entries(self) -> Vec<XtreamEpgEntry> {
        self.epg_listings
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds(url: &str) -> XtreamCredentials {
        XtreamCredentials {
            url: url.to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            proxy_url: None,
        }
    }

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(creds("example.com:8080/").base_url(), "http://example.com:8080");
        assert_eq!(creds("  https://tv.example.com  ").base_url(), "https://tv.example.com");
        assert_eq!(creds("http://x.y/").base_url(), "http://x.y");
    }

    #[test]
    fn test_credentials_url_builders() {
        let c = creds("http://example.com:8080");

        assert_eq!(
            c.api_url(None),
            "http://example.com:8080/player_api.php?username=user&password=pass"
        );
        assert_eq!(
            c.api_url(Some("get_live_streams")),
            "http://example.com:8080/player_api.php?username=user&password=pass&action=get_live_streams"
        );
        assert_eq!(c.live_url("123"), "http://example.com:8080/live/user/pass/123.ts");
    }

    #[test]
    fn test_api_url_encodes_credentials() {
        let mut c = creds("http://x");
        c.password = "p&ss word".to_string();
        assert!(c.api_url(None).ends_with("password=p%26ss%20word"));
    }

    #[test]
    fn test_user_info_auth_rules() {
        let rejected: XtreamUserInfo = serde_json::from_value(json!({ "auth": 0 })).unwrap();
        assert!(!rejected.is_authenticated());

        let rejected: XtreamUserInfo = serde_json::from_value(json!({ "auth": "0", "username": "" })).unwrap();
        assert!(!rejected.is_authenticated());

        let ok: XtreamUserInfo =
            serde_json::from_value(json!({ "auth": 1, "username": "u", "status": "Active" })).unwrap();
        assert!(ok.is_authenticated());
        assert!(ok.is_active());

        // auth 0 but a username present is still accepted
        let odd: XtreamUserInfo = serde_json::from_value(json!({ "auth": 0, "username": "u" })).unwrap();
        assert!(odd.is_authenticated());
    }

    #[test]
    fn test_user_info_numeric_status() {
        let info: XtreamUserInfo =
            serde_json::from_value(json!({ "auth": 1, "username": "u", "status": 1 })).unwrap();
        assert!(info.is_authenticated());
        assert_eq!(info.status.as_deref(), Some("1"));
    }

    #[test]
    fn test_live_stream_numeric_and_string_ids() {
        let a: XtreamLiveStream = serde_json::from_value(json!({ "stream_id": 42, "name": "A" })).unwrap();
        let b: XtreamLiveStream =
            serde_json::from_value(json!({ "stream_id": "43", "category_id": 7, "epg_channel_id": null })).unwrap();

        assert_eq!(a.stream_id.as_deref(), Some("42"));
        assert_eq!(b.stream_id.as_deref(), Some("43"));
        assert_eq!(b.category_id.as_deref(), Some("7"));
        assert!(b.epg_channel_id.is_none());
    }

    #[test]
    fn test_epg_entry_timestamps() {
        let e: XtreamEpgEntry = serde_json::from_value(json!({
            "title": "VA==",
            "start_timestamp": "1700000000",
            "stop_timestamp": 1700003600
        }))
        .unwrap();

        assert_eq!(e.start_timestamp, Some(1_700_000_000));
        assert_eq!(e.end_ts(), Some(1_700_003_600));
    }

    #[test]
    fn test_epg_listings_missing() {
        let l: XtreamEpgListings = serde_json::from_value(json!({})).unwrap();
        assert!(l.epg_listings.is_none());
        assert!(l.entries().is_empty());
    }

    #[test]
    fn test_epg_listings_skip_unreadable_entries() {
        let l: XtreamEpgListings = serde_json::from_value(json!({
            "epg_listings": [
                { "title": 42, "start": "a", "end": "b" },
                { "title": "T2s=", "start": "c", "end": "d" }
            ]
        }))
        .unwrap();

        let entries = l.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("T2s="));
    }
}
