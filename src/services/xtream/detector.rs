//! Xtream Codes URL Detection
//!
//! Recognizes provider playlist links so an M3U-URL import can use the
//! Player API instead of downloading and parsing the whole playlist.

use super::types::XtreamCredentials;
use tracing::debug;
use url::Url;

/// Extract Xtream credentials from an M3U URL
///
/// Supported URL patterns:
/// - `http://server:port/get.php?username=X&password=Y&...`
/// - `http://server:port/get.php?username=X&password=Y&type=m3u_plus&output=ts`
///
/// # Returns
/// - `Some(XtreamCredentials)` if URL matches Xtream pattern
/// - `None` if URL is not an Xtream M3U URL
pub fn extract_credentials(m3u_url: &str) -> Option<XtreamCredentials> {
    let parsed = match Url::parse(m3u_url.trim()) {
        Ok(url) => url,
        Err(e) => {
            debug!("Failed to parse URL: {}", e);
            return None;
        }
    };

    let path = parsed.path().to_lowercase();
    if !path.ends_with("/get.php") {
        return None;
    }

    let mut username = None;
    let mut password = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "username" => username = Some(value.into_owned()),
            "password" => password = Some(value.into_owned()),
            _ => {}
        }
    }

    let username = username.filter(|u| !u.is_empty())?;
    let password = password.filter(|p| !p.is_empty())?;

    let host = parsed.host_str()?;
    let port_suffix = parsed
        .port()
        .map(|p| format!(":{}", p))
        .unwrap_or_default();
    let server = format!("{}://{}{}", parsed.scheme(), host, port_suffix);

    debug!(
        "Extracted Xtream credentials: server={}, username={}",
        server, username
    );

    Some(XtreamCredentials {
        url: server,
        username,
        password,
        proxy_url: None,
    })
}

impl XtreamCredentials {
    /// Credentials embedded in a provider playlist link, if any
    pub fn from_m3u_url(m3u_url: &str) -> Option<Self> {
        extract_credentials(m3u_url)
    }
}
