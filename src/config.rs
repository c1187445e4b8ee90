use std::env;
use std::time::Duration;

/// Public CORS proxies tried after the direct route and the user's own proxy.
pub const DEFAULT_FALLBACK_PROXIES: [&str; 4] = [
    "https://corsproxy.io/?",
    "https://api.allorigins.win/raw?url=",
    "https://thingproxy.freeboard.io/fetch/",
    "https://api.codetabs.com/v1/proxy?quest=",
];

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Fallback resolver
    /// When true the direct route to plain `http://` targets is treated as
    /// mixed content and skipped.
    pub secure_context: bool,
    pub attempt_timeout_ms: u64,
    pub fallback_proxies: Vec<String>,

    // Import
    pub max_items_page: usize,
    pub max_m3u_size_mb: usize,

    // Misc
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // Fallback resolver
            secure_context: env::var("SECURE_CONTEXT")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            attempt_timeout_ms: env::var("ATTEMPT_TIMEOUT_MS")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8_000), // 8 seconds
            fallback_proxies: env::var("FALLBACK_PROXIES")
                .ok()
                .map(|v| parse_proxy_list(&v))
                .unwrap_or_else(default_proxies),

            // Import
            max_items_page: env::var("MAX_ITEMS_PAGE")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            max_m3u_size_mb: env::var("MAX_M3U_SIZE_MB")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),

            // Misc - mimic a common IPTV player to avoid provider blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "IPTVSmarters/1.0.3".to_string()),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_proxies() -> Vec<String> {
    DEFAULT_FALLBACK_PROXIES.iter().map(|p| p.to_string()).collect()
}

/// Split a comma separated proxy list, dropping blank entries.
/// An explicitly empty list disables the public proxies.
fn parse_proxy_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
