//! Multi-route fetcher
//!
//! Providers are often unreachable from where the request originates (mixed
//! content, CORS, geo blocks). A fetch walks an ordered list of routes:
//!
//! 1. `Direct` - the target itself, skipped in a secure context when the
//!    target is plain `http://`
//! 2. `Custom Proxy` - the caller's own proxy, when given
//! 3. `Proxy 1..N` - public proxies from configuration
//!
//! The first usable response (2xx, or 401 which is an answer about the
//! credentials rather than the route) wins and later routes are never tried.

use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::metrics;

/// One transport path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub proxy: Option<String>,
}

impl Route {
    /// Final URL for `target` on this route
    pub fn url_for(&self, target: &str) -> String {
        match &self.proxy {
            Some(proxy) => proxied_url(proxy, target),
            None => target.to_string(),
        }
    }
}

/// Build the proxied URL.
///
/// Query-style proxies (`https://p/?url=`) get the target percent-encoded;
/// path-style proxies (`https://p/fetch/`) get the raw target appended.
pub fn proxied_url(proxy: &str, target: &str) -> String {
    if proxy.contains('?') {
        format!("{}{}", proxy, urlencoding::encode(target))
    } else {
        format!("{}{}", proxy, target)
    }
}

/// Why a route did not produce a usable response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Not attempted: secure context to an insecure target
    Blocked,
    /// Non-usable HTTP status
    Status(u16),
    /// Attempt exceeded the per-route timeout
    Timeout,
    /// Connection, TLS or body read failure
    Network(String),
    /// Body larger than the caller's limit
    TooLarge,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Blocked => write!(f, "Blocked (Mixed Content)"),
            FailureReason::Status(code) => write!(f, "Error {}", code),
            FailureReason::Timeout => write!(f, "Timed out"),
            FailureReason::Network(e) => write!(f, "{}", e),
            FailureReason::TooLarge => write!(f, "Response exceeds size limit"),
        }
    }
}

/// Diagnostic for one route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFailure {
    pub route: String,
    pub reason: FailureReason,
}

impl fmt::Display for RouteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.route, self.reason)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Every route failed; one diagnostic per route, in attempt order
    #[error("All connection routes failed:\n{}", join_failures(.0))]
    Exhausted(Vec<RouteFailure>),
}

fn join_failures(failures: &[RouteFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ResolveError {
    pub fn failures(&self) -> &[RouteFailure] {
        match self {
            ResolveError::Exhausted(failures) => failures,
        }
    }

    /// Whether any route answered with `status`
    pub fn has_status(&self, status: u16) -> bool {
        self.failures()
            .iter()
            .any(|f| f.reason == FailureReason::Status(status))
    }

    pub fn is_too_large(&self) -> bool {
        self.failures()
            .iter()
            .any(|f| f.reason == FailureReason::TooLarge)
    }
}

/// Usable response, body already read
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Name of the route that answered
    pub route: String,
    pub status: u16,
    pub body: String,
}

impl Resolved {
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Fetches a URL over the route list
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    http: Client,
    proxies: Vec<String>,
    attempt_timeout: Duration,
    secure_context: bool,
}

impl FallbackResolver {
    /// Create a resolver from application configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_settings(
            config.fallback_proxies.clone(),
            config.attempt_timeout(),
            config.secure_context,
            &config.user_agent,
        )
    }

    pub fn with_settings(
        proxies: Vec<String>,
        attempt_timeout: Duration,
        secure_context: bool,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .danger_accept_invalid_certs(true) // Many IPTV servers have self-signed certs
            .build()?;

        Ok(Self {
            http,
            proxies,
            attempt_timeout,
            secure_context,
        })
    }

    /// Ordered route list for one fetch
    pub fn routes(&self, user_proxy: Option<&str>) -> Vec<Route> {
        let mut routes = vec![Route {
            name: "Direct".to_string(),
            proxy: None,
        }];

        if let Some(proxy) = user_proxy.map(str::trim).filter(|p| !p.is_empty()) {
            routes.push(Route {
                name: "Custom Proxy".to_string(),
                proxy: Some(proxy.to_string()),
            });
        }

        routes.extend(self.proxies.iter().enumerate().map(|(i, proxy)| Route {
            name: format!("Proxy {}", i + 1),
            proxy: Some(proxy.clone()),
        }));

        routes
    }

    /// Walk the routes until one gives a usable response
    pub async fn fetch(&self, target: &str, user_proxy: Option<&str>) -> Result<Resolved, ResolveError> {
        self.fetch_with_limit(target, user_proxy, None).await
    }

    /// Like [`fetch`](Self::fetch), but a body over `max_bytes` is not read
    /// past the limit. An oversized answer ends the walk, since every route
    /// serves the same target.
    pub async fn fetch_limited(
        &self,
        target: &str,
        user_proxy: Option<&str>,
        max_bytes: usize,
    ) -> Result<Resolved, ResolveError> {
        self.fetch_with_limit(target, user_proxy, Some(max_bytes)).await
    }

    async fn fetch_with_limit(
        &self,
        target: &str,
        user_proxy: Option<&str>,
        max_bytes: Option<usize>,
    ) -> Result<Resolved, ResolveError> {
        let insecure_target = target.starts_with("http://");
        let mut failures = Vec::new();

        for route in self.routes(user_proxy) {
            if route.proxy.is_none() && self.secure_context && insecure_target {
                metrics::record_attempt(&route.name, "blocked");
                failures.push(RouteFailure {
                    route: route.name,
                    reason: FailureReason::Blocked,
                });
                continue;
            }

            let url = route.url_for(target);
            debug!(route = %route.name, "Resolver attempt");

            match self.attempt(&url, max_bytes).await {
                Ok((status, body)) => {
                    metrics::record_attempt(&route.name, "ok");
                    debug!(route = %route.name, status, "Resolver route answered");
                    return Ok(Resolved {
                        route: route.name,
                        status,
                        body,
                    });
                }
                Err(reason) => {
                    let outcome = match reason {
                        FailureReason::Timeout => "timeout",
                        FailureReason::Status(_) => "status",
                        FailureReason::TooLarge => "too_large",
                        _ => "network",
                    };
                    metrics::record_attempt(&route.name, outcome);
                    debug!(route = %route.name, reason = %reason, "Resolver route failed");
                    let stop = reason == FailureReason::TooLarge;
                    failures.push(RouteFailure {
                        route: route.name,
                        reason,
                    });
                    if stop {
                        break;
                    }
                }
            }
        }

        let err = ResolveError::Exhausted(failures);
        warn!("{}", err);
        Err(err)
    }

    /// One bounded request: send and read the body within the timeout
    async fn attempt(&self, url: &str, max_bytes: Option<usize>) -> Result<(u16, String), FailureReason> {
        let request = async {
            let mut response = self
                .http
                .get(url)
                .header("Accept", "application/json")
                .header("X-Requested-With", "XMLHttpRequest")
                .send()
                .await
                .map_err(|e| FailureReason::Network(e.to_string()))?;

            let status = response.status();
            if !(status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED) {
                return Err(FailureReason::Status(status.as_u16()));
            }

            let Some(max_bytes) = max_bytes else {
                let body = response
                    .text()
                    .await
                    .map_err(|e| FailureReason::Network(e.to_string()))?;
                return Ok((status.as_u16(), body));
            };

            if response.content_length().is_some_and(|len| len > max_bytes as u64) {
                return Err(FailureReason::TooLarge);
            }

            let mut body = Vec::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FailureReason::Network(e.to_string()))?
            {
                if body.len() + chunk.len() > max_bytes {
                    return Err(FailureReason::TooLarge);
                }
                body.extend_from_slice(&chunk);
            }

            Ok((status.as_u16(), String::from_utf8_lossy(&body).into_owned()))
        };

        match tokio::time::timeout(self.attempt_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FailureReason::Timeout),
        }
    }
}
