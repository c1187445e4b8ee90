mod config;
mod models;
mod routes;
mod services;

use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::models::Settings;
use crate::services::{guide::GuideLoader, library::Library, resolver::FallbackResolver};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub library: Library,
    pub settings: RwLock<Settings>,
    pub resolver: FallbackResolver,
    pub guide: GuideLoader,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let resolver = FallbackResolver::new(&config)?;
        let guide = GuideLoader::new(resolver.clone());

        Ok(Self {
            config,
            library: Library::new(),
            settings: RwLock::new(Settings::default()),
            resolver,
            guide,
            start_time: Instant::now(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luckyx_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting LuckyX Engine v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);
    tracing::info!(
        "Resolver: {} fallback proxies, {} ms per attempt, secure context: {}",
        config.fallback_proxies.len(),
        config.attempt_timeout_ms,
        config.secure_context
    );

    let state = Arc::new(AppState::new(config)?);

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
