//! Xtream Codes Integration
//!
//! The three Player API calls the engine needs, all resolved through the
//! fallback resolver:
//!
//! ```text
//! {base}/player_api.php?username=U&password=P                                  login
//! {base}/player_api.php?username=U&password=P&action=get_live_streams          channels
//! {base}/player_api.php?username=U&password=P&action=get_short_epg&stream_id=N guide
//! ```
//!
//! Channels point at `{base}/live/U/P/{stream_id}.ts`. The URL is fixed at
//! import time; changing the account later does not rewrite it.

pub mod client;
pub mod detector;
pub mod types;

// Re-exports for convenience
pub use client::{xtream_fetch_epg, xtream_login, XtreamError};
pub use types::XtreamCredentials;
