//! On-demand short EPG loading
//!
//! At most one fetch per channel is in flight; a second request for the same
//! channel while the first is pending is answered with [`GuideLoad::Pending`]
//! instead of hitting the provider again. Loads for different channels run
//! concurrently and fail independently.

use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Channel, EpgProgram};
use crate::services::metrics;
use crate::services::resolver::FallbackResolver;
use crate::services::xtream::{xtream_fetch_epg, XtreamCredentials};

/// Outcome of one guide request
#[derive(Debug, Clone, PartialEq)]
pub enum GuideLoad {
    /// Provider answered; may be empty
    Loaded(Vec<EpgProgram>),
    /// A fetch for this channel is already running
    Pending,
    /// Channel has no stream id to look up
    Unavailable,
}

impl GuideLoad {
    pub fn into_programs(self) -> Vec<EpgProgram> {
        match self {
            GuideLoad::Loaded(programs) => programs,
            _ => Vec::new(),
        }
    }
}

/// Releases the channel's in-flight slot when the fetch ends, however it ends
struct InFlight {
    set: Arc<Mutex<HashSet<String>>>,
    channel_id: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.lock().remove(&self.channel_id);
    }
}

#[derive(Clone)]
pub struct GuideLoader {
    resolver: FallbackResolver,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl GuideLoader {
    pub fn new(resolver: FallbackResolver) -> Self {
        Self {
            resolver,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claim(&self, channel_id: &str) -> Option<InFlight> {
        let mut set = self.in_flight.lock();
        if !set.insert(channel_id.to_string()) {
            return None;
        }
        Some(InFlight {
            set: Arc::clone(&self.in_flight),
            channel_id: channel_id.to_string(),
        })
    }

    pub fn is_pending(&self, channel_id: &str) -> bool {
        self.in_flight.lock().contains(channel_id)
    }

    /// Load the guide for one channel
    pub async fn load(&self, creds: &XtreamCredentials, channel: &Channel) -> GuideLoad {
        let Some(stream_id) = channel.stream_id.as_deref().filter(|s| !s.is_empty()) else {
            metrics::record_guide("unavailable");
            return GuideLoad::Unavailable;
        };

        let Some(_slot) = self.claim(&channel.id) else {
            tracing::debug!("Guide fetch for {} already in flight", channel.id);
            metrics::record_guide("pending");
            return GuideLoad::Pending;
        };

        let programs = xtream_fetch_epg(&self.resolver, creds, stream_id).await;
        metrics::record_guide("loaded");
        GuideLoad::Loaded(programs)
    }

    /// Load guides for several channels at once, results in input order
    pub async fn load_many(
        &self,
        creds: &XtreamCredentials,
        channels: &[Channel],
    ) -> Vec<(String, GuideLoad)> {
        let loads = channels.iter().map(|channel| async move {
            (channel.id.clone(), self.load(creds, channel).await)
        });
        join_all(loads).await
    }
}
