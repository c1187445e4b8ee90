//! Channel catalog of one playlist
//!
//! Single owned store; every surface (grid, detail view, guide) reads and
//! writes through it, so a favorite toggled in one place is what every other
//! reader sees. Reads return lazy views over a read lock; writes take the
//! write lock for the whole mutation.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::models::{display_name, Channel, ChannelEdit};

/// Search and adult-content predicate
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    /// Lower-cased search text, empty matches everything
    query: String,
    show_adult: bool,
}

impl Default for ChannelFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            show_adult: true,
        }
    }
}

impl ChannelFilter {
    pub fn search(mut self, query: &str) -> Self {
        self.query = query.trim().to_lowercase();
        self
    }

    pub fn show_adult(mut self, show_adult: bool) -> Self {
        self.show_adult = show_adult;
        self
    }

    pub fn matches(&self, channel: &Channel) -> bool {
        (self.show_adult || !channel.is_adult()) && channel.matches_lowercase(&self.query)
    }
}

/// Filtered, read-locked view of the catalog. Nothing is copied until the
/// caller iterates; drop it before mutating the catalog from the same task.
pub struct CatalogView<'a> {
    channels: RwLockReadGuard<'a, Vec<Channel>>,
    filter: ChannelFilter,
}

impl<'a> CatalogView<'a> {
    /// Compose with the adult filter; search still applies
    pub fn apply_adult_filter(mut self, show_adult: bool) -> Self {
        self.filter = self.filter.show_adult(show_adult);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.channels.iter().filter(move |c| self.filter.matches(c))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Copy out a window of the matching channels
    pub fn window(&self, offset: usize, limit: usize) -> Vec<Channel> {
        self.iter().skip(offset).take(limit).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<Channel> {
        self.iter().cloned().collect()
    }
}

/// Channel store
#[derive(Debug, Default)]
pub struct Catalog {
    channels: RwLock<Vec<Channel>>,
}

impl Catalog {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels: RwLock::new(channels),
        }
    }

    /// View with an arbitrary filter
    pub fn view(&self, filter: ChannelFilter) -> CatalogView<'_> {
        CatalogView {
            channels: self.channels.read(),
            filter,
        }
    }

    /// Case-insensitive match on name or group
    pub fn search(&self, query: &str) -> CatalogView<'_> {
        self.view(ChannelFilter::default().search(query))
    }

    /// All channels, minus adult groups unless `show_adult`
    pub fn apply_adult_filter(&self, show_adult: bool) -> CatalogView<'_> {
        self.view(ChannelFilter::default().show_adult(show_adult))
    }

    /// Flip the favorite flag of one channel. Returns the new value, or
    /// `None` when the id is unknown (nothing changes).
    pub fn toggle_favorite(&self, channel_id: &str) -> Option<bool> {
        let mut channels = self.channels.write();
        let channel = channels.iter_mut().find(|c| c.id == channel_id)?;
        channel.is_favorite = !channel.is_favorite;
        Some(channel.is_favorite)
    }

    /// Favorite channels in catalog order
    pub fn favorites(&self) -> Vec<Channel> {
        self.channels
            .read()
            .iter()
            .filter(|c| c.is_favorite)
            .cloned()
            .collect()
    }

    pub fn get(&self, channel_id: &str) -> Option<Channel> {
        self.channels
            .read()
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
    }

    /// Apply a manual edit. Blank names fall back to the sentinel, URLs are
    /// trimmed, blank groups and URLs are ignored.
    pub fn update_channel(&self, channel_id: &str, edit: ChannelEdit) -> Option<Channel> {
        let mut channels = self.channels.write();
        let channel = channels.iter_mut().find(|c| c.id == channel_id)?;

        if let Some(name) = edit.name {
            channel.name = display_name(&name);
        }
        if let Some(group) = edit.group.filter(|g| !g.trim().is_empty()) {
            channel.group = group.trim().to_string();
        }
        if let Some(url) = edit.url.filter(|u| !u.trim().is_empty()) {
            channel.url = url.trim().to_string();
        }

        Some(channel.clone())
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    pub fn favorite_count(&self) -> usize {
        self.channels.read().iter().filter(|c| c.is_favorite).count()
    }

    /// Copy of every channel, in order
    pub fn snapshot(&self) -> Vec<Channel> {
        self.channels.read().clone()
    }
}
