use uuid::Uuid;

use crate::models::{display_name, Channel, DEFAULT_M3U_GROUP};
use crate::services::attributes::{parse_extinf, ExtinfLine, EXTINF_MARKER};

/// Something the parser tolerated while reading a playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAnomaly {
    /// Metadata line replaced by another one before any URL showed up
    DanglingMetadata { line: usize },
    /// URL line with no pending metadata
    OrphanUrl { line: usize },
    /// Attribute fragments that could not be read on a metadata line
    MalformedAttributes { line: usize, count: usize },
}

/// Channels plus everything that was skipped on the way
#[derive(Debug, Default)]
pub struct ParseReport {
    pub channels: Vec<Channel>,
    pub anomalies: Vec<ParseAnomaly>,
}

/// Metadata waiting for its stream URL
struct PendingEntry {
    line: usize,
    name: String,
    logo: Option<String>,
    group: String,
    tvg_id: Option<String>,
}

impl PendingEntry {
    fn from_extinf(line: usize, extinf: &ExtinfLine) -> Self {
        Self {
            line,
            name: display_name(&extinf.name),
            logo: extinf.first_of(&["tvg-logo", "logo"]).map(str::to_string),
            group: extinf
                .first_of(&["group-title", "group"])
                .unwrap_or(DEFAULT_M3U_GROUP)
                .to_string(),
            tvg_id: extinf.first_of(&["tvg-id", "id"]).map(str::to_string),
        }
    }

    fn into_channel(self, url: &str) -> Channel {
        Channel {
            id: Uuid::new_v4().to_string(),
            stream_id: self.tvg_id.clone(),
            name: self.name,
            url: url.to_string(),
            logo: self.logo,
            group: self.group,
            tvg_id: self.tvg_id,
            is_favorite: false,
        }
    }
}

/// Parse playlist text into channels. Never fails; anything unreadable is
/// skipped.
pub fn parse_m3u(text: &str) -> Vec<Channel> {
    parse_m3u_report(text).channels
}

/// Parse playlist text, keeping track of what was skipped
///
/// A `#EXTINF:` line opens a pending entry; the next line starting with
/// `http` closes it into a channel. Other lines (`#EXTM3U`, `#EXTVLCOPT`,
/// comments, blanks) are ignored and do not clear the pending entry.
pub fn parse_m3u_report(text: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut pending: Option<PendingEntry> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.starts_with(EXTINF_MARKER) {
            let extinf = parse_extinf(line);
            if extinf.skipped > 0 {
                report.anomalies.push(ParseAnomaly::MalformedAttributes {
                    line: line_no,
                    count: extinf.skipped,
                });
            }
            if let Some(previous) = pending.replace(PendingEntry::from_extinf(line_no, &extinf)) {
                report
                    .anomalies
                    .push(ParseAnomaly::DanglingMetadata { line: previous.line });
            }
        } else if line.starts_with("http") {
            match pending.take() {
                Some(entry) => report.channels.push(entry.into_channel(line)),
                None => report.anomalies.push(ParseAnomaly::OrphanUrl { line: line_no }),
            }
        }
    }

    if let Some(entry) = pending {
        report
            .anomalies
            .push(ParseAnomaly::DanglingMetadata { line: entry.line });
    }

    if !report.anomalies.is_empty() {
        tracing::debug!(
            channels = report.channels.len(),
            anomalies = report.anomalies.len(),
            "M3U parsed with skipped entries"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_attributes_survive() {
        let text = "#EXTINF:-1 tvg-logo=\"http://x/y.png\" group-title=\"News\",BBC\nhttp://stream/1";
        let channels = parse_m3u(text);

        assert_eq!(channels.len(), 1);
        let ch = &channels[0];
        assert_eq!(ch.logo.as_deref(), Some("http://x/y.png"));
        assert_eq!(ch.group, "News");
        assert_eq!(ch.name, "BBC");
        assert_eq!(ch.url, "http://stream/1");
        assert!(!ch.is_favorite);
        assert!(ch.stream_id.is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_m3u("").is_empty());
        assert!(parse_m3u("\n\r\n  \n").is_empty());
    }

    #[test]
    fn test_garbage_never_panics() {
        let garbage = "\u{0}\u{feff}#EXTINF\n#EXTINF:\n#EXTINF:,,,=\"\nhttp\n=====\n#EXTINF:-1 a='b\n'\"";
        let channels = parse_m3u(garbage);
        // "#EXTINF:,,,=\"" pairs with the bare "http" line
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "http");
    }

    #[test]
    fn test_order_preserved_and_ids_unique() {
        let text = "#EXTM3U\r\n\
                    #EXTINF:-1,One\r\nhttp://s/1\r\n\
                    #EXTINF:-1,Two\r\nhttp://s/2\r\n\
                    #EXTINF:-1,Three\r\nhttps://s/3\r\n";
        let channels = parse_m3u(text);

        let names: Vec<_> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
        assert_eq!(channels[2].url, "https://s/3");

        let ids: HashSet<_> = channels.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_metadata_without_url_is_dropped() {
        let report = parse_m3u_report("#EXTINF:-1,Lonely\n# just a comment\n");
        assert!(report.channels.is_empty());
        assert_eq!(report.anomalies, vec![ParseAnomaly::DanglingMetadata { line: 1 }]);
    }

    #[test]
    fn test_consecutive_metadata_keeps_latest() {
        let text = "#EXTINF:-1,First\n#EXTINF:-1,Second\nhttp://s/2";
        let report = parse_m3u_report(text);

        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].name, "Second");
        assert!(report
            .anomalies
            .contains(&ParseAnomaly::DanglingMetadata { line: 1 }));
    }

    #[test]
    fn test_orphan_url_is_skipped() {
        let report = parse_m3u_report("http://s/orphan\n#EXTINF:-1,Real\nhttp://s/real");

        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].url, "http://s/real");
        assert_eq!(report.anomalies, vec![ParseAnomaly::OrphanUrl { line: 1 }]);
    }

    #[test]
    fn test_directives_between_metadata_and_url() {
        let text = "#EXTINF:-1 tvg-id=\"cnn.us\",CNN\n#EXTVLCOPT:http-user-agent=VLC\n\nhttp://s/cnn";
        let channels = parse_m3u(text);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].tvg_id.as_deref(), Some("cnn.us"));
        assert_eq!(channels[0].stream_id.as_deref(), Some("cnn.us"));
    }

    #[test]
    fn test_defaults_and_alias_keys() {
        let text = "#EXTINF:-1,\nhttp://s/1\n#EXTINF:-1 logo=\"l.png\" group=\"Kids\" id=\"k\",Toons\nhttp://s/2";
        let channels = parse_m3u(text);

        assert_eq!(channels[0].name, "Unnamed Channel");
        assert_eq!(channels[0].group, "General");
        assert_eq!(channels[1].logo.as_deref(), Some("l.png"));
        assert_eq!(channels[1].group, "Kids");
        assert_eq!(channels[1].tvg_id.as_deref(), Some("k"));
    }

    #[test]
    fn test_duplicates_are_not_merged() {
        let text = "#EXTINF:-1,Same\nhttp://s/1\n#EXTINF:-1,Same\nhttp://s/1";
        let channels = parse_m3u(text);
        assert_eq!(channels.len(), 2);
        assert_ne!(channels[0].id, channels[1].id);
    }

    #[test]
    fn test_malformed_attributes_reported() {
        let report = parse_m3u_report("#EXTINF:-1 tvg-logo=\"oops,Name\nhttp://s/1");
        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].name, "Name");
        assert!(report.channels[0].logo.is_none());
        assert_eq!(
            report.anomalies,
            vec![ParseAnomaly::MalformedAttributes { line: 1, count: 1 }]
        );
    }
}
