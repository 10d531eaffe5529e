use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

/// One usable entry from a parsed feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    /// RFC 3339 timestamp, empty when the feed gives none
    pub published: String,
    pub link: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("entry {0:?} has no title")]
    MissingTitle(String),
    #[error("entry {0:?} has no link")]
    MissingLink(String),
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("NewsTriage/1.0 (RSS Classifier)")
            .build()?;

        Ok(Self { client })
    }

    /// Download and parse a feed, dropping malformed entries.
    ///
    /// Transport errors, non-2xx responses and unparseable documents fail the
    /// whole feed.
    pub async fn fetch_feed(&self, url: &str) -> anyhow::Result<Vec<FeedEntry>> {
        info!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let entries = parse_entries(&bytes)?;
        info!("Parsed {} usable entries from {}", entries.len(), url);
        Ok(entries)
    }
}

pub fn parse_entries(bytes: &[u8]) -> anyhow::Result<Vec<FeedEntry>> {
    let parsed = parser::parse(bytes)?;

    let entries = parsed
        .entries
        .into_iter()
        .filter_map(|entry| match entry_from_feed(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed entry: {}", e);
                None
            }
        })
        .collect();

    Ok(entries)
}

pub fn entry_from_feed(entry: feed_rs::model::Entry) -> Result<FeedEntry, EntryError> {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    if title.is_empty() {
        return Err(EntryError::MissingTitle(entry.id));
    }

    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    if link.is_empty() {
        return Err(EntryError::MissingLink(entry.id));
    }

    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    Ok(FeedEntry {
        title,
        summary,
        published,
        link,
    })
}
