use chrono_tz::Tz;
use log::{debug, info};
use reqwest::header::USER_AGENT;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use super::description::clean_line;
use super::event::{NormalizedEvent, RawEventItem};
use super::snapshot::SnapshotEvent;
use crate::configuration::types::feed_format::FeedFormat;

/// Reasons a refresh produced no new events
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not fetch feed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("feed request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not read feed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed is not in the expected shape: {0}")]
    Shape(String),
}

/// One entry handed to the pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedItem {
    /// Straight from the syndication feed, details still buried in free text
    Raw(RawEventItem),
    /// From a snapshot written by an earlier ingest
    Snapshot(SnapshotEvent),
}

impl FeedItem {
    pub fn normalize(&self, tz: &Tz) -> Option<NormalizedEvent> {
        match self {
            FeedItem::Raw(item) => item.normalize(tz),
            FeedItem::Snapshot(record) => record.normalize(tz),
        }
    }
}

/// Anything that can produce the current list of feed items
///
/// Transport concerns such as retries stay behind this trait.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<FeedItem>, FeedError>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedLocation {
    FeedUrl(Url),
    FeedFile(PathBuf),
}

impl FeedLocation {
    /// Interprets `source` as a URL, or else as a path relative to `base_dir`
    pub fn new(source: &str, base_dir: &Path) -> FeedLocation {
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => FeedLocation::FeedUrl(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => FeedLocation::FeedFile(path),
                Err(()) => FeedLocation::FeedFile(base_dir.join(source)),
            },
            _ => FeedLocation::FeedFile(base_dir.join(source)),
        }
    }
}

impl fmt::Display for FeedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedLocation::FeedUrl(url) => write!(f, "{}", url),
            FeedLocation::FeedFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A feed read from a URL or a file each time it is fetched
#[derive(Debug)]
pub struct LocationFeed {
    location: FeedLocation,
    format: FeedFormat,
    user_agent: String,
    client: reqwest::Client,
}

impl LocationFeed {
    pub fn new(location: FeedLocation, format: FeedFormat, user_agent: &str) -> Self {
        LocationFeed {
            location,
            format,
            user_agent: user_agent.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    pub fn location(&self) -> &FeedLocation {
        &self.location
    }

    async fn fetch_text(&self) -> Result<String, FeedError> {
        match &self.location {
            FeedLocation::FeedUrl(url) => {
                info!("fetching feed: {}", url);
                let response = self
                    .client
                    .get(url.clone())
                    .header(USER_AGENT, &self.user_agent)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(FeedError::Status(response.status()));
                }
                Ok(response.text().await?)
            }
            FeedLocation::FeedFile(path) => {
                info!("reading feed file: {}", path.display());
                Ok(tokio::fs::read_to_string(path).await?)
            }
        }
    }
}

impl FeedSource for LocationFeed {
    fn fetch(&self) -> impl Future<Output = Result<Vec<FeedItem>, FeedError>> + Send {
        async move {
            let text = self.fetch_text().await?;
            decode(&text, self.format)
        }
    }
}

/// Decodes a fetched document into feed items
pub fn decode(text: &str, format: FeedFormat) -> Result<Vec<FeedItem>, FeedError> {
    let items = match format {
        FeedFormat::Rss => decode_rss(text)?.into_iter().map(FeedItem::Raw).collect(),
        FeedFormat::Snapshot => decode_snapshot(text)?
            .into_iter()
            .map(FeedItem::Snapshot)
            .collect::<Vec<_>>(),
    };
    debug!("decoded {} feed items", items.len());
    Ok(items)
}

/// Reads the `rss/channel/item` entries of a syndication document
///
/// A document without a channel is a shape error, a channel without items is an empty feed.
pub fn decode_rss(text: &str) -> Result<Vec<RawEventItem>, FeedError> {
    let doc = roxmltree::Document::parse(text).map_err(|e| FeedError::Shape(e.to_string()))?;

    let root = doc.root_element();
    if !root.has_tag_name("rss") {
        return Err(FeedError::Shape(format!(
            "expected an rss document, found <{}>",
            root.tag_name().name()
        )));
    }
    let channel = root
        .children()
        .find(|n| n.has_tag_name("channel"))
        .ok_or_else(|| FeedError::Shape("rss document has no channel".into()))?;

    let items = channel
        .children()
        .filter(|n| n.has_tag_name("item"))
        .map(|item| {
            let description = child_text(item, "description");
            RawEventItem {
                title: clean_line(&child_text(item, "title")),
                body: if description.trim().is_empty() {
                    child_text(item, "encoded")
                } else {
                    description
                },
                link: clean_line(&child_text(item, "link")),
            }
        })
        .collect();
    Ok(items)
}

/// Reads a snapshot, which must be a JSON list of event records
pub fn decode_snapshot(text: &str) -> Result<Vec<SnapshotEvent>, FeedError> {
    serde_json::from_str(text).map_err(|e| FeedError::Shape(e.to_string()))
}

/// All text below the first child element called `name`, CDATA included
fn child_text(node: roxmltree::Node, name: &str) -> String {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .map(|n| {
            n.descendants()
                .filter(|d| d.is_text())
                .filter_map(|d| d.text())
                .collect::<String>()
        })
        .unwrap_or_default()
}
