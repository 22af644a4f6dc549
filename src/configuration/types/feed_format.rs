use clap::ValueEnum;
use doku::Document;
use serde::{Deserialize, Serialize};

/// The shape of the document found at the feed source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Document, ValueEnum)]
pub enum FeedFormat {
    /// An RSS syndication document whose item descriptions carry the event details as free text
    #[default]
    Rss,
    /// A JSON list previously written by `signboard --ingest`
    Snapshot,
}
