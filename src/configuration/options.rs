use clap::Parser;
use serde::{Deserialize, Serialize};

use super::types::feed_format::FeedFormat;

pub const DEFAULT_CONFIG_FILE: &str = "signboard.toml";

/// Command line options
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(name = "signboard", author, version, about)]
pub struct Opt {
    /// The config file to read
    ///
    /// All paths mentioned in the config are relative to the directory containing this file.
    #[clap(default_value_t = String::from(DEFAULT_CONFIG_FILE))]
    #[serde(skip)]
    pub config_file: String,

    /// Override the feed source (a URL or a file path)
    #[clap(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_source: Option<String>,

    /// Override the format of the feed source
    #[clap(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_format: Option<FeedFormat>,

    /// Create the example config file in the current directory
    #[clap(long, default_value_t = false)]
    #[serde(skip)]
    pub create_default_config: bool,

    /// Fetch the feed once, write the event snapshot, and exit
    #[clap(long, default_value_t = false, conflicts_with = "once")]
    #[serde(skip)]
    pub ingest: bool,

    /// Run the pipeline once, print every page, and exit
    #[clap(long, default_value_t = false)]
    #[serde(skip)]
    pub once: bool,
}
