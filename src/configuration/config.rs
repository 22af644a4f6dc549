use color_eyre::eyre::{Result, WrapErr};
use doku::Document;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{
    options::Opt,
    types::{config_time_zone::ConfigTimeZone, feed_format::FeedFormat},
};

const DEFAULT_FEED_SOURCE: &str =
    "https://www.romeoville.org/RSSFeed.aspx?ModID=58&CID=All-calendar.xml";
const DEFAULT_SNAPSHOT_PATH: &str = "data/events.json";
const DEFAULT_OUTPUT_PATH: &str = "output/events.html";
const DEFAULT_TEMPLATE_PATH: &str = "templates";

#[derive(Debug, Deserialize, Serialize, Document)]
pub struct Config {
    /// The base directory against which all other paths are resolved
    ///
    /// This is normally automatically derived from the directory in which the config file resides
    #[doku(example = ".")]
    pub base_dir: PathBuf,

    /// The url or file path of the event feed
    ///
    /// NOTE: File paths are relative to the config file
    #[doku(
        example = "https://www.romeoville.org/RSSFeed.aspx?ModID=58&CID=All-calendar.xml",
        example = "data/events.json"
    )]
    pub feed_source: String,

    /// Whether the feed source is an RSS document or a snapshot written by `--ingest`
    #[doku(example = "Rss")]
    pub feed_format: FeedFormat,

    /// The file that `--ingest` writes the event snapshot to
    ///
    /// NOTE: This is relative to the config file
    #[doku(example = "data/events.json")]
    pub snapshot_path: PathBuf,

    /// The HTML file rewritten every time the displayed page changes
    ///
    /// NOTE: This is relative to the config file
    #[doku(example = "output/events.html")]
    pub output_path: PathBuf,

    /// The path for custom template files, these override the built in templates
    #[doku(example = "templates")]
    pub template_path: PathBuf,

    /// Name of the timezone in which feed dates are interpreted and times are displayed
    ///
    /// See available timezones here: <https://docs.rs/chrono-tz/latest/chrono_tz/enum.Tz.html>
    #[doku(example = "America/Chicago")]
    pub display_timezone: ConfigTimeZone,

    /// How many calendar months ahead of now an event may start and still be shown
    #[doku(example = "4")]
    pub horizon_months: u32,

    /// The maximum number of events kept in rotation
    #[doku(example = "32")]
    pub events_max: usize,

    /// Number of events shown on each page
    #[doku(example = "4")]
    pub events_per_page: usize,

    /// How long each page stays on screen
    #[doku(example = "20s")]
    pub page_interval: String,

    /// How long the display waits between fading a page out and fading the next one in
    #[doku(example = "350ms")]
    pub fade_settle: String,

    /// How often the feed is fetched again and the pipeline re-run
    #[doku(example = "1h")]
    pub refresh_interval: String,

    /// Events whose end is at most this many seconds after their start show a single time
    #[doku(example = "60")]
    pub same_instant_seconds: i64,

    /// The strftime format for the date of each event
    ///
    /// Available format options: <https://docs.rs/chrono/latest/chrono/format/strftime/index.html>
    #[doku(example = "%a, %b %-d")]
    pub event_date_format: String,

    /// The strftime format for the start and end times of each event
    ///
    /// Available format options: <https://docs.rs/chrono/latest/chrono/format/strftime/index.html>
    #[doku(example = "%-I:%M %p")]
    pub event_time_format: String,

    /// The User-Agent header sent when fetching the feed
    #[doku(example = "signboard")]
    pub user_agent: String,
}

/// Sane default values for the config struct.
impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: ".".into(),
            feed_source: DEFAULT_FEED_SOURCE.into(),
            feed_format: FeedFormat::Rss,
            snapshot_path: DEFAULT_SNAPSHOT_PATH.into(),
            output_path: DEFAULT_OUTPUT_PATH.into(),
            template_path: DEFAULT_TEMPLATE_PATH.into(),
            display_timezone: ConfigTimeZone::default(),
            horizon_months: 4,
            events_max: 32,
            events_per_page: 4,
            page_interval: "20s".into(),
            fade_settle: "350ms".into(),
            refresh_interval: "1h".into(),
            same_instant_seconds: 60,
            event_date_format: "%a, %b %-d".into(),
            event_time_format: "%-I:%M %p".into(),
            user_agent: "signboard".into(),
        }
    }
}

impl Config {
    pub fn new(config_path: &str, args: &Opt) -> Result<Config> {
        // a missing config file is fine, the defaults drive a working display
        let config_dir = Path::new(config_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        debug!("reading configuration from {:?}...", config_path);
        let figment: Figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .admerge(Serialized::defaults(args));

        // join should either append the path from the config, or replace it if the specified path is absolute
        let base_dir = figment
            .find_value("base_dir")?
            .as_str()
            .map(|d| config_dir.join(d))
            .unwrap_or(config_dir);

        debug!("base directory is set to: {:?}", base_dir);

        let config: Config = figment
            .merge(Figment::new().join(("base_dir", base_dir)))
            .extract()
            .wrap_err("could not read configuration")?;

        config.validate()?;
        debug!("config is: {:#?}", config);

        Ok(config)
    }

    /// Checks the values that cannot be checked by deserialization alone
    pub fn validate(&self) -> Result<()> {
        if self.page_interval()?.is_zero() {
            color_eyre::eyre::bail!("page_interval must be longer than zero");
        }
        self.fade_settle()?;
        if self.refresh_interval()?.is_zero() {
            color_eyre::eyre::bail!("refresh_interval must be longer than zero");
        }
        if self.events_per_page == 0 {
            color_eyre::eyre::bail!("events_per_page must be at least 1");
        }
        Ok(())
    }

    /// Resolves a configured path against the config file directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn page_interval(&self) -> Result<Duration> {
        parse_duration("page_interval", &self.page_interval)
    }

    pub fn fade_settle(&self) -> Result<Duration> {
        parse_duration("fade_settle", &self.fade_settle)
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration("refresh_interval", &self.refresh_interval)
    }
}

fn parse_duration(name: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .wrap_err_with(|| format!("could not parse {} duration: {:?}", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_display_constants() {
        let config = Config::default();
        assert_eq!(config.horizon_months, 4);
        assert_eq!(config.events_max, 32);
        assert_eq!(config.events_per_page, 4);
        assert_eq!(config.page_interval().unwrap(), Duration::from_secs(20));
        assert_eq!(config.fade_settle().unwrap(), Duration::from_millis(350));
        assert_eq!(config.refresh_interval().unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn bad_durations_are_rejected() {
        let config = Config {
            page_interval: "soon".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn command_line_overrides_the_feed_source() {
        let args = Opt {
            config_file: "does-not-exist/signboard.toml".into(),
            feed_source: Some("data/events.json".into()),
            feed_format: Some(FeedFormat::Snapshot),
            create_default_config: false,
            ingest: false,
            once: false,
        };
        let config = Config::new(&args.config_file, &args).unwrap();
        assert_eq!(config.feed_source, "data/events.json");
        assert_eq!(config.feed_format, FeedFormat::Snapshot);
        assert_eq!(
            config.resolve(Path::new("out.html")),
            PathBuf::from("does-not-exist/./out.html")
        );
    }
}
