use chrono::Utc;
use clap::Parser;
use color_eyre::eyre::{self, bail, WrapErr};
use flexi_logger::Logger;
use log::info;
use std::{fs, io, path::Path};

use signboard::configuration::config::Config;
use signboard::configuration::options::{Opt, DEFAULT_CONFIG_FILE};
use signboard::model::clock::SystemClock;
use signboard::model::feed_source::{FeedLocation, FeedSource, LocationFeed};
use signboard::model::pipeline::{self, PipelineSettings};
use signboard::runtime::{RuntimeTimings, SignageRuntime};
use signboard::views::html_view::{load_templates, HtmlRenderer};
use signboard::views::page_view::{DisplayFormat, PageContext, Renderer};
use signboard::views::snapshot_view::write_snapshot;
use signboard::views::text_view::TextRenderer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    let args = Opt::parse();

    if args.create_default_config {
        return create_default_config();
    }

    let config = Config::new(&args.config_file, &args)?;
    let location = FeedLocation::new(&config.feed_source, &config.base_dir);
    let feed = LocationFeed::new(location, config.feed_format, &config.user_agent);

    if args.ingest {
        return ingest(&config, &feed).await;
    }

    let tera = load_templates(&config.resolve(&config.template_path))?;

    if args.once {
        return print_once(&config, &feed, TextRenderer::new(tera, io::stdout())).await;
    }

    let timings = RuntimeTimings::from_config(&config)?;
    let renderer = HtmlRenderer::new(
        tera,
        config.resolve(&config.output_path),
        timings.page_interval.as_secs(),
    );
    info!("writing pages to {:?}", renderer.output_path());

    let mut runtime = SignageRuntime::new(
        feed,
        SystemClock,
        renderer,
        PipelineSettings::from(&config),
        DisplayFormat::from(&config),
        timings,
    );
    runtime
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("could not listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}

fn create_default_config() -> eyre::Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        bail!("refusing to overwrite existing config file: {:?}", path);
    }
    info!("writing default config to {:?}", path);
    fs::write(path, doku::to_toml::<Config>()).wrap_err("could not write default config")?;
    Ok(())
}

async fn ingest(config: &Config, feed: &LocationFeed) -> eyre::Result<()> {
    let items = feed
        .fetch()
        .await
        .wrap_err_with(|| format!("could not ingest feed from {}", feed.location()))?;
    let snapshot = pipeline::ingest(&items, Utc::now(), &config.display_timezone.timezone());
    write_snapshot(&snapshot, &config.resolve(&config.snapshot_path))
}

async fn print_once(
    config: &Config,
    feed: &LocationFeed,
    mut renderer: impl Renderer,
) -> eyre::Result<()> {
    let items = feed
        .fetch()
        .await
        .wrap_err_with(|| format!("could not read feed from {}", feed.location()))?;
    let (_, pages) = pipeline::run(&items, Utc::now(), &PipelineSettings::from(config));

    if pages.page_count() == 0 {
        return renderer.clear();
    }
    let format = DisplayFormat::from(config);
    for page in pages.pages() {
        renderer.show(&PageContext::new(page, pages.page_count(), &format))?;
    }
    Ok(())
}
