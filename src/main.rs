// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Locator CLI
//!
//! Loads the persisted activity set, folds in newly extracted records,
//! normalizes everything and writes the store plus its renderings.

use std::path::PathBuf;

use activity_locator::{
    config::Config,
    db::{files, write_text, RecordStore},
    error::Result,
    models::ActivityRecord,
    services::{
        ingest::extract_all, render, Pipeline, RawResponseExtractor, ScrapeFileExtractor,
    },
    time_utils::today_local,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "activity_locator=debug,info";

#[derive(Parser, Debug)]
#[command(name = "activity-locator")]
#[command(about = "Normalize and map extracted kids' activity listings")]
#[command(version)]
struct Cli {
    /// Only correct dates in the existing store
    #[arg(long, conflicts_with = "validate_locations")]
    sanitize_only: bool,

    /// Only complete locations in the existing store
    #[arg(long)]
    validate_locations: bool,

    /// Replay saved vision responses (`*_response.json`) from this directory
    /// (default: `raw_responses` in the output directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    from_raw: Option<Option<PathBuf>>,

    /// Scraper output files to ingest
    #[arg(long, value_name = "FILE", num_args = 1..)]
    input: Vec<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Year that stale and yearless dates are anchored to
    #[arg(long, env = "ACTIVITY_CURRENT_YEAR")]
    current_year: Option<i32>,

    /// Skip writing the Markdown and map feed
    #[arg(long)]
    no_render: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(year) = cli.current_year {
        config.current_year = year;
    }
    config.validate().context("Invalid configuration")?;

    let today = cli.today.unwrap_or_else(today_local);
    tracing::info!(
        %today,
        current_year = config.current_year,
        output_dir = %config.output_dir.display(),
        "Starting activity locator"
    );

    let store = RecordStore::new(config.store_path());
    let pipeline = Pipeline::new(config, today);

    let records = if cli.sanitize_only {
        tracing::info!("Sanitize-only mode");
        pipeline.sanitize_store(&store)?
    } else if cli.validate_locations {
        let mut records = store.load()?;
        tracing::info!(count = records.len(), "Validate-locations mode");
        pipeline.complete_locations(&mut records)?;
        pipeline.merger().sort_by_date(&mut records);
        store.save(&records)?;
        records
    } else {
        let existing = store.load()?;
        let incoming = collect_incoming(&cli, &pipeline)?;
        let outcome = pipeline.run(existing, incoming)?;
        store.save(&outcome.records)?;
        outcome.records
    };

    if !cli.no_render {
        render_outputs(&pipeline, &records)?;
    }

    tracing::info!(count = records.len(), path = %store.path().display(), "Done");
    Ok(())
}

/// Records from every configured extractor.
fn collect_incoming(cli: &Cli, pipeline: &Pipeline) -> Result<Vec<ActivityRecord>> {
    let mut incoming = Vec::new();

    if let Some(dir) = &cli.from_raw {
        let dir = dir
            .clone()
            .unwrap_or_else(|| pipeline.config().output_dir.join(files::RAW_RESPONSES_DIR));
        let extractor = RawResponseExtractor::new(dir);
        let sources = extractor.discover()?;
        incoming.extend(extract_all(&extractor, &sources));
    }

    if !cli.input.is_empty() {
        let sources: Vec<_> = cli
            .input
            .iter()
            .map(|path| ScrapeFileExtractor::source_for(path))
            .collect();
        incoming.extend(extract_all(&ScrapeFileExtractor, &sources));
    }

    if incoming.is_empty() {
        tracing::info!("No new records; normalizing the existing store only");
    }
    Ok(incoming)
}

/// Write the Markdown listing and the map marker feed.
fn render_outputs(pipeline: &Pipeline, records: &[ActivityRecord]) -> Result<()> {
    let config = pipeline.config();

    let markdown_path = config.output_dir.join(files::MARKDOWN);
    write_text(&markdown_path, &render::render_markdown(records))?;
    tracing::info!(path = %markdown_path.display(), "Wrote Markdown");

    let filter_dates = pipeline.merger().active_dates(records);
    let feed = render::marker_feed(records, filter_dates, config.overlay_category.as_deref());
    let feed_path = config.output_dir.join(files::MARKER_FEED);
    let mut text = serde_json::to_string_pretty(&feed).context("Failed to encode map feed")?;
    text.push('\n');
    write_text(&feed_path, &text)?;
    tracing::info!(path = %feed_path.display(), "Wrote map feed");

    Ok(())
}

/// Initialize logging: JSON when `LOG_FORMAT=json`, human-readable otherwise.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
