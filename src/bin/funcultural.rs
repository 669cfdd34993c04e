use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use funcultural::crawl::Crawler;
use funcultural::fetch::{HtmlCache, HttpFetcher};
use funcultural::render::render_page;
use funcultural::settings::Settings;
use funcultural::storage::{read_collection_if_exists, write_collection, write_index, write_text, RunLock};
use funcultural::{Archiver, CrawlSession, Event};

#[derive(Parser)]
#[command(name = "funcultural", about = "Funcultural event scraper and archiver")]
struct Cli {
    /// Settings file (default: ./funcultural.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Verbose logging (same as DEBUG=1)
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the listing and rewrite the current collection and index
    Update,
    /// Move events of past years from the current collection to the archive
    Archive,
    /// Generate the HTML page from the current collection
    Render,
    /// Update, archive and render in one run
    All,
}

fn init_tracing(debug: bool) {
    let debug = debug || std::env::var("DEBUG").is_ok_and(|v| v == "1");
    let default = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn lock(settings: &Settings) -> anyhow::Result<RunLock> {
    let out = &settings.output;
    Ok(RunLock::acquire_with_max_age(&out.lock_file, out.lock_max_age())?)
}

fn archiver(settings: &Settings) -> Archiver {
    Archiver::new(&settings.output.current_file, &settings.output.archive_dir)
}

fn update(settings: &Settings) -> anyhow::Result<Vec<Event>> {
    let crawl = &settings.crawl;
    let cache = crawl
        .cache_dir
        .as_ref()
        .map(|dir| HtmlCache::new(dir, crawl.cache_ttl()));
    let fetcher = HttpFetcher::new(crawl.request_timeout(), &crawl.user_agent, cache)?;
    let crawler = Crawler::new(&fetcher, crawl, &settings.classifier)?;

    let mut session = CrawlSession::new();
    let events = crawler.crawl(&mut session);
    tracing::info!(visited = session.seen_count(), events = events.len(), "update finished");

    let out = &settings.output;
    write_collection(&out.current_file, &events).context("writing current collection")?;
    write_index(&out.index_file, &events).context("writing index")?;
    Ok(events)
}

fn render(settings: &Settings, events: &[Event]) -> anyhow::Result<()> {
    let out = &settings.output;
    let template = match &out.html_template {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading template {}", path.display()))?,
        ),
        None => None,
    };
    let page = render_page(template.as_deref(), events);
    write_text(&out.html_output, &page).context("writing HTML page")?;
    tracing::info!(path = %out.html_output.display(), events = events.len(), "page rendered");
    Ok(())
}

/// Current collection as stored, skipping records that do not parse.
fn load_current(settings: &Settings) -> anyhow::Result<Vec<Event>> {
    let path = &settings.output.current_file;
    let records = read_collection_if_exists(path)
        .with_context(|| format!("reading {}", path.display()))?
        .unwrap_or_default();
    Ok(records
        .into_iter()
        .filter_map(|r| match serde_json::from_value(r) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let t0 = Instant::now();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Update => {
            let _lock = lock(&settings)?;
            update(&settings)?;
        }
        Commands::Archive => {
            let _lock = lock(&settings)?;
            archiver(&settings)
                .archive_store(today())
                .context("archiving current collection")?;
        }
        Commands::Render => {
            let events = load_current(&settings)?;
            render(&settings, &events)?;
        }
        Commands::All => {
            let _lock = lock(&settings)?;
            let events = update(&settings)?;
            let partition = archiver(&settings)
                .archive_events(events, today())
                .context("archiving collection")?;
            render(&settings, &partition.current)?;
        }
    }

    tracing::info!(elapsed_secs = t0.elapsed().as_secs_f64(), "done");
    Ok(())
}
