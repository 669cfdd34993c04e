//! Segment a directory of saved article pages and emit JSONL.
//!
//! Usage:
//!   segment <html-dir> [--config funcultural.toml]
//!
//! Output (stdout): one JSON object per file: {"file": "...", "blocks": [...]}
//! or {"file": "...", "error": "..."}
//! Summary (stderr): "Done: N ok, M errors"
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use scraper::Selector;
use serde_json::json;
use url::Url;

use funcultural::segment_html;
use funcultural::settings::Settings;

#[derive(Parser)]
#[command(name = "segment", about = "Segment saved article HTML files into content blocks")]
struct Args {
    /// Directory of *.html files
    html_dir: PathBuf,
    /// Settings file for selectors, site base and classifier tuning
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let crawl = &settings.crawl;
    let selector = Selector::parse(&crawl.selectors.article)
        .map_err(|e| anyhow::anyhow!("invalid article selector {:?}: {e}", crawl.selectors.article))?;
    let base = Url::parse(&crawl.site_base).with_context(|| format!("invalid site base {}", crawl.site_base))?;

    let mut entries: Vec<_> = fs::read_dir(&args.html_dir)
        .with_context(|| format!("cannot read {}", args.html_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|x| x == "html"))
        .collect();
    entries.sort();

    let mut ok = 0usize;
    let mut errors = 0usize;

    for path in &entries {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let line = match fs::read(path) {
            Err(e) => Err(e.to_string()),
            Ok(raw) => {
                let html = String::from_utf8(raw)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
                segment_html(&html, &selector, &base, &settings.classifier)
                    .ok_or_else(|| format!("no element matches {}", crawl.selectors.article))
            }
        };

        match line {
            Ok(blocks) => {
                println!("{}", json!({ "file": file, "blocks": blocks }));
                ok += 1;
            }
            Err(error) => {
                println!("{}", json!({ "file": file, "error": error }));
                errors += 1;
            }
        }
    }

    eprintln!("Done: {ok} ok, {errors} errors");
    Ok(())
}
