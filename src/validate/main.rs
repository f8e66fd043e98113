//! Tile validation pipeline.
//!
//! Discovers tiles in a data directory, validates POIs and links of each tile
//! in parallel, and writes the findings as JSON.

mod export;
mod loader;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use navcheck::checks::{TileSummary, Validator};
use navcheck::config::ValidationConfig;
use navcheck::models::TileId;

use crate::export::{write_report, write_summary, RunSummary};
use crate::loader::{discover_tiles, load_bundle, TileSource};

#[derive(Parser, Debug)]
#[command(name = "validate")]
#[command(about = "Validate POIs and road links of map tiles")]
struct Args {
    /// Data directory containing tiles/ and POIs/
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Directory for the JSON findings
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// TOML file overriding the default thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only validate these tiles (repeatable)
    #[arg(long = "tile")]
    tiles: Vec<TileId>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "info" })
    });
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Navcheck tile validation");
    info!("Data: {}", args.data_dir.display());

    let config = match &args.config {
        Some(path) => ValidationConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ValidationConfig::default(),
    };
    let validator = Validator::new(config);

    let sources = discover_tiles(&args.data_dir, &args.tiles)?;
    if sources.is_empty() {
        warn!("No tiles to validate");
        return Ok(());
    }

    let started_at = Utc::now();

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let failed = AtomicUsize::new(0);
    let mut summaries: Vec<TileSummary> = sources
        .par_iter()
        .filter_map(|source| {
            let result = process_tile(&validator, source, &args.output_dir);
            pb.inc(1);
            match result {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("Skipping tile {}: {:#}", source.tile_id, e);
                    failed.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        })
        .collect();
    pb.finish_with_message("Validation complete");

    summaries.sort_by_key(|s| s.tile_id);
    let summary = RunSummary::new(started_at, &summaries, failed.load(Ordering::Relaxed));
    let path = write_summary(&args.output_dir, &summary)?;

    for (kind, count) in &summary.totals {
        info!("  {}: {}", kind, count);
    }
    info!(
        "Validated {} tiles ({} failed) in {}s, summary written to {}",
        summary.tiles_processed,
        summary.tiles_failed,
        (summary.finished_at - started_at).num_seconds(),
        path.display()
    );

    Ok(())
}

fn process_tile(
    validator: &Validator,
    source: &TileSource,
    output_dir: &Path,
) -> Result<TileSummary> {
    let bundle = load_bundle(source)?;
    let report = validator.validate(&bundle);
    write_report(output_dir, &report)
        .with_context(|| format!("Failed to write findings of tile {}", source.tile_id))?;
    Ok(report.summary())
}
