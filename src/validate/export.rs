//! JSON export of tile reports and the run summary.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use navcheck::checks::{Category, TileReport, TileSummary};
use navcheck::models::FindingKind;

/// Write one `errors_<tile>.json` per non-empty category.
///
/// Returns the paths written.
pub fn write_report(output_dir: &Path, report: &TileReport) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for category in Category::all() {
        let findings = report.findings(*category);
        if findings.is_empty() {
            continue;
        }

        let dir = output_dir.join(category.dir_name());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let path = dir.join(format!("errors_{}.json", report.tile_id));
        write_json(&path, findings)?;
        debug!("Wrote {} findings to {}", findings.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Run-wide summary written next to the category directories.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tiles_processed: usize,
    pub tiles_failed: usize,
    pub totals: BTreeMap<FindingKind, usize>,
    pub tiles: &'a [TileSummary],
}

impl<'a> RunSummary<'a> {
    pub fn new(started_at: DateTime<Utc>, tiles: &'a [TileSummary], tiles_failed: usize) -> Self {
        let mut totals = BTreeMap::new();
        for tile in tiles {
            for (kind, count) in &tile.counts {
                *totals.entry(*kind).or_insert(0) += count;
            }
        }
        Self {
            started_at,
            finished_at: Utc::now(),
            tiles_processed: tiles.len(),
            tiles_failed,
            totals,
            tiles,
        }
    }
}

pub fn write_summary(output_dir: &Path, summary: &RunSummary<'_>) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let path = output_dir.join("summary.json");
    write_json(&path, summary)?;
    Ok(path)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use navcheck::models::{Finding, Subject};
    use tempfile::TempDir;

    fn report() -> TileReport {
        let mut report = TileReport::new(42);
        report.address = vec![Finding::new(
            42,
            Subject::Poi {
                poi_id: 1,
                link_id: 2,
            },
            FindingKind::OutOfRange,
            "House number 5 is not valid for side R",
            "5 outside 10-20",
        )];
        report.multidigit_flagged = vec![Finding::new(
            42,
            Subject::Link { link_id: 2 },
            FindingKind::IncorrectMultidigitAttribution,
            "no partner",
            "Update MULTIDIGIT to 'N'",
        )];
        report
    }

    #[test]
    fn test_write_report_per_category() {
        let dir = TempDir::new().unwrap();
        let written = write_report(dir.path(), &report()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("address/errors_42.json").is_file());
        assert!(dir.path().join("multidigit_flagged/errors_42.json").is_file());
        assert!(!dir.path().join("side").exists());

        let content = fs::read_to_string(dir.path().join("address/errors_42.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["error_type"], "OUT_OF_RANGE");
        assert_eq!(value[0]["poi_id"], 1);
    }

    #[test]
    fn test_write_summary() {
        let dir = TempDir::new().unwrap();
        let summaries = vec![report().summary(), report().summary()];
        let summary = RunSummary::new(Utc::now(), &summaries, 1);
        let path = write_summary(&dir.path().join("out"), &summary).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["tiles_processed"], 2);
        assert_eq!(value["tiles_failed"], 1);
        assert_eq!(value["totals"]["OUT_OF_RANGE"], 2);
        assert_eq!(value["tiles"][0]["tile_id"], 42);
    }
}
