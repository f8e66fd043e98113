//! Per-tile collection of findings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Finding, FindingKind, Side, TileId};

/// Output category of a finding; also the export directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Side,
    Address,
    MultidigitFlagged,
    MultidigitUnflagged,
    Boundary,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Side,
            Category::Address,
            Category::MultidigitFlagged,
            Category::MultidigitUnflagged,
            Category::Boundary,
        ]
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Side => "side",
            Category::Address => "address",
            Category::MultidigitFlagged => "multidigit_flagged",
            Category::MultidigitUnflagged => "multidigit_unflagged",
            Category::Boundary => "boundary",
        }
    }
}

/// All findings of one tile, grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileReport {
    pub tile_id: TileId,
    pub poi_count: usize,
    pub link_count: usize,
    /// POIs declared on each side, after de-duplication by id
    pub declared_left: usize,
    pub declared_right: usize,
    pub side: Vec<Finding>,
    pub address: Vec<Finding>,
    pub multidigit_flagged: Vec<Finding>,
    pub multidigit_unflagged: Vec<Finding>,
    pub boundary: Vec<Finding>,
}

/// Wrong-side counts split by the declared side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideMisassignments {
    /// Declared R, probe on L
    pub right_expected_left_actual: usize,
    /// Declared L, probe on R
    pub left_expected_right_actual: usize,
    pub total_right: usize,
    pub total_left: usize,
}

impl SideMisassignments {
    /// Share of right-declared POIs found on the left, in percent.
    pub fn right_ratio(&self) -> f64 {
        ratio(self.right_expected_left_actual, self.total_right)
    }

    /// Share of left-declared POIs found on the right, in percent.
    pub fn left_ratio(&self) -> f64 {
        ratio(self.left_expected_right_actual, self.total_left)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Counts for one tile, as written to the run summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileSummary {
    pub tile_id: TileId,
    pub pois: usize,
    pub links: usize,
    pub counts: BTreeMap<FindingKind, usize>,
    pub side_misassignments: SideMisassignments,
}

impl TileSummary {
    /// Findings that report a problem, `OK` address outcomes excluded.
    pub fn error_count(&self) -> usize {
        self.counts
            .iter()
            .filter(|(kind, _)| kind.is_error())
            .map(|(_, count)| count)
            .sum()
    }
}

impl TileReport {
    pub fn new(tile_id: TileId) -> Self {
        Self {
            tile_id,
            ..Default::default()
        }
    }

    pub fn findings(&self, category: Category) -> &[Finding] {
        match category {
            Category::Side => &self.side,
            Category::Address => &self.address,
            Category::MultidigitFlagged => &self.multidigit_flagged,
            Category::MultidigitUnflagged => &self.multidigit_unflagged,
            Category::Boundary => &self.boundary,
        }
    }

    /// Iterate over every finding of the tile, category by category.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        Category::all()
            .iter()
            .flat_map(move |category| self.findings(*category).iter())
    }

    pub fn summary(&self) -> TileSummary {
        let mut counts = BTreeMap::new();
        for finding in self.iter() {
            *counts.entry(finding.error_type).or_insert(0) += 1;
        }

        let mut side_misassignments = SideMisassignments {
            total_right: self.declared_right,
            total_left: self.declared_left,
            ..Default::default()
        };
        for finding in &self.side {
            if finding.error_type != FindingKind::WrongSideOfStreet {
                continue;
            }
            match (finding.evidence.expected_side, finding.evidence.actual_side) {
                (Some(Side::Right), Some(Side::Left)) => {
                    side_misassignments.right_expected_left_actual += 1
                }
                (Some(Side::Left), Some(Side::Right)) => {
                    side_misassignments.left_expected_right_actual += 1
                }
                _ => {}
            }
        }

        TileSummary {
            tile_id: self.tile_id,
            pois: self.poi_count,
            links: self.link_count,
            counts,
            side_misassignments,
        }
    }

    /// Log the side error pattern of the tile.
    pub fn log_side_patterns(&self) {
        let summary = self.summary();
        let sides = summary.side_misassignments;
        info!(
            "Tile {}: {} wrong-side POIs (R expected, L actual: {}/{} = {:.2}%; L expected, R actual: {}/{} = {:.2}%)",
            self.tile_id,
            sides.right_expected_left_actual + sides.left_expected_right_actual,
            sides.right_expected_left_actual,
            sides.total_right,
            sides.right_ratio(),
            sides.left_expected_right_actual,
            sides.total_left,
            sides.left_ratio(),
        );
    }
}
