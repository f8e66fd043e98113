//! Validation service running every check over a tile.

use hashbrown::HashSet;
use tracing::{debug, info};

use super::{
    check_addresses, check_boundary, check_flagged_links, check_sides, check_unflagged_links,
    resolve_pois, TileReport,
};
use crate::config::ValidationConfig;
use crate::models::{Side, TileBundle};

/// Runs the side, address, boundary and multidigit checks for tiles.
///
/// Holds no per-tile state, so one validator can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate one tile bundle.
    pub fn validate(&self, bundle: &TileBundle) -> TileReport {
        let mut report = TileReport::new(bundle.tile_id());
        report.poi_count = bundle.pois.len();
        report.link_count = bundle.links.len();

        let mut seen = HashSet::with_capacity(bundle.pois.len());
        for poi in &bundle.pois {
            if seen.insert(poi.poi_id) {
                match poi.side {
                    Side::Left => report.declared_left += 1,
                    Side::Right => report.declared_right += 1,
                }
            }
        }

        // Positions are computed once and shared by the POI checks
        let resolved = resolve_pois(bundle);
        report.side = check_sides(bundle, &resolved, &self.config.side);
        report.address = check_addresses(bundle, &resolved);
        report.boundary = check_boundary(bundle, &resolved);

        report.multidigit_flagged = check_flagged_links(bundle, &self.config.pairing);
        report.multidigit_unflagged = check_unflagged_links(bundle, &self.config.parallel);

        debug!(
            "Tile {}: side {}, address {}, flagged {}, unflagged {}, boundary {}",
            report.tile_id,
            report.side.len(),
            report.address.len(),
            report.multidigit_flagged.len(),
            report.multidigit_unflagged.len(),
            report.boundary.len()
        );
        info!(
            "Validated tile {} ({} POIs, {} links): {} findings",
            report.tile_id,
            report.poi_count,
            report.link_count,
            report.summary().error_count()
        );
        report.log_side_patterns();

        report
    }
}
