//! Tile validation checks.
//!
//! Each check reads a shared [`TileBundle`] and returns its own findings; the
//! [`Validator`] runs them all and collects the results in a [`TileReport`].

mod address;
mod pairing;
mod parallel;
mod report;
mod side;
mod validator;

pub use address::{check_addresses, validate_address, AddressInput, AddressVerdict};
pub use pairing::{check_flagged_links, Partner};
pub use parallel::{check_unflagged_links, evaluate_pair, segment_score, ParallelPair};
pub use report::{Category, SideMisassignments, TileReport, TileSummary};
pub use side::{check_boundary, check_sides};
pub use validator::Validator;

use crate::geometry::{GeometryError, GeometryResolver, ResolvedPosition};
use crate::models::{Poi, TileBundle};

/// A POI together with its position on the referenced link.
#[derive(Debug)]
pub struct ResolvedPoi<'a> {
    pub poi: &'a Poi,
    pub position: Result<ResolvedPosition, GeometryError>,
}

/// Resolve every POI of the tile once, in input order.
pub fn resolve_pois(bundle: &TileBundle) -> Vec<ResolvedPoi<'_>> {
    let resolver = GeometryResolver::new(bundle);
    bundle
        .pois
        .iter()
        .map(|poi| ResolvedPoi {
            poi,
            position: resolver.resolve_poi(poi),
        })
        .collect()
}
