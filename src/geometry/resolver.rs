//! Placement of POIs on their links.

use geo::{Euclidean, InterpolatableLine, Length};
use geo_types::{Coord, LineString, Point};
use thiserror::Error;

use crate::models::{normalize_percent, DirTravel, Link, LinkId, Poi, TileBundle};

/// Why a position could not be resolved (`GeometryUnavailable`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("link {0} not found in tile")]
    LinkNotFound(LinkId),
    #[error("link {link_id} has {count} coordinate(s), at least 2 are required")]
    TooFewCoordinates { link_id: LinkId, count: usize },
}

/// A point on a link plus the link's canonical endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPosition {
    pub point: Point<f64>,
    pub reference: Coord<f64>,
    pub non_reference: Coord<f64>,
}

/// Resolves POI positions against the links of one tile.
pub struct GeometryResolver<'a> {
    bundle: &'a TileBundle,
}

impl<'a> GeometryResolver<'a> {
    pub fn new(bundle: &'a TileBundle) -> Self {
        Self { bundle }
    }

    /// Resolve a POI from its link id and PERCFRREF.
    pub fn resolve_poi(&self, poi: &Poi) -> Result<ResolvedPosition, GeometryError> {
        let link = self
            .bundle
            .link(poi.link_id)
            .ok_or(GeometryError::LinkNotFound(poi.link_id))?;
        position_at(link, poi.fraction_along())
    }

}

/// Resolve a percent (0..=100) along a link. Non-finite percents mean 50.
pub fn resolve_on_link(link: &Link, percent: f64) -> Result<ResolvedPosition, GeometryError> {
    position_at(link, normalize_percent(Some(percent)))
}

fn position_at(link: &Link, fraction: f64) -> Result<ResolvedPosition, GeometryError> {
    let count = link.geometry.0.len();
    let (reference, non_reference) =
        link.reference_nodes()
            .ok_or(GeometryError::TooFewCoordinates {
                link_id: link.link_id,
                count,
            })?;

    let oriented = match link.dir_travel {
        DirTravel::AgainstReference => {
            LineString::new(link.geometry.0.iter().rev().copied().collect())
        }
        DirTravel::Both | DirTravel::Forward => link.geometry.clone(),
    };

    let point = interpolate(&oriented, fraction).ok_or(GeometryError::TooFewCoordinates {
        link_id: link.link_id,
        count,
    })?;

    Ok(ResolvedPosition {
        point,
        reference,
        non_reference,
    })
}

/// Point at `fraction` of the total arc length of a polyline.
pub fn interpolate(line: &LineString<f64>, fraction: f64) -> Option<Point<f64>> {
    let first = *line.0.first()?;
    // Zero-length lines would divide by zero inside geo
    if line_length(line) <= 0.0 {
        return Some(Point::from(first));
    }
    line.point_at_ratio_from_start(&Euclidean, fraction.clamp(0.0, 1.0))
        .or_else(|| line.0.last().map(|c| Point::from(*c)))
}

/// Euclidean length of a polyline in its own coordinate units.
pub fn line_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}
