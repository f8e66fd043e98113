//! Local metric projection for distance checks.

use geo::MapCoords;
use geo_types::{Coord, LineString};

use crate::config::METERS_PER_DEGREE;
use crate::models::TileBundle;

pub fn degrees_to_meters(degrees: f64) -> f64 {
    degrees * METERS_PER_DEGREE
}

pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Equirectangular projection around a tile-local origin.
///
/// Output coordinates are meters east/north of the origin. Longitudes are
/// scaled by the cosine of the origin latitude, so distances stay metric
/// whatever latitude the tile sits at.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin: Coord<f64>,
    meters_per_deg_lon: f64,
}

impl LocalProjection {
    pub fn new(origin: Coord<f64>) -> Self {
        Self {
            origin,
            meters_per_deg_lon: METERS_PER_DEGREE * origin.y.to_radians().cos(),
        }
    }

    /// Centered on the tile boundary, or on the first link when the tile has
    /// no usable boundary.
    pub fn for_bundle(bundle: &TileBundle) -> Self {
        let origin = bundle
            .tile
            .center()
            .or_else(|| {
                bundle
                    .links
                    .iter()
                    .find_map(|link| link.geometry.0.first().copied())
            })
            .unwrap_or(Coord { x: 0.0, y: 0.0 });
        Self::new(origin)
    }

    pub fn project_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (coord.x - self.origin.x) * self.meters_per_deg_lon,
            y: (coord.y - self.origin.y) * METERS_PER_DEGREE,
        }
    }

    pub fn project(&self, line: &LineString<f64>) -> LineString<f64> {
        line.map_coords(|coord| self.project_coord(coord))
    }
}
