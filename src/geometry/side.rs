//! Side-of-street classification.
//!
//! Sides are taken looking from the reference node towards the non-reference
//! node. A point whose cross product is exactly zero (on the line) is `Right`.

use geo_types::{Coord, Point};

use super::ResolvedPosition;
use crate::config::METERS_PER_DEGREE;
use crate::models::Side;

/// Signed cross product of (non_reference - reference) x (point - reference).
pub fn cross(reference: Coord<f64>, non_reference: Coord<f64>, point: Point<f64>) -> f64 {
    let (ax, ay) = (non_reference.x - reference.x, non_reference.y - reference.y);
    let (bx, by) = (point.x() - reference.x, point.y() - reference.y);
    ax * by - ay * bx
}

pub fn classify_side(reference: Coord<f64>, non_reference: Coord<f64>, point: Point<f64>) -> Side {
    if cross(reference, non_reference, point) > 0.0 {
        Side::Left
    } else {
        Side::Right
    }
}

/// Push `point` perpendicular to the link by `distance` (in coordinate
/// units) towards `side`.
///
/// Returns `None` when the reference and non-reference nodes coincide and
/// the link has no direction to be perpendicular to.
pub fn displace_toward(
    point: Point<f64>,
    reference: Coord<f64>,
    non_reference: Coord<f64>,
    side: Side,
    distance: f64,
) -> Option<Point<f64>> {
    let dx = non_reference.x - reference.x;
    let dy = non_reference.y - reference.y;
    let length = dx.hypot(dy);
    if length == 0.0 || !length.is_finite() {
        return None;
    }

    // Unit normal pointing to the left of reference -> non-reference
    let (ux, uy) = (-dy / length, dx / length);
    let factor = match side {
        Side::Left => 1.0,
        Side::Right => -1.0,
    };
    Some(Point::new(
        point.x() + factor * ux * distance,
        point.y() + factor * uy * distance,
    ))
}

/// Outcome of classifying a displaced probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideReading {
    pub probe: Point<f64>,
    pub actual: Side,
}

/// Classifies POI positions using a probe displaced towards the declared side.
#[derive(Debug, Clone, Copy)]
pub struct SideClassifier {
    displacement_deg: f64,
}

impl SideClassifier {
    pub fn new(displacement_m: f64) -> Self {
        Self {
            displacement_deg: displacement_m / METERS_PER_DEGREE,
        }
    }

    /// Side the displaced probe falls on, or `None` for a directionless link.
    pub fn read(&self, position: &ResolvedPosition, declared: Side) -> Option<SideReading> {
        let probe = displace_toward(
            position.point,
            position.reference,
            position.non_reference,
            declared,
            self.displacement_deg,
        )?;
        Some(SideReading {
            probe,
            actual: classify_side(position.reference, position.non_reference, probe),
        })
    }
}
