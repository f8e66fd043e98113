//! Distance and direction comparisons between link geometries.

use geo::{Distance, Euclidean};
use geo_types::{Coord, LineString};

/// Endpoint-to-endpoint direction vector of a polyline.
pub fn direction_vector(line: &LineString<f64>) -> Option<Coord<f64>> {
    let first = line.0.first()?;
    let last = line.0.last()?;
    let v = Coord {
        x: last.x - first.x,
        y: last.y - first.y,
    };
    (v.x != 0.0 || v.y != 0.0).then_some(v)
}

/// Unsigned angle in degrees between the direction vectors of two lines,
/// collapsed to `[0, 90]` through `|cos|`: opposite vectors count as parallel.
pub fn unsigned_angle_deg(a: &LineString<f64>, b: &LineString<f64>) -> Option<f64> {
    let va = direction_vector(a)?;
    let vb = direction_vector(b)?;
    let cos = (va.x * vb.x + va.y * vb.y) / (va.x.hypot(va.y) * vb.x.hypot(vb.y));
    Some(cos.abs().clamp(0.0, 1.0).acos().to_degrees())
}

/// Start-to-end bearing of a line in radians.
pub fn bearing(line: &LineString<f64>) -> Option<f64> {
    let v = direction_vector(line)?;
    Some(v.y.atan2(v.x))
}

/// Difference between the bearings of two lines in degrees, collapsed to
/// `[0, 90]`.
pub fn bearing_difference_deg(a: &LineString<f64>, b: &LineString<f64>) -> Option<f64> {
    let diff = (bearing(a)? - bearing(b)?).to_degrees().abs() % 180.0;
    Some(diff.min(180.0 - diff))
}

/// Minimum distance between two lines in their coordinate units.
pub fn line_distance(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    Euclidean.distance(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coords: Vec<(f64, f64)>) -> LineString<f64> {
        LineString::from(coords)
    }

    #[test]
    fn test_opposite_lines_are_parallel() {
        let east = line(vec![(0.0, 0.0), (10.0, 0.0)]);
        let west = line(vec![(10.0, 1.0), (0.0, 1.0)]);
        assert!(unsigned_angle_deg(&east, &west).unwrap() < 1e-9);
        assert!(bearing_difference_deg(&east, &west).unwrap() < 1e-9);
    }

    #[test]
    fn test_perpendicular_lines() {
        let east = line(vec![(0.0, 0.0), (10.0, 0.0)]);
        let north = line(vec![(0.0, 0.0), (0.0, 10.0)]);
        assert!((unsigned_angle_deg(&east, &north).unwrap() - 90.0).abs() < 1e-9);
        assert!((bearing_difference_deg(&east, &north).unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_difference_collapses() {
        let a = line(vec![(0.0, 0.0), (1.0, 0.0)]);
        // 150 degrees apart is 30 degrees off parallel
        let angle = 150.0_f64.to_radians();
        let b = line(vec![(0.0, 0.0), (angle.cos(), angle.sin())]);
        assert!((bearing_difference_deg(&a, &b).unwrap() - 30.0).abs() < 1e-9);
        assert!((unsigned_angle_deg(&a, &b).unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_closed_loop_has_no_direction() {
        let loop_line = line(vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let east = line(vec![(0.0, 0.0), (1.0, 0.0)]);
        assert!(direction_vector(&loop_line).is_none());
        assert!(unsigned_angle_deg(&loop_line, &east).is_none());
        assert!(bearing_difference_deg(&east, &loop_line).is_none());
    }

    #[test]
    fn test_line_distance() {
        let a = line(vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = line(vec![(2.0, 3.0), (8.0, 4.0)]);
        assert!((line_distance(&a, &b) - 3.0).abs() < 1e-12);
    }
}
