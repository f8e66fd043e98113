//! Side-of-street and tile containment checks.

use hashbrown::HashSet;
use tracing::debug;

use super::ResolvedPoi;
use crate::config::SideConfig;
use crate::geometry::{GeometryError, SideClassifier};
use crate::models::{Finding, FindingKind, Subject, TileBundle};

/// Compare each POI's declared side with the side its displaced probe falls on.
///
/// Every POI id is checked once; POIs resolved outside the tile are left to
/// [`check_boundary`].
pub fn check_sides(
    bundle: &TileBundle,
    resolved: &[ResolvedPoi<'_>],
    config: &SideConfig,
) -> Vec<Finding> {
    let tile_id = bundle.tile_id();
    let classifier = SideClassifier::new(config.displacement_m);
    let mut seen = HashSet::with_capacity(resolved.len());
    let mut findings = Vec::new();

    for entry in resolved {
        let poi = entry.poi;
        if !seen.insert(poi.poi_id) {
            continue;
        }
        let subject = Subject::Poi {
            poi_id: poi.poi_id,
            link_id: poi.link_id,
        };

        let position = match &entry.position {
            Ok(position) => position,
            Err(err @ GeometryError::LinkNotFound(_)) => {
                findings.push(Finding::new(
                    tile_id,
                    subject,
                    FindingKind::InvalidLinkReference,
                    format!("LINK_ID not found in street geometry ({})", err),
                    "Check if link ID is missing from base NAV data",
                ));
                continue;
            }
            Err(err) => {
                findings.push(Finding::new(
                    tile_id,
                    subject,
                    FindingKind::GeometryProcessingError,
                    err.to_string(),
                    "Check geometry or input values",
                ));
                continue;
            }
        };

        if !bundle.tile.contains(&position.point) {
            continue;
        }

        let Some(reading) = classifier.read(position, poi.side) else {
            findings.push(Finding::new(
                tile_id,
                subject,
                FindingKind::GeometryProcessingError,
                format!(
                    "Reference and non-reference nodes of link {} coincide",
                    poi.link_id
                ),
                "Check geometry or input values",
            ));
            continue;
        };

        if reading.actual != poi.side {
            debug!(
                "POI {} on link {}: expected {}, probe at ({}, {}) is {}",
                poi.poi_id,
                poi.link_id,
                poi.side,
                reading.probe.x(),
                reading.probe.y(),
                reading.actual
            );
            findings.push(
                Finding::new(
                    tile_id,
                    subject,
                    FindingKind::WrongSideOfStreet,
                    format!(
                        "POI expected on {} side, but is located on {}",
                        poi.side, reading.actual
                    ),
                    format!("Update POI_ST_SD to '{}'", reading.actual),
                )
                .with_sides(poi.side, reading.actual)
                .with_point(position.point),
            );
        }
    }

    findings
}

/// Report POIs whose resolved position falls outside the tile boundary.
pub fn check_boundary(bundle: &TileBundle, resolved: &[ResolvedPoi<'_>]) -> Vec<Finding> {
    if !bundle.tile.is_bounded() {
        return Vec::new();
    }

    resolved
        .iter()
        .filter_map(|entry| {
            let position = entry.position.as_ref().ok()?;
            if bundle.tile.contains(&position.point) {
                return None;
            }
            Some(
                Finding::new(
                    bundle.tile_id(),
                    Subject::Poi {
                        poi_id: entry.poi.poi_id,
                        link_id: entry.poi.link_id,
                    },
                    FindingKind::PoiOutsideTile,
                    format!("POI resolves outside tile {}", bundle.tile_id()),
                    "Check PERCFRREF or the tile assignment of the POI",
                )
                .with_point(position.point),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::resolve_pois;
    use crate::models::{DirTravel, Link, Poi, Side, Tile};

    fn tile() -> Tile {
        Tile::new(
            7,
            vec![(-1.0, -1.0), (1.0, -1.0), (1.0, 2.0), (-1.0, 2.0), (-1.0, -1.0)],
        )
    }

    fn bundle(pois: Vec<Poi>) -> TileBundle {
        let links = vec![
            Link::new(10, vec![(0.0, 0.0), (0.0, 1.0)], DirTravel::Both),
            Link::new(11, vec![(0.0, 1.0), (0.0, 0.0)], DirTravel::AgainstReference),
            Link::new(12, vec![(0.5, 0.5), (0.5, 0.5)], DirTravel::Both),
            Link::new(13, vec![(0.0, 0.0), (5.0, 0.0)], DirTravel::Both),
        ];
        TileBundle::new(tile(), links, pois, vec![])
    }

    fn run(pois: Vec<Poi>) -> Vec<Finding> {
        let bundle = bundle(pois);
        let resolved = resolve_pois(&bundle);
        check_sides(&bundle, &resolved, &SideConfig::default())
    }

    #[test]
    fn test_right_side_midpoint_has_no_finding() {
        assert!(run(vec![Poi::new(1, 10, 50.0, Side::Right)]).is_empty());
        assert!(run(vec![Poi::new(1, 10, 50.0, Side::Left)]).is_empty());
    }

    #[test]
    fn test_endpoints_are_not_ambiguous() {
        for percent in [0.0, 100.0] {
            for side in [Side::Left, Side::Right] {
                assert!(run(vec![Poi::new(1, 10, percent, side)]).is_empty());
                assert!(run(vec![Poi::new(1, 11, percent, side)]).is_empty());
            }
        }
    }

    #[test]
    fn test_curved_link_wrong_side() {
        // Bulges ~111 m east of the chord between its endpoints
        let curved = Link::new(
            20,
            vec![(0.0, 0.0), (0.001, 0.0005), (0.0, 0.001)],
            DirTravel::Both,
        );
        let bundle = TileBundle::new(
            tile(),
            vec![curved],
            vec![
                Poi::new(1, 20, 50.0, Side::Left),
                Poi::new(2, 20, 50.0, Side::Right),
            ],
            vec![],
        );
        let resolved = resolve_pois(&bundle);
        let findings = check_sides(&bundle, &resolved, &SideConfig::default());

        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.error_type, FindingKind::WrongSideOfStreet);
        assert_eq!(finding.subject, Subject::Poi { poi_id: 1, link_id: 20 });
        assert_eq!(finding.evidence.expected_side, Some(Side::Left));
        assert_eq!(finding.evidence.actual_side, Some(Side::Right));
        assert_eq!(finding.suggestion, "Update POI_ST_SD to 'R'");
    }

    #[test]
    fn test_unknown_link() {
        let findings = run(vec![Poi::new(1, 99, 50.0, Side::Left)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].error_type, FindingKind::InvalidLinkReference);
    }

    #[test]
    fn test_directionless_link() {
        let findings = run(vec![Poi::new(1, 12, 50.0, Side::Left)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].error_type, FindingKind::GeometryProcessingError);
    }

    #[test]
    fn test_duplicate_pois_checked_once() {
        let findings = run(vec![
            Poi::new(1, 99, 50.0, Side::Left),
            Poi::new(1, 99, 50.0, Side::Left),
        ]);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_outside_tile_skipped_and_reported() {
        let bundle = bundle(vec![
            Poi::new(1, 13, 100.0, Side::Left),
            Poi::new(2, 13, 10.0, Side::Left),
            Poi::new(3, 99, 10.0, Side::Left),
        ]);
        let resolved = resolve_pois(&bundle);
        let sides = check_sides(&bundle, &resolved, &SideConfig::default());
        // Only the unknown link is reported by the side check
        assert_eq!(sides.len(), 1);

        let outside = check_boundary(&bundle, &resolved);
        assert_eq!(outside.len(), 1);
        assert_eq!(outside[0].error_type, FindingKind::PoiOutsideTile);
        assert_eq!(outside[0].evidence.geometry, Some(vec![[5.0, 0.0]]));
    }
}
