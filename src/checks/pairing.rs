//! Partner search for links flagged as multiply digitized.
//!
//! A MULTIDIGIT link is one carriageway of a divided road, so somewhere close
//! by there must be a same-named, roughly parallel link carrying the opposite
//! direction of travel.

use geo_types::LineString;
use tracing::debug;

use crate::config::PairingConfig;
use crate::geometry::{line_distance, unsigned_angle_deg, LinkSpatialIndex, LocalProjection};
use crate::models::{DirTravel, Finding, FindingKind, Link, Subject, TileBundle};

/// Closest qualifying partner of a flagged link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partner {
    pub link_id: i64,
    pub distance_m: f64,
    pub angle_deg: f64,
}

/// Links of a tile projected to local meters, with an R-tree over them.
struct ProjectedLinks {
    lines: Vec<LineString<f64>>,
    index: LinkSpatialIndex,
}

impl ProjectedLinks {
    fn build(bundle: &TileBundle) -> Self {
        let projection = LocalProjection::for_bundle(bundle);
        let lines: Vec<LineString<f64>> = bundle
            .links
            .iter()
            .map(|link| projection.project(&link.geometry))
            .collect();
        let index = LinkSpatialIndex::build(lines.iter().enumerate());
        Self { lines, index }
    }
}

/// Check every flagged link for a valid opposite-direction partner.
pub fn check_flagged_links(bundle: &TileBundle, config: &PairingConfig) -> Vec<Finding> {
    let projected = ProjectedLinks::build(bundle);

    let mut flagged: Vec<usize> = (0..bundle.links.len())
        .filter(|&pos| bundle.links[pos].multidigit)
        .collect();
    flagged.sort_by_key(|&pos| bundle.links[pos].link_id);

    let mut findings = Vec::new();
    for pos in flagged {
        let link = &bundle.links[pos];
        let Some(opposite) = link.dir_travel.opposite() else {
            findings.push(bidirectional_finding(bundle, link));
            continue;
        };

        let Some(name) = bundle.primary_name(link.link_id) else {
            findings.push(
                unpaired_finding(
                    bundle,
                    link,
                    "Segment marked as MULTIDIGIT=Y has no street name to pair on".to_string(),
                )
                .with_line(&link.geometry),
            );
            continue;
        };

        let search = find_partner(bundle, &projected, pos, name, opposite, config);
        match search.partner {
            Some(partner) => debug!(
                "Link {} paired with {} ({:.1} m, {:.1} deg)",
                link.link_id, partner.link_id, partner.distance_m, partner.angle_deg
            ),
            None => {
                debug!(
                    "Link {} ({}) has {} same-name opposite-direction candidates, none valid",
                    link.link_id, name, search.candidates
                );
                let description = format!(
                    "Segment marked as MULTIDIGIT=Y but no parallel segment with opposite direction and same name found within {}-{} m",
                    config.min_distance_m, config.max_distance_m
                );
                let mut finding = unpaired_finding(bundle, link, description)
                    .with_street_name(name)
                    .with_line(&link.geometry);
                if let Some(nearest) = search.nearest_m {
                    finding = finding.with_distance(nearest);
                }
                findings.push(finding);
            }
        }
    }

    findings
}

struct PartnerSearch {
    partner: Option<Partner>,
    /// Same-name opposite-direction links inside the search radius
    candidates: usize,
    /// Distance to the nearest of those, qualifying or not
    nearest_m: Option<f64>,
}

fn find_partner(
    bundle: &TileBundle,
    projected: &ProjectedLinks,
    pos: usize,
    name: &str,
    opposite: DirTravel,
    config: &PairingConfig,
) -> PartnerSearch {
    let link = &bundle.links[pos];
    let own_line = &projected.lines[pos];

    let mut search = PartnerSearch {
        partner: None,
        candidates: 0,
        nearest_m: None,
    };

    for other_pos in projected.index.candidates_near(own_line, config.max_distance_m) {
        let other = &bundle.links[other_pos];
        if other_pos == pos
            || other.link_id == link.link_id
            || other.dir_travel != opposite
            || !bundle.has_name(other.link_id, name)
        {
            continue;
        }
        search.candidates += 1;

        let other_line = &projected.lines[other_pos];
        let distance_m = line_distance(own_line, other_line);
        if search.nearest_m.map_or(true, |d| distance_m < d) {
            search.nearest_m = Some(distance_m);
        }
        if distance_m < config.min_distance_m || distance_m > config.max_distance_m {
            continue;
        }

        let Some(angle_deg) = unsigned_angle_deg(own_line, other_line) else {
            continue;
        };
        if angle_deg > config.max_angle_deg {
            continue;
        }

        if search.partner.map_or(true, |p| distance_m < p.distance_m) {
            search.partner = Some(Partner {
                link_id: other.link_id,
                distance_m,
                angle_deg,
            });
        }
    }

    search
}

fn unpaired_finding(bundle: &TileBundle, link: &Link, description: String) -> Finding {
    Finding::new(
        bundle.tile_id(),
        Subject::Link {
            link_id: link.link_id,
        },
        FindingKind::IncorrectMultidigitAttribution,
        description,
        "Update MULTIDIGIT to 'N'",
    )
}

fn bidirectional_finding(bundle: &TileBundle, link: &Link) -> Finding {
    Finding::new(
        bundle.tile_id(),
        Subject::Link {
            link_id: link.link_id,
        },
        FindingKind::IncorrectMultidigitAttribution,
        "Segment marked as MULTIDIGIT=Y but DIR_TRAVEL is B",
        "Update MULTIDIGIT to 'N'",
    )
    .with_line(&link.geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::METERS_PER_DEGREE;
    use crate::models::{NamingRecord, Tile};

    const LAT: f64 = 40.0;
    const LON: f64 = -3.0;

    /// A 200 m link starting `north_m` meters north of the origin, rotated by
    /// `angle_deg` from due east.
    fn link(link_id: i64, north_m: f64, angle_deg: f64, dir: DirTravel, multidigit: bool) -> Link {
        let cos_lat = LAT.to_radians().cos();
        let (dx, dy) = (200.0 * angle_deg.to_radians().cos(), 200.0 * angle_deg.to_radians().sin());
        let start = (LON, LAT + north_m / METERS_PER_DEGREE);
        let end = (
            start.0 + dx / (METERS_PER_DEGREE * cos_lat),
            start.1 + dy / METERS_PER_DEGREE,
        );
        let mut link = Link::new(link_id, vec![start, end], dir);
        link.multidigit = multidigit;
        link
    }

    fn bundle(links: Vec<Link>, names: &[(i64, &str)]) -> TileBundle {
        let naming = names
            .iter()
            .map(|(id, name)| NamingRecord::new(*id, name))
            .collect();
        TileBundle::new(Tile::new(1, vec![]), links, vec![], naming)
    }

    #[test]
    fn test_paired_carriageways_not_flagged() {
        let bundle = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 10.0, 5.0, DirTravel::AgainstReference, false),
            ],
            &[(1, "Gran Via"), (2, "GRAN VIA ")],
        );
        assert!(check_flagged_links(&bundle, &PairingConfig::default()).is_empty());
    }

    #[test]
    fn test_same_direction_partner_does_not_count() {
        let bundle = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 10.0, 0.0, DirTravel::Forward, true),
            ],
            &[(1, "Gran Via"), (2, "Gran Via")],
        );
        let findings = check_flagged_links(&bundle, &PairingConfig::default());
        assert_eq!(findings.len(), 2);
        assert!(findings
            .iter()
            .all(|f| f.error_type == FindingKind::IncorrectMultidigitAttribution));
    }

    #[test]
    fn test_partner_must_share_name() {
        let bundle = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 10.0, 0.0, DirTravel::AgainstReference, true),
            ],
            &[(1, "Gran Via"), (2, "Calle Mayor")],
        );
        let findings = check_flagged_links(&bundle, &PairingConfig::default());
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].subject, Subject::Link { link_id: 1 });
        assert_eq!(findings[0].evidence.street_name.as_deref(), Some("GRAN VIA"));
        assert_eq!(findings[0].suggestion, "Update MULTIDIGIT to 'N'");
    }

    #[test]
    fn test_distance_and_angle_windows() {
        // Too far
        let far = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 350.0, 0.0, DirTravel::AgainstReference, false),
            ],
            &[(1, "A"), (2, "A")],
        );
        assert_eq!(check_flagged_links(&far, &PairingConfig::default()).len(), 1);

        // Close but crossing at 80 degrees
        let crossing = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 10.0, 80.0, DirTravel::AgainstReference, false),
            ],
            &[(1, "A"), (2, "A")],
        );
        let findings = check_flagged_links(&crossing, &PairingConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].evidence.distance.unwrap() < 11.0);

        // Overlapping geometry is below the minimum distance
        let overlapping = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 0.0, 0.0, DirTravel::AgainstReference, false),
            ],
            &[(1, "A"), (2, "A")],
        );
        assert_eq!(check_flagged_links(&overlapping, &PairingConfig::default()).len(), 1);
    }

    #[test]
    fn test_distance_is_metric() {
        let parallel = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 150.0, 0.0, DirTravel::AgainstReference, false),
            ],
            &[(1, "A"), (2, "A")],
        );
        assert!(check_flagged_links(&parallel, &PairingConfig::default()).is_empty());

        let strict = PairingConfig {
            max_distance_m: 100.0,
            ..PairingConfig::default()
        };
        let findings = check_flagged_links(&parallel, &strict);
        assert_eq!(findings.len(), 1);
        // The partner is outside the search radius, so no nearest distance
        assert_eq!(findings[0].evidence.distance, None);

        let narrow = PairingConfig {
            max_angle_deg: 0.0,
            ..PairingConfig::default()
        };
        let tilted = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Forward, true),
                link(2, 150.0, 10.0, DirTravel::AgainstReference, false),
            ],
            &[(1, "A"), (2, "A")],
        );
        let findings = check_flagged_links(&tilted, &narrow);
        assert_eq!(findings.len(), 1);
        let nearest = findings[0].evidence.distance.unwrap();
        assert!((nearest - 150.0).abs() < 1.0, "{}", nearest);
    }

    #[test]
    fn test_bidirectional_and_unnamed_flagged_links() {
        let bundle = bundle(
            vec![
                link(1, 0.0, 0.0, DirTravel::Both, true),
                link(2, 500.0, 0.0, DirTravel::Forward, true),
                link(3, 1000.0, 0.0, DirTravel::Both, false),
            ],
            &[(1, "A")],
        );
        let findings = check_flagged_links(&bundle, &PairingConfig::default());
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].error_type, FindingKind::IncorrectMultidigitAttribution);
        assert!(findings[0].description.contains("DIR_TRAVEL is B"));
        assert_eq!(findings[0].error_type.as_str(), "incorrect_multidigit_attribution");
        assert_eq!(findings[1].error_type, FindingKind::IncorrectMultidigitAttribution);
        assert!(findings[1].description.contains("no street name"));
    }
}
