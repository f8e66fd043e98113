//! Detection of parallel same-name links that lack the MULTIDIGIT flag.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::config::{ParallelConfig, ScoreWeights};
use crate::geometry::{
    bearing_difference_deg, degrees_to_meters, line_distance, line_length, meters_to_degrees,
    LinkSpatialIndex,
};
use crate::models::{Finding, FindingKind, Link, LinkId, Subject, TileBundle};

/// Plausibility that a single segment is one carriageway of a divided road.
pub fn segment_score(link: &Link, weights: &ScoreWeights, min_length_m: f64) -> f64 {
    let attrs = &link.attributes;
    let mut score = 0.0;
    if attrs.divider {
        score += weights.divider;
    }
    if attrs.func_class.is_some_and(|class| class < 5) {
        score += weights.non_local_func_class;
    }
    if attrs.lane_cat.is_some_and(|cat| cat > 1) {
        score += weights.multi_lane;
    }
    if length_m(link) > min_length_m {
        score += weights.long_segment;
    }
    if attrs.speed_cat.is_some_and(|cat| cat >= 5) {
        score += weights.high_speed_cat;
    }
    if attrs.tollway {
        score += weights.tollway;
    }
    if !attrs.urban {
        score += weights.non_urban;
    }
    score
}

fn length_m(link: &Link) -> f64 {
    degrees_to_meters(line_length(&link.geometry))
}

/// A qualifying parallel pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallelPair {
    pub other_link_id: LinkId,
    pub distance_m: f64,
    pub angle_deg: f64,
    pub score: f64,
}

/// Score a candidate pair, `None` when the two links are not parallel
/// neighbours or the pair is too short to judge.
pub fn evaluate_pair(link: &Link, other: &Link, config: &ParallelConfig) -> Option<ParallelPair> {
    let angle_deg = bearing_difference_deg(&link.geometry, &other.geometry)?;
    if angle_deg > config.max_angle_deg {
        return None;
    }

    let distance_m = degrees_to_meters(line_distance(&link.geometry, &other.geometry));
    if distance_m > config.max_distance_m {
        return None;
    }

    let short = length_m(link) < config.min_length_m || length_m(other) < config.min_length_m;
    if short && !(link.attributes.divider || other.attributes.divider) {
        return None;
    }

    let score = (segment_score(link, &config.weights, config.min_length_m)
        + segment_score(other, &config.weights, config.min_length_m))
        / 2.0;

    Some(ParallelPair {
        other_link_id: other.link_id,
        distance_m,
        angle_deg,
        score,
    })
}

/// Flag unflagged links that have a parallel same-name partner scoring at or
/// above the threshold.
///
/// Name groups are visited in name order and links within a group by
/// ascending id; each link is reported at most once.
pub fn check_unflagged_links(bundle: &TileBundle, config: &ParallelConfig) -> Vec<Finding> {
    let index = LinkSpatialIndex::build(
        bundle
            .links
            .iter()
            .enumerate()
            .map(|(pos, link)| (pos, &link.geometry)),
    );
    let radius = meters_to_degrees(config.max_distance_m);

    let mut neighbours: HashMap<LinkId, HashSet<LinkId>> = HashMap::new();
    let mut reported: HashSet<LinkId> = HashSet::new();
    let mut findings = Vec::new();

    for (name, group) in bundle.links_by_name() {
        for link in group.iter().filter(|l| !l.multidigit) {
            if reported.contains(&link.link_id) {
                continue;
            }

            let near = neighbours.entry(link.link_id).or_insert_with(|| {
                index
                    .candidates_near(&link.geometry, radius)
                    .into_iter()
                    .map(|pos| bundle.links[pos].link_id)
                    .collect()
            });

            let pair = group
                .iter()
                .filter(|other| other.link_id != link.link_id && near.contains(&other.link_id))
                .filter_map(|other| evaluate_pair(link, other, config))
                .find(|pair| pair.score >= config.score_threshold);

            let Some(pair) = pair else {
                continue;
            };

            debug!(
                "Link {} parallel to {} on {} ({:.1} m, {:.1} deg, score {:.2})",
                link.link_id, pair.other_link_id, name, pair.distance_m, pair.angle_deg, pair.score
            );
            reported.insert(link.link_id);
            findings.push(
                Finding::new(
                    bundle.tile_id(),
                    Subject::LinkPair {
                        link_id: link.link_id,
                        other_link_id: pair.other_link_id,
                    },
                    FindingKind::PotentialMultidigitFalseNegative,
                    format!(
                        "Segment marked as MULTIDIGIT=N runs parallel to link {} with the same name (score {:.2})",
                        pair.other_link_id, pair.score
                    ),
                    "Update MULTIDIGIT to 'Y'",
                )
                .with_score(pair.score)
                .with_distance(pair.distance_m)
                .with_street_name(name)
                .with_line(&link.geometry),
            );
        }
    }

    findings
}
