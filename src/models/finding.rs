//! Validation findings produced by the checks.

use geo_types::{LineString, Point};
use serde::{Deserialize, Serialize};

use super::{LinkId, PoiId, Side, TileId};

/// Outcome / error tag of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FindingKind {
    /// Address validated (or nothing to validate)
    #[serde(rename = "OK")]
    AddressOk,
    /// POI could not be placed on its link
    #[serde(rename = "NOT_EXISTS")]
    NotExists,
    #[serde(rename = "OUT_OF_RANGE")]
    OutOfRange,
    /// Address violation tolerated because of a legal access flag
    #[serde(rename = "LEGAL_EXCEPTION")]
    LegalException,
    #[serde(rename = "wrong_side_of_street")]
    WrongSideOfStreet,
    #[serde(rename = "invalid_link_reference")]
    InvalidLinkReference,
    #[serde(rename = "geometry_processing_error")]
    GeometryProcessingError,
    #[serde(rename = "incorrect_multidigit_attribution")]
    IncorrectMultidigitAttribution,
    #[serde(rename = "potential_multidigit_false_negative")]
    PotentialMultidigitFalseNegative,
    #[serde(rename = "poi_outside_tile")]
    PoiOutsideTile,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::AddressOk => "OK",
            FindingKind::NotExists => "NOT_EXISTS",
            FindingKind::OutOfRange => "OUT_OF_RANGE",
            FindingKind::LegalException => "LEGAL_EXCEPTION",
            FindingKind::WrongSideOfStreet => "wrong_side_of_street",
            FindingKind::InvalidLinkReference => "invalid_link_reference",
            FindingKind::GeometryProcessingError => "geometry_processing_error",
            FindingKind::IncorrectMultidigitAttribution => "incorrect_multidigit_attribution",
            FindingKind::PotentialMultidigitFalseNegative => "potential_multidigit_false_negative",
            FindingKind::PoiOutsideTile => "poi_outside_tile",
        }
    }

    /// Whether this kind reports a problem, as opposed to a passed check.
    pub fn is_error(&self) -> bool {
        !matches!(self, FindingKind::AddressOk)
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum Subject {
    Poi { poi_id: PoiId, link_id: LinkId },
    Link { link_id: LinkId },
    LinkPair { link_id: LinkId, other_link_id: LinkId },
}

impl Subject {
    /// The primary link the finding refers to.
    pub fn link_id(&self) -> LinkId {
        match self {
            Subject::Poi { link_id, .. }
            | Subject::Link { link_id }
            | Subject::LinkPair { link_id, .. } => *link_id,
        }
    }
}

/// Numeric and descriptive evidence backing a finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_side: Option<Side>,
    /// Distance in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    /// `[lon, lat]` pairs: a single point for POIs, the polyline for links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<[f64; 2]>>,
}

/// A single validation result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub tile_id: TileId,
    #[serde(flatten)]
    pub subject: Subject,
    pub error_type: FindingKind,
    pub description: String,
    pub suggestion: String,
    #[serde(flatten)]
    pub evidence: Evidence,
}

impl Finding {
    pub fn new(
        tile_id: TileId,
        subject: Subject,
        error_type: FindingKind,
        description: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            tile_id,
            subject,
            error_type,
            description: description.into(),
            suggestion: suggestion.into(),
            evidence: Evidence::default(),
        }
    }

    pub fn with_sides(mut self, expected: Side, actual: Side) -> Self {
        self.evidence.expected_side = Some(expected);
        self.evidence.actual_side = Some(actual);
        self
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.evidence.distance = Some(meters);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.evidence.score = Some(score);
        self
    }

    pub fn with_street_name(mut self, name: &str) -> Self {
        self.evidence.street_name = Some(name.to_string());
        self
    }

    pub fn with_house_number(mut self, number: &str) -> Self {
        self.evidence.house_number = Some(number.to_string());
        self
    }

    pub fn with_point(mut self, point: Point<f64>) -> Self {
        self.evidence.geometry = Some(vec![[point.x(), point.y()]]);
        self
    }

    pub fn with_line(mut self, line: &LineString<f64>) -> Self {
        self.evidence.geometry = Some(line.coords().map(|c| [c.x, c.y]).collect());
        self
    }
}
