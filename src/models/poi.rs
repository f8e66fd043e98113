//! Point of interest records.

use serde::{Deserialize, Serialize};

use super::{LinkId, PoiId};

/// Percent along the link used when the source value is missing or invalid.
pub const DEFAULT_PERCENT_FROM_REF: f64 = 50.0;

/// Side of the street, seen from the reference node looking towards the
/// non-reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Side {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Side::Left),
            "R" => Some(Side::Right),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A POI attached to a link at some percentage along it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub poi_id: PoiId,
    pub link_id: LinkId,
    /// PERCFRREF, 0..=100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_from_ref: Option<f64>,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fac_type: Option<u32>,
}

impl Poi {
    pub fn new(poi_id: PoiId, link_id: LinkId, percent_from_ref: f64, side: Side) -> Self {
        Self {
            poi_id,
            link_id,
            percent_from_ref: Some(percent_from_ref),
            side,
            street_name: None,
            house_number: None,
            fac_type: None,
        }
    }

    /// The position along the link as a fraction in `[0, 1]`.
    ///
    /// Missing or non-finite values fall back to the midpoint; values outside
    /// `[0, 100]` are clamped.
    pub fn fraction_along(&self) -> f64 {
        normalize_percent(self.percent_from_ref)
    }

    /// House number, if present and not blank.
    pub fn house_number(&self) -> Option<&str> {
        non_blank(&self.house_number)
    }

    /// Street name, if present and not blank.
    pub fn street_name(&self) -> Option<&str> {
        non_blank(&self.street_name)
    }
}

/// Turn a PERCFRREF value into a fraction in `[0, 1]`.
pub fn normalize_percent(percent: Option<f64>) -> f64 {
    let percent = percent
        .filter(|p| p.is_finite())
        .unwrap_or(DEFAULT_PERCENT_FROM_REF);
    percent.clamp(0.0, 100.0) / 100.0
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_defaults_and_clamps() {
        let mut poi = Poi::new(1, 1, 25.0, Side::Left);
        assert_eq!(poi.fraction_along(), 0.25);

        poi.percent_from_ref = None;
        assert_eq!(poi.fraction_along(), 0.5);

        poi.percent_from_ref = Some(f64::NAN);
        assert_eq!(poi.fraction_along(), 0.5);

        poi.percent_from_ref = Some(140.0);
        assert_eq!(poi.fraction_along(), 1.0);

        poi.percent_from_ref = Some(-3.0);
        assert_eq!(poi.fraction_along(), 0.0);
    }

    #[test]
    fn test_side_tokens() {
        assert_eq!(Side::from_token(" r"), Some(Side::Right));
        assert_eq!(Side::from_token("L"), Some(Side::Left));
        assert_eq!(Side::from_token("X"), None);
        assert_eq!(Side::Left.to_string(), "L");
    }

    #[test]
    fn test_blank_address_fields() {
        let mut poi = Poi::new(1, 1, 50.0, Side::Left);
        poi.house_number = Some("  ".to_string());
        poi.street_name = Some(" Main St ".to_string());
        assert_eq!(poi.house_number(), None);
        assert_eq!(poi.street_name(), Some("Main St"));
    }
}
