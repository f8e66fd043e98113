//! Street link (navigable segment) types.

use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};

use super::{LinkId, Side};

/// Direction of travel permitted on a link, relative to its digitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirTravel {
    /// Open in both directions ("B")
    Both,
    /// Open from the first coordinate towards the last ("F")
    Forward,
    /// Open against the digitization direction ("T")
    AgainstReference,
}

impl DirTravel {
    /// Parse a source token. Unknown or empty tokens fall back to `Both`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "F" => DirTravel::Forward,
            "T" => DirTravel::AgainstReference,
            _ => DirTravel::Both,
        }
    }

    /// The direction a matching carriageway of a divided road must carry.
    pub fn opposite(&self) -> Option<Self> {
        match self {
            DirTravel::Forward => Some(DirTravel::AgainstReference),
            DirTravel::AgainstReference => Some(DirTravel::Forward),
            DirTravel::Both => None,
        }
    }
}

/// House number parity convention for one side of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressScheme {
    #[default]
    None,
    Even,
    Odd,
}

impl AddressScheme {
    /// Parse `E`/`O`; anything else (including mixed schemes) imposes no parity.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "E" => AddressScheme::Even,
            "O" => AddressScheme::Odd,
            _ => AddressScheme::None,
        }
    }
}

/// Addressing range for one side of a link.
///
/// Bounds are kept as the raw source values; they are only interpreted by the
/// address check, where an unparseable bound counts as a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideAddressing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    #[serde(default)]
    pub scheme: AddressScheme,
}

impl SideAddressing {
    pub fn new(low: &str, high: &str, scheme: AddressScheme) -> Self {
        Self {
            low: Some(low.to_string()),
            high: Some(high.to_string()),
            scheme,
        }
    }

    /// True when neither bound was supplied.
    pub fn is_empty(&self) -> bool {
        is_blank(&self.low) && is_blank(&self.high)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Access permissions that excuse an addressing violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalAccess {
    pub pedestrians: bool,
    pub trucks: bool,
    pub bus: bool,
}

impl LegalAccess {
    pub fn any(&self) -> bool {
        self.pedestrians || self.trucks || self.bus
    }
}

/// Descriptive attributes only used to score potential divided roads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadAttributes {
    /// Functional class 1 (major) to 5 (local)
    pub func_class: Option<u8>,
    /// Lane category, 1 meaning a single lane
    pub lane_cat: Option<u8>,
    pub divider: bool,
    pub speed_cat: Option<u8>,
    pub tollway: bool,
    pub urban: bool,
}

/// A digitized street segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub link_id: LinkId,
    pub geometry: LineString<f64>,
    pub dir_travel: DirTravel,
    pub multidigit: bool,
    #[serde(default)]
    pub left: SideAddressing,
    #[serde(default)]
    pub right: SideAddressing,
    #[serde(default)]
    pub legal: LegalAccess,
    #[serde(default)]
    pub attributes: RoadAttributes,
}

impl Link {
    /// Create a link with no addressing, access or scoring attributes.
    pub fn new(link_id: LinkId, coords: Vec<(f64, f64)>, dir_travel: DirTravel) -> Self {
        Self {
            link_id,
            geometry: LineString::from(coords),
            dir_travel,
            multidigit: false,
            left: SideAddressing::default(),
            right: SideAddressing::default(),
            legal: LegalAccess::default(),
            attributes: RoadAttributes::default(),
        }
    }

    pub fn addressing(&self, side: Side) -> &SideAddressing {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Canonical (reference, non-reference) endpoints.
    ///
    /// The reference node is the endpoint with the lower latitude, ties broken
    /// by the lower longitude, whatever order the coordinates are stored in.
    pub fn reference_nodes(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        if self.geometry.0.len() < 2 {
            return None;
        }
        let first = *self.geometry.0.first()?;
        let last = *self.geometry.0.last()?;
        Some(order_reference_nodes(first, last))
    }
}

/// Order two endpoints so the reference node comes first.
pub fn order_reference_nodes(first: Coord<f64>, last: Coord<f64>) -> (Coord<f64>, Coord<f64>) {
    if first.y < last.y || (first.y == last.y && first.x < last.x) {
        (first, last)
    } else {
        (last, first)
    }
}

/// Parse a `Y`/`N` style flag. Anything but an explicit yes is false.
pub fn parse_flag(token: &str) -> bool {
    matches!(
        token.trim().to_ascii_uppercase().as_str(),
        "Y" | "YES" | "TRUE" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_travel_tokens() {
        assert_eq!(DirTravel::from_token("F"), DirTravel::Forward);
        assert_eq!(DirTravel::from_token(" t "), DirTravel::AgainstReference);
        assert_eq!(DirTravel::from_token("B"), DirTravel::Both);
        assert_eq!(DirTravel::from_token(""), DirTravel::Both);
        assert_eq!(DirTravel::Forward.opposite(), Some(DirTravel::AgainstReference));
        assert_eq!(DirTravel::Both.opposite(), None);
    }

    #[test]
    fn test_reference_node_by_latitude() {
        let up = Link::new(1, vec![(0.0, 0.0), (0.0, 1.0)], DirTravel::Both);
        let down = Link::new(2, vec![(0.0, 1.0), (0.0, 0.0)], DirTravel::Both);
        assert_eq!(up.reference_nodes(), down.reference_nodes());
        let (reference, _) = up.reference_nodes().unwrap();
        assert_eq!(reference, Coord { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_reference_node_tie_breaks_on_longitude() {
        let link = Link::new(1, vec![(3.0, 5.0), (2.0, 5.0)], DirTravel::Forward);
        let (reference, non_reference) = link.reference_nodes().unwrap();
        assert_eq!(reference, Coord { x: 2.0, y: 5.0 });
        assert_eq!(non_reference, Coord { x: 3.0, y: 5.0 });
    }

    #[test]
    fn test_reference_nodes_need_two_points() {
        let link = Link::new(1, vec![(3.0, 5.0)], DirTravel::Forward);
        assert!(link.reference_nodes().is_none());
    }

    #[test]
    fn test_flags_and_schemes() {
        assert!(parse_flag("Y"));
        assert!(!parse_flag("N"));
        assert!(!parse_flag(""));
        assert_eq!(AddressScheme::from_token("e"), AddressScheme::Even);
        assert_eq!(AddressScheme::from_token("M"), AddressScheme::None);
        assert!(SideAddressing::default().is_empty());
        assert!(!SideAddressing::new("1", "9", AddressScheme::Odd).is_empty());
    }
}
