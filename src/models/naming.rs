//! Street naming and addressing records.

use serde::{Deserialize, Serialize};

use super::{LinkId, Side, SideAddressing};

/// Name (and per-side addressing) attached to a link.
///
/// A link may carry several names, e.g. a local name and a route name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingRecord {
    pub link_id: LinkId,
    pub street_name: String,
    #[serde(default)]
    pub left: SideAddressing,
    #[serde(default)]
    pub right: SideAddressing,
}

impl NamingRecord {
    pub fn new(link_id: LinkId, street_name: &str) -> Self {
        Self {
            link_id,
            street_name: street_name.to_string(),
            left: SideAddressing::default(),
            right: SideAddressing::default(),
        }
    }

    pub fn addressing(&self, side: Side) -> &SideAddressing {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_street_name(&self.street_name)
    }
}

/// Street names are compared trimmed and upper-cased.
pub fn normalize_street_name(name: &str) -> String {
    name.trim().to_uppercase()
}
