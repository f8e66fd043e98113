//! Tile bundle: the read-only input of one validation run.

use std::collections::BTreeMap;

use geo::{BoundingRect, Contains};
use geo_types::{Coord, LineString, Point, Polygon};
use hashbrown::HashMap;
use tracing::warn;

use super::naming::normalize_street_name;
use super::{Link, LinkId, NamingRecord, Poi, SideAddressing, TileId};

/// A map tile and its boundary.
#[derive(Debug, Clone)]
pub struct Tile {
    pub tile_id: TileId,
    pub boundary: Polygon<f64>,
}

impl Tile {
    pub fn new(tile_id: TileId, ring: Vec<(f64, f64)>) -> Self {
        Self {
            tile_id,
            boundary: Polygon::new(LineString::from(ring), vec![]),
        }
    }

    /// A tile without a usable boundary ring accepts every point.
    pub fn is_bounded(&self) -> bool {
        self.boundary.exterior().0.len() >= 4
    }

    /// Strict containment of a point in the tile.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        !self.is_bounded() || self.boundary.contains(point)
    }

    /// Center of the boundary's bounding box.
    pub fn center(&self) -> Option<Coord<f64>> {
        if !self.is_bounded() {
            return None;
        }
        self.boundary.bounding_rect().map(|rect| rect.center())
    }
}

/// Links, POIs and naming records of one tile, with lookup tables.
#[derive(Debug, Clone)]
pub struct TileBundle {
    pub tile: Tile,
    pub links: Vec<Link>,
    pub pois: Vec<Poi>,
    pub naming: Vec<NamingRecord>,
    link_positions: HashMap<LinkId, usize>,
    /// Normalized names per link, in naming-record order
    link_names: HashMap<LinkId, Vec<String>>,
    /// (link id, normalized name) -> naming record position
    naming_positions: HashMap<(LinkId, String), usize>,
}

impl TileBundle {
    pub fn new(tile: Tile, links: Vec<Link>, pois: Vec<Poi>, naming: Vec<NamingRecord>) -> Self {
        let mut link_positions = HashMap::with_capacity(links.len());
        for (pos, link) in links.iter().enumerate() {
            if link_positions.insert(link.link_id, pos).is_some() {
                warn!(
                    "Tile {}: duplicate link {} - keeping the last record",
                    tile.tile_id, link.link_id
                );
            }
        }

        let mut link_names: HashMap<LinkId, Vec<String>> = HashMap::new();
        let mut naming_positions = HashMap::with_capacity(naming.len());
        for (pos, record) in naming.iter().enumerate() {
            let name = record.normalized_name();
            if name.is_empty() {
                continue;
            }
            let names = link_names.entry(record.link_id).or_default();
            if !names.contains(&name) {
                names.push(name.clone());
            }
            naming_positions.entry((record.link_id, name)).or_insert(pos);
        }

        Self {
            tile,
            links,
            pois,
            naming,
            link_positions,
            link_names,
            naming_positions,
        }
    }

    pub fn tile_id(&self) -> TileId {
        self.tile.tile_id
    }

    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.link_positions.get(&link_id).map(|&pos| &self.links[pos])
    }

    /// All normalized names of a link.
    pub fn link_names(&self, link_id: LinkId) -> &[String] {
        self.link_names
            .get(&link_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First name of a link in naming-record order.
    pub fn primary_name(&self, link_id: LinkId) -> Option<&str> {
        self.link_names(link_id).first().map(String::as_str)
    }

    pub fn has_name(&self, link_id: LinkId, normalized: &str) -> bool {
        self.link_names(link_id).iter().any(|n| n == normalized)
    }

    /// Addressing range that applies to a POI on its declared side.
    ///
    /// The link's own addressing wins; naming records back-fill it, matched on
    /// (link id, street name).
    pub fn addressing_for(&self, poi: &Poi) -> Option<&SideAddressing> {
        if let Some(link) = self.link(poi.link_id) {
            let own = link.addressing(poi.side);
            if !own.is_empty() {
                return Some(own);
            }
        }

        let name = normalize_street_name(poi.street_name()?);
        let pos = self.naming_positions.get(&(poi.link_id, name))?;
        let backfill = self.naming[*pos].addressing(poi.side);
        (!backfill.is_empty()).then_some(backfill)
    }

    /// Links grouped by normalized street name, each group sorted by link id.
    ///
    /// A link with several names appears in several groups.
    pub fn links_by_name(&self) -> BTreeMap<&str, Vec<&Link>> {
        let mut groups: BTreeMap<&str, Vec<&Link>> = BTreeMap::new();
        for (link_id, names) in &self.link_names {
            let Some(link) = self.link(*link_id) else {
                continue;
            };
            for name in names {
                groups.entry(name.as_str()).or_default().push(link);
            }
        }
        for links in groups.values_mut() {
            links.sort_by_key(|l| l.link_id);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressScheme, DirTravel, Side};

    fn unit_tile() -> Tile {
        Tile::new(
            1,
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)],
        )
    }

    #[test]
    fn test_tile_contains() {
        let tile = unit_tile();
        assert!(tile.contains(&Point::new(0.5, 0.5)));
        assert!(!tile.contains(&Point::new(1.5, 0.5)));
        assert_eq!(tile.center(), Some(Coord { x: 0.5, y: 0.5 }));
    }

    #[test]
    fn test_unbounded_tile_contains_everything() {
        let tile = Tile::new(1, vec![]);
        assert!(tile.contains(&Point::new(100.0, -40.0)));
        assert!(tile.center().is_none());
    }

    #[test]
    fn test_names_are_normalized_and_grouped() {
        let links = vec![
            Link::new(3, vec![(0.0, 0.0), (0.0, 1.0)], DirTravel::Both),
            Link::new(1, vec![(0.0, 0.0), (1.0, 0.0)], DirTravel::Both),
        ];
        let naming = vec![
            NamingRecord::new(3, " main st"),
            NamingRecord::new(1, "MAIN ST"),
            NamingRecord::new(1, "Route 9"),
            NamingRecord::new(1, "main st "),
        ];
        let bundle = TileBundle::new(unit_tile(), links, vec![], naming);

        assert_eq!(bundle.link_names(1), &["MAIN ST".to_string(), "ROUTE 9".to_string()]);
        assert_eq!(bundle.primary_name(3), Some("MAIN ST"));
        assert!(bundle.has_name(1, "ROUTE 9"));

        let groups = bundle.links_by_name();
        let main: Vec<_> = groups["MAIN ST"].iter().map(|l| l.link_id).collect();
        assert_eq!(main, vec![1, 3]);
        assert_eq!(groups["ROUTE 9"].len(), 1);
    }

    #[test]
    fn test_addressing_backfilled_from_naming() {
        let mut with_own = Link::new(1, vec![(0.0, 0.0), (0.0, 1.0)], DirTravel::Both);
        with_own.left = SideAddressing::new("1", "9", AddressScheme::Odd);
        let without = Link::new(2, vec![(0.0, 0.0), (0.0, 1.0)], DirTravel::Both);

        let mut record = NamingRecord::new(2, "Main St");
        record.left = SideAddressing::new("10", "20", AddressScheme::Even);
        let mut other = NamingRecord::new(1, "Main St");
        other.left = SideAddressing::new("100", "200", AddressScheme::Even);

        let bundle = TileBundle::new(unit_tile(), vec![with_own, without], vec![], vec![record, other]);

        let mut poi = Poi::new(1, 1, 50.0, Side::Left);
        poi.street_name = Some("main st".to_string());
        assert_eq!(bundle.addressing_for(&poi).unwrap().low.as_deref(), Some("1"));

        poi.link_id = 2;
        assert_eq!(bundle.addressing_for(&poi).unwrap().low.as_deref(), Some("10"));

        poi.side = Side::Right;
        assert!(bundle.addressing_for(&poi).is_none());

        poi.side = Side::Left;
        poi.street_name = Some("Other St".to_string());
        assert!(bundle.addressing_for(&poi).is_none());
    }
}
