//! Spatial index for fast link candidate lookups.

use geo::BoundingRect;
use geo_types::LineString;
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

/// Wrapper for R-tree indexing of link geometries
#[derive(Debug, Clone)]
pub struct IndexedLink {
    /// Position of the link in the tile bundle
    pub position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedLink {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedLink {
    pub fn new(position: usize, line: &LineString<f64>) -> Option<Self> {
        let rect = line.bounding_rect()?;
        Some(Self {
            position,
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        })
    }
}

/// Spatial index over link geometries using R-tree.
///
/// The index is coordinate-space agnostic: build it from geographic lines to
/// search in degrees, or from projected lines to search in meters.
pub struct LinkSpatialIndex {
    tree: RTree<IndexedLink>,
}

impl LinkSpatialIndex {
    /// Build spatial index from (position, geometry) pairs
    pub fn build<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a LineString<f64>)>,
    {
        let indexed: Vec<IndexedLink> = lines
            .into_iter()
            .filter_map(|(position, line)| IndexedLink::new(position, line))
            .collect();

        let tree = RTree::bulk_load(indexed);
        debug!("Link spatial index built with {} entries", tree.size());

        Self { tree }
    }

    /// Positions of links whose bounding box lies within `radius` of the
    /// bounding box of `line`, in ascending order.
    ///
    /// This is a coarse filter; callers apply the exact distance test.
    pub fn candidates_near(&self, line: &LineString<f64>, radius: f64) -> Vec<usize> {
        let Some(rect) = line.bounding_rect() else {
            return Vec::new();
        };
        let query_envelope = AABB::from_corners(
            [rect.min().x - radius, rect.min().y - radius],
            [rect.max().x + radius, rect.max().y + radius],
        );

        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|il| il.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Get total number of indexed links
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
