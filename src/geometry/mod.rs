//! Geometry primitives used by the checks.
//!
//! Resolves POI positions along links, classifies sides of street, measures
//! link distances and angles, and indexes link geometries in an R-tree.

mod index;
mod measure;
mod projection;
mod resolver;
mod side;

pub use index::{IndexedLink, LinkSpatialIndex};
pub use measure::{
    bearing, bearing_difference_deg, direction_vector, line_distance, unsigned_angle_deg,
};
pub use projection::{degrees_to_meters, meters_to_degrees, LocalProjection};
pub use resolver::{
    interpolate, line_length, resolve_on_link, GeometryError, GeometryResolver, ResolvedPosition,
};
pub use side::{classify_side, cross, displace_toward, SideClassifier, SideReading};
