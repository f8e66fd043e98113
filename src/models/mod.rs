//! Core data models for tile validation.

pub mod finding;
pub mod link;
pub mod naming;
pub mod poi;
pub mod tile;

pub use finding::{Evidence, Finding, FindingKind, Subject};
pub use link::{
    order_reference_nodes, parse_flag, AddressScheme, DirTravel, LegalAccess, Link,
    RoadAttributes, SideAddressing,
};
pub use naming::{normalize_street_name, NamingRecord};
pub use poi::{normalize_percent, Poi, Side};
pub use tile::{Tile, TileBundle};

pub type TileId = i64;
pub type LinkId = i64;
pub type PoiId = i64;
