//! Tile and POI file loading.
//!
//! Layout of a data directory:
//!
//! ```text
//! <data>/tiles/<tile_id>.json      boundary, links and naming rows
//! <data>/POIs/POI_<tile_id>.csv    POI rows (optionally .csv.gz)
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use navcheck::models::{
    parse_flag, AddressScheme, DirTravel, LegalAccess, Link, NamingRecord, Poi, RoadAttributes,
    Side, SideAddressing, Tile, TileBundle, TileId,
};

/// Files making up one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    pub tile_id: TileId,
    pub tile_path: PathBuf,
    pub poi_path: Option<PathBuf>,
}

/// Find tile files under `<data>/tiles`, restricted to `only` when not empty.
pub fn discover_tiles(data_dir: &Path, only: &[TileId]) -> Result<Vec<TileSource>> {
    let tiles_dir = data_dir.join("tiles");
    if !tiles_dir.is_dir() {
        anyhow::bail!("Tile directory {} does not exist", tiles_dir.display());
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(&tiles_dir).min_depth(1).max_depth(1) {
        let entry = entry.context("Failed to read tile directory")?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "json") {
            continue;
        }

        let Some(tile_id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<TileId>().ok())
        else {
            warn!("Skipping {}: file name is not a tile id", path.display());
            continue;
        };
        if !only.is_empty() && !only.contains(&tile_id) {
            continue;
        }

        sources.push(TileSource {
            tile_id,
            tile_path: path.to_path_buf(),
            poi_path: poi_file(data_dir, tile_id),
        });
    }

    sources.sort_by_key(|s| s.tile_id);
    for missing in only.iter().filter(|id| !sources.iter().any(|s| s.tile_id == **id)) {
        warn!("Requested tile {} not found in {}", missing, tiles_dir.display());
    }

    info!("Found {} tiles in {}", sources.len(), tiles_dir.display());
    Ok(sources)
}

fn poi_file(data_dir: &Path, tile_id: TileId) -> Option<PathBuf> {
    let dir = data_dir.join("POIs");
    [
        dir.join(format!("POI_{}.csv", tile_id)),
        dir.join(format!("POI_{}.csv.gz", tile_id)),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Load the tile file and its POIs into a bundle.
pub fn load_bundle(source: &TileSource) -> Result<TileBundle> {
    let file = File::open(&source.tile_path)
        .with_context(|| format!("Failed to open tile file {}", source.tile_path.display()))?;
    let raw: TileFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse tile file {}", source.tile_path.display()))?;

    let ring = raw.boundary.iter().map(|[x, y]| (*x, *y)).collect();
    let tile = Tile::new(source.tile_id, ring);

    let links = parse_rows(raw.links, "link", source.tile_id, RawLink::into_link);
    let naming = parse_rows(raw.naming, "naming", source.tile_id, RawNaming::into_record);

    let pois = match &source.poi_path {
        Some(path) => load_pois(path)?,
        None => {
            warn!("No POI file for tile {}", source.tile_id);
            Vec::new()
        }
    };

    debug!(
        "Loaded tile {}: {} links, {} naming rows, {} POIs",
        source.tile_id,
        links.len(),
        naming.len(),
        pois.len()
    );
    Ok(TileBundle::new(tile, links, pois, naming))
}

#[derive(Debug, Deserialize)]
struct TileFile {
    #[serde(default)]
    boundary: Vec<[f64; 2]>,
    #[serde(default)]
    links: Vec<serde_json::Value>,
    #[serde(default)]
    naming: Vec<serde_json::Value>,
}

/// Deserialize rows one by one so a bad row only loses itself.
fn parse_rows<R, T>(
    rows: Vec<serde_json::Value>,
    kind: &str,
    tile_id: TileId,
    convert: impl Fn(R) -> Result<T>,
) -> Vec<T>
where
    R: for<'de> Deserialize<'de>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let parsed = serde_json::from_value::<R>(row)
                .map_err(anyhow::Error::from)
                .and_then(&convert);
            match parsed {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Tile {}: skipping {} row {}: {}", tile_id, kind, i, e);
                    None
                }
            }
        })
        .collect()
}

/// A cell that may hold a number, a string or a boolean.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn text(&self) -> String {
        match self {
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Cell::Text(s) => parse_id(s),
            _ => None,
        }
    }

    fn as_u8(&self) -> Option<u8> {
        self.as_i64().and_then(|v| u8::try_from(v).ok())
    }

    fn flag(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Int(i) => *i != 0,
            Cell::Float(f) => *f != 0.0,
            Cell::Text(s) => parse_flag(s),
        }
    }
}

fn text(cell: &Option<Cell>) -> Option<String> {
    cell.as_ref().map(Cell::text).filter(|s| !s.is_empty())
}

fn flag(cell: &Option<Cell>) -> bool {
    cell.as_ref().is_some_and(Cell::flag)
}

fn small(cell: &Option<Cell>) -> Option<u8> {
    cell.as_ref().and_then(Cell::as_u8)
}

fn addressing(low: &Option<Cell>, high: &Option<Cell>, scheme: &Option<Cell>) -> SideAddressing {
    SideAddressing {
        low: text(low),
        high: text(high),
        scheme: text(scheme)
            .map(|s| AddressScheme::from_token(&s))
            .unwrap_or_default(),
    }
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(alias = "LINK_ID")]
    link_id: Cell,
    #[serde(rename = "DIR_TRAVEL", default)]
    dir_travel: Option<Cell>,
    #[serde(rename = "MULTIDIGIT", default)]
    multidigit: Option<Cell>,
    #[serde(rename = "FUNC_CLASS", default)]
    func_class: Option<Cell>,
    #[serde(rename = "LANE_CAT", default)]
    lane_cat: Option<Cell>,
    #[serde(rename = "DIVIDER", default)]
    divider: Option<Cell>,
    #[serde(rename = "SPEED_CAT", default)]
    speed_cat: Option<Cell>,
    #[serde(rename = "TOLLWAY", default)]
    tollway: Option<Cell>,
    #[serde(rename = "URBAN", default)]
    urban: Option<Cell>,
    #[serde(rename = "AR_PEDEST", default)]
    ar_pedest: Option<Cell>,
    #[serde(rename = "AR_TRUCKS", default)]
    ar_trucks: Option<Cell>,
    #[serde(rename = "AR_BUS", default)]
    ar_bus: Option<Cell>,
    #[serde(rename = "L_REFADDR", default)]
    l_refaddr: Option<Cell>,
    #[serde(rename = "L_NREFADDR", default)]
    l_nrefaddr: Option<Cell>,
    #[serde(rename = "L_ADDRSCH", default)]
    l_addrsch: Option<Cell>,
    #[serde(rename = "R_REFADDR", default)]
    r_refaddr: Option<Cell>,
    #[serde(rename = "R_NREFADDR", default)]
    r_nrefaddr: Option<Cell>,
    #[serde(rename = "R_ADDRSCH", default)]
    r_addrsch: Option<Cell>,
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

impl RawLink {
    fn into_link(self) -> Result<Link> {
        let link_id = self
            .link_id
            .as_i64()
            .ok_or_else(|| anyhow!("invalid link_id {:?}", self.link_id))?;
        let dir = text(&self.dir_travel)
            .map(|t| DirTravel::from_token(&t))
            .unwrap_or(DirTravel::Both);

        let mut link = Link::new(
            link_id,
            self.coordinates.iter().map(|[x, y]| (*x, *y)).collect(),
            dir,
        );
        link.multidigit = flag(&self.multidigit);
        link.left = addressing(&self.l_refaddr, &self.l_nrefaddr, &self.l_addrsch);
        link.right = addressing(&self.r_refaddr, &self.r_nrefaddr, &self.r_addrsch);
        link.legal = LegalAccess {
            pedestrians: flag(&self.ar_pedest),
            trucks: flag(&self.ar_trucks),
            bus: flag(&self.ar_bus),
        };
        link.attributes = RoadAttributes {
            func_class: small(&self.func_class),
            lane_cat: small(&self.lane_cat),
            divider: text(&self.divider).is_some_and(|d| divider_present(&d)),
            speed_cat: small(&self.speed_cat),
            tollway: flag(&self.tollway),
            urban: flag(&self.urban),
        };
        Ok(link)
    }
}

/// DIVIDER holds a divider type code; "N" and "0" mean none.
fn divider_present(code: &str) -> bool {
    !matches!(code.to_ascii_uppercase().as_str(), "" | "N" | "0" | "FALSE")
}

#[derive(Debug, Deserialize)]
struct RawNaming {
    #[serde(alias = "LINK_ID")]
    link_id: Cell,
    #[serde(rename = "ST_NAME", alias = "street_name", default)]
    street_name: Option<Cell>,
    #[serde(rename = "L_REFADDR", default)]
    l_refaddr: Option<Cell>,
    #[serde(rename = "L_NREFADDR", default)]
    l_nrefaddr: Option<Cell>,
    #[serde(rename = "L_ADDRSCH", default)]
    l_addrsch: Option<Cell>,
    #[serde(rename = "R_REFADDR", default)]
    r_refaddr: Option<Cell>,
    #[serde(rename = "R_NREFADDR", default)]
    r_nrefaddr: Option<Cell>,
    #[serde(rename = "R_ADDRSCH", default)]
    r_addrsch: Option<Cell>,
}

impl RawNaming {
    fn into_record(self) -> Result<NamingRecord> {
        let link_id = self
            .link_id
            .as_i64()
            .ok_or_else(|| anyhow!("invalid link_id {:?}", self.link_id))?;
        let name = text(&self.street_name).context("missing ST_NAME")?;

        let mut record = NamingRecord::new(link_id, &name);
        record.left = addressing(&self.l_refaddr, &self.l_nrefaddr, &self.l_addrsch);
        record.right = addressing(&self.r_refaddr, &self.r_nrefaddr, &self.r_addrsch);
        Ok(record)
    }
}

/// Identifiers sometimes come through as floats ("1234.0").
fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Load POIs from a CSV file (gzip when the name ends in `.gz`).
pub fn load_pois(path: &Path) -> Result<Vec<Poi>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open POI file {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let columns = PoiColumns::locate(&headers)?;

    let mut pois = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in csv_reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("{}: skipping unreadable row {}: {}", path.display(), line + 1, e);
                skipped += 1;
                continue;
            }
        };
        match columns.parse(&record) {
            Ok(poi) => pois.push(poi),
            Err(e) => {
                debug!("{}: skipping row {}: {}", path.display(), line + 1, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} invalid POI rows", path.display(), skipped);
    }
    info!("Loaded {} POIs from {}", pois.len(), path.display());
    Ok(pois)
}

/// Column positions in a POI CSV header.
struct PoiColumns {
    poi_id: usize,
    link_id: usize,
    side: usize,
    percent: Option<usize>,
    street_name: Option<usize>,
    house_number: Option<usize>,
    fac_type: Option<usize>,
}

impl PoiColumns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Ok(Self {
            poi_id: find("POI_ID").context("Column 'POI_ID' not found")?,
            link_id: find("LINK_ID").context("Column 'LINK_ID' not found")?,
            side: find("POI_ST_SD").context("Column 'POI_ST_SD' not found")?,
            percent: find("PERCFRREF"),
            street_name: find("ST_NAME"),
            house_number: find("ACT_ST_NUM"),
            fac_type: find("FAC_TYPE"),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<Poi> {
        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
        let optional = |idx: Option<usize>| {
            idx.map(field)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let poi_id = parse_id(field(self.poi_id))
            .ok_or_else(|| anyhow!("invalid POI_ID '{}'", field(self.poi_id)))?;
        let link_id = parse_id(field(self.link_id))
            .ok_or_else(|| anyhow!("invalid LINK_ID '{}'", field(self.link_id)))?;
        let side = Side::from_token(field(self.side))
            .ok_or_else(|| anyhow!("invalid POI_ST_SD '{}'", field(self.side)))?;

        Ok(Poi {
            poi_id,
            link_id,
            // Unparseable percentages fall back to the midpoint later
            percent_from_ref: optional(self.percent).and_then(|p| p.parse::<f64>().ok()),
            side,
            street_name: optional(self.street_name),
            house_number: optional(self.house_number),
            fac_type: optional(self.fac_type)
                .and_then(|f| parse_id(&f))
                .and_then(|f| u32::try_from(f).ok()),
        })
    }
}
