//! House number range and parity validation.

use super::ResolvedPoi;
use crate::models::{
    AddressScheme, Finding, FindingKind, LegalAccess, Poi, Side, SideAddressing, Subject,
    TileBundle,
};

/// Result of validating one POI address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressVerdict {
    pub kind: FindingKind,
    pub description: String,
    pub suggestion: String,
}

impl AddressVerdict {
    fn new(kind: FindingKind, description: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Everything the address rules look at for one POI.
#[derive(Debug, Clone, Copy)]
pub struct AddressInput<'a> {
    pub has_geometry: bool,
    pub side: Side,
    pub house_number: Option<&'a str>,
    pub street_name: Option<&'a str>,
    pub addressing: Option<&'a SideAddressing>,
    pub legal: LegalAccess,
}

impl<'a> AddressInput<'a> {
    pub fn for_poi(bundle: &'a TileBundle, poi: &'a Poi, has_geometry: bool) -> Self {
        Self {
            has_geometry,
            side: poi.side,
            house_number: poi.house_number(),
            street_name: poi.street_name(),
            addressing: bundle.addressing_for(poi),
            legal: bundle
                .link(poi.link_id)
                .map(|link| link.legal)
                .unwrap_or_default(),
        }
    }
}

/// Apply the address rules in precedence order:
/// missing geometry, missing address, range and parity, legal exception.
pub fn validate_address(input: &AddressInput<'_>) -> AddressVerdict {
    if !input.has_geometry {
        return AddressVerdict::new(
            FindingKind::NotExists,
            "POI could not be placed on its link",
            "No coordinates",
        );
    }

    let (Some(number), Some(_)) = (input.house_number, input.street_name) else {
        return AddressVerdict::new(FindingKind::AddressOk, "No address to validate", "");
    };

    let Err(violation) = check_range(number, input.addressing) else {
        return AddressVerdict::new(
            FindingKind::AddressOk,
            format!("{} is valid for side {}", number, input.side),
            "",
        );
    };

    if input.legal.any() {
        return AddressVerdict::new(
            FindingKind::LegalException,
            format!("{} (tolerated)", violation),
            "Legal access flag present",
        );
    }

    AddressVerdict::new(
        FindingKind::OutOfRange,
        format!("House number {} is not valid for side {}", number, input.side),
        violation,
    )
}

/// `Ok` when `number` is inside the range and matches the parity scheme,
/// otherwise a message citing the violated bounds.
fn check_range(number: &str, addressing: Option<&SideAddressing>) -> Result<(), String> {
    let low_raw = addressing.and_then(|a| a.low.as_deref()).unwrap_or("?");
    let high_raw = addressing.and_then(|a| a.high.as_deref()).unwrap_or("?");
    let bounds = format!("{}-{}", low_raw.trim(), high_raw.trim());

    let (Some(low), Some(high), Some(num)) = (
        parse_number(low_raw),
        parse_number(high_raw),
        parse_number(number),
    ) else {
        return Err(format!("{} cannot be compared with {}", number, bounds));
    };

    let (lo, hi) = (low.min(high), low.max(high));
    if !(lo <= num && num <= hi) {
        return Err(format!("{} outside {}", number, bounds));
    }

    match addressing.map(|a| a.scheme).unwrap_or_default() {
        AddressScheme::Even if num.rem_euclid(2.0) != 0.0 => {
            Err(format!("{} is not even as required for {}", number, bounds))
        }
        AddressScheme::Odd if num.rem_euclid(2.0) != 1.0 => {
            Err(format!("{} is not odd as required for {}", number, bounds))
        }
        _ => Ok(()),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validate the address of every POI in the tile.
///
/// Emits one finding per POI, including the ones that pass (`OK`).
pub fn check_addresses(bundle: &TileBundle, resolved: &[ResolvedPoi<'_>]) -> Vec<Finding> {
    resolved
        .iter()
        .map(|entry| {
            let poi = entry.poi;
            let verdict =
                validate_address(&AddressInput::for_poi(bundle, poi, entry.position.is_ok()));
            let mut finding = Finding::new(
                bundle.tile_id(),
                Subject::Poi {
                    poi_id: poi.poi_id,
                    link_id: poi.link_id,
                },
                verdict.kind,
                verdict.description,
                verdict.suggestion,
            );
            if let Ok(position) = &entry.position {
                finding = finding.with_point(position.point);
            }
            if let Some(name) = poi.street_name() {
                finding = finding.with_street_name(name);
            }
            if let Some(number) = poi.house_number() {
                finding = finding.with_house_number(number);
            }
            finding
        })
        .collect()
}
