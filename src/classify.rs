use crate::types::{AreaType, UrbanRural};

// ===== AUTHORITATIVE NAME RULES =====
// Substrings of the official classification name, checked in order.
// The first hit decides the display label.
const RUC_NAME_RULES: &[(&str, AreaType)] = &[
    ("Urban: Majority nearer", AreaType::UrbanNearMajorCity),
    ("Urban: Majority further", AreaType::UrbanIsolated),
    ("Intermediate urban", AreaType::UrbanIntermediate),
    ("Majority rural: Majority further", AreaType::RuralSparse),
    ("Majority rural: Majority nearer", AreaType::RuralIntermediate),
    ("Intermediate rural", AreaType::RuralIntermediate),
];

// ===== NAME FALLBACK LISTS =====
/// Authorities treated as major cities when the reference has no row for them
const MAJOR_CITY_AUTHORITIES: &[&str] = &[
    // Scotland
    "City of Edinburgh",
    "Glasgow City",
    "Aberdeen City",
    "Dundee City",
];

/// Urban centres whose names carry no "City" marker
const URBAN_TOWNS: &[&str] = &["Aberdeen", "Stirling", "Perth"];

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    /// Backed by a row of the official reference table
    Authoritative,
    /// Inferred from the authority name alone
    Heuristic,
}

/// Classification decided for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaClassification {
    pub area_type: AreaType,
    pub urban_rural: UrbanRural,
    pub source: ClassificationSource,
}

impl AreaClassification {
    fn authoritative(area_type: AreaType, flag: Option<&str>) -> Self {
        let urban_rural = flag
            .and_then(UrbanRural::parse)
            .unwrap_or_else(|| implied_flag(area_type));
        Self {
            area_type,
            urban_rural,
            source: ClassificationSource::Authoritative,
        }
    }

    fn heuristic(area_type: AreaType) -> Self {
        Self {
            area_type,
            urban_rural: implied_flag(area_type),
            source: ClassificationSource::Heuristic,
        }
    }
}

/// Back-fill the binary flag from the display label
fn implied_flag(area_type: AreaType) -> UrbanRural {
    if area_type.is_urban() {
        UrbanRural::Urban
    } else {
        UrbanRural::Rural
    }
}

/// Classify a local authority from its joined reference fields.
///
/// With an official classification name, the ordered substring rules decide
/// the label, then the raw urban/rural flag, then `Unknown`. Without one,
/// the label is inferred from the authority name; names outside the known
/// urban lists default to `Rural (intermediate)`, an approximation that
/// overstates rurality for some unmatched areas.
///
/// Never fails: every input yields one label and one binary flag.
pub fn classify_authority(
    ruc_name: Option<&str>,
    flag: Option<&str>,
    authority: &str,
) -> AreaClassification {
    if let Some(name) = ruc_name {
        for (needle, area_type) in RUC_NAME_RULES {
            if name.contains(needle) {
                return AreaClassification::authoritative(*area_type, flag);
            }
        }
        let area_type = match flag.and_then(UrbanRural::parse) {
            Some(UrbanRural::Urban) => AreaType::Urban,
            Some(UrbanRural::Rural) => AreaType::Rural,
            None => AreaType::Unknown,
        };
        return AreaClassification::authoritative(area_type, flag);
    }
    AreaClassification::heuristic(classify_by_name(authority))
}

/// Name-based fallback for authorities missing from the reference table
fn classify_by_name(authority: &str) -> AreaType {
    if MAJOR_CITY_AUTHORITIES.contains(&authority) {
        return AreaType::UrbanMajorCity;
    }
    // Northern Ireland
    if authority == "Belfast" {
        return AreaType::UrbanMajorCity;
    }
    if authority.contains("City") || URBAN_TOWNS.contains(&authority) {
        return AreaType::UrbanNearMajorCity;
    }
    AreaType::RuralIntermediate
}

/// Simplify the official classification code for display.
///
/// Returns `None` when the code is absent, so rows outside England and
/// Wales keep an empty display context.
pub fn classify_from_code(code: Option<&str>, ruc_name: Option<&str>) -> Option<AreaType> {
    let code = code?;
    let name = ruc_name.unwrap_or("");
    let area_type = if code.starts_with('U') {
        if name.contains("Majority nearer") {
            AreaType::UrbanNearMajorCity
        } else {
            AreaType::UrbanIsolated
        }
    } else if code.starts_with('R') {
        if name.contains("Majority rural") {
            AreaType::RuralSparse
        } else {
            AreaType::RuralIntermediate
        }
    } else {
        AreaType::Unknown
    };
    Some(area_type)
}
