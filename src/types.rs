/// Binary urban/rural marker carried on every enriched output row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrbanRural {
    Urban,
    Rural,
}

impl UrbanRural {
    /// Parse a flag value from the reference table
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Urban" => Some(UrbanRural::Urban),
            "Rural" => Some(UrbanRural::Rural),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrbanRural::Urban => "Urban",
            UrbanRural::Rural => "Rural",
        }
    }
}

/// Display category assigned to a small area or local authority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaType {
    UrbanMajorCity,
    UrbanNearMajorCity,
    UrbanIsolated,
    UrbanIntermediate,
    RuralSparse,
    RuralIntermediate,
    /// Bare flag carried through when no rule matched the classification name
    Urban,
    Rural,
    Unknown,
}

impl AreaType {
    /// Label written to the output tables
    pub fn label(&self) -> &'static str {
        match self {
            AreaType::UrbanMajorCity => "Urban (major city)",
            AreaType::UrbanNearMajorCity => "Urban (near major city)",
            AreaType::UrbanIsolated => "Urban (isolated)",
            AreaType::UrbanIntermediate => "Urban (intermediate)",
            AreaType::RuralSparse => "Rural (sparse)",
            AreaType::RuralIntermediate => "Rural (intermediate)",
            AreaType::Urban => "Urban",
            AreaType::Rural => "Rural",
            AreaType::Unknown => "Unknown",
        }
    }

    /// Whether the label counts as urban when back-filling the binary flag
    pub fn is_urban(&self) -> bool {
        matches!(
            self,
            AreaType::UrbanMajorCity
                | AreaType::UrbanNearMajorCity
                | AreaType::UrbanIsolated
                | AreaType::UrbanIntermediate
                | AreaType::Urban
        )
    }
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;
