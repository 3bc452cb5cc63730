//! Geography families recognized in crosswalk tables.
//!
//! Crosswalk exports name their target column after the geography family
//! ("puma22", "county", "tract10", ...). Resolution walks a fixed priority
//! list and takes the first family whose token appears as a substring of any
//! column name. The ordering is a deliberate tie-break contract: joins pick
//! the wrong resolution level if it changes.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoFamily {
    Zcta,
    County,
    MetroDivision,
    Puma,
    Tract,
    CongressionalDistrict,
    SchoolDistrictBest,
    SchoolDistrictElementary,
    SchoolDistrictSecondary,
    SchoolDistrictUnified,
    State,
}

impl GeoFamily {
    /// Fixed resolution priority. County is listed before tract but yields to
    /// it: a table that carries both resolves to the tract column (see
    /// [`GeoFamily::resolve`]).
    pub const RESOLUTION_ORDER: [GeoFamily; 11] = [
        GeoFamily::Zcta,
        GeoFamily::County,
        GeoFamily::MetroDivision,
        GeoFamily::Puma,
        GeoFamily::Tract,
        GeoFamily::CongressionalDistrict,
        GeoFamily::SchoolDistrictBest,
        GeoFamily::SchoolDistrictElementary,
        GeoFamily::SchoolDistrictSecondary,
        GeoFamily::SchoolDistrictUnified,
        GeoFamily::State,
    ];

    /// Column-name token this family matches.
    pub fn token(self) -> &'static str {
        match self {
            GeoFamily::Zcta => "zcta",
            GeoFamily::County => "county",
            GeoFamily::MetroDivision => "metdiv",
            GeoFamily::Puma => "puma",
            GeoFamily::Tract => "tract",
            GeoFamily::CongressionalDistrict => "cd",
            GeoFamily::SchoolDistrictBest => "sdbest",
            GeoFamily::SchoolDistrictElementary => "sdelem",
            GeoFamily::SchoolDistrictSecondary => "sdsec",
            GeoFamily::SchoolDistrictUnified => "sduni",
            GeoFamily::State => "state",
        }
    }

    /// Fixed zero-padded width of codes in this family. PUMA and school
    /// district codes carry a 2-digit state prefix; tract codes carry the
    /// 5-digit county prefix.
    pub fn code_width(self) -> usize {
        match self {
            GeoFamily::Zcta => 5,
            GeoFamily::County => 5,
            GeoFamily::MetroDivision => 5,
            GeoFamily::Puma => 7,
            GeoFamily::Tract => 11,
            GeoFamily::CongressionalDistrict => 4,
            GeoFamily::SchoolDistrictBest => 7,
            GeoFamily::SchoolDistrictElementary => 7,
            GeoFamily::SchoolDistrictSecondary => 7,
            GeoFamily::SchoolDistrictUnified => 7,
            GeoFamily::State => 2,
        }
    }

    pub fn matches_column(self, column: &str) -> bool {
        column.to_ascii_lowercase().contains(self.token())
    }

    /// Resolve the target-geography column among `columns` (the source column
    /// must already be excluded by the caller). Returns the family and the
    /// matched column name.
    pub fn resolve(columns: &[&str]) -> Option<(GeoFamily, String)> {
        let has_tract = columns
            .iter()
            .any(|c| GeoFamily::Tract.matches_column(c));
        for family in GeoFamily::RESOLUTION_ORDER {
            // A county column next to a tract column is the coarser half of a
            // tract identifier, not the join target.
            if family == GeoFamily::County && has_tract {
                continue;
            }
            if let Some(col) = columns.iter().find(|c| family.matches_column(c)) {
                return Some((family, (*col).to_string()));
            }
        }
        None
    }
}

/// Left-pad a geography code with zeros to its family width. Codes wider than
/// the family width are left untouched.
pub fn pad_code(code: &str, family: GeoFamily) -> String {
    let code = code.trim();
    let width = family.code_width();
    if code.len() >= width {
        code.to_string()
    } else {
        format!("{code:0>width$}")
    }
}
