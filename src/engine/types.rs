use serde::{Deserialize, Serialize};

pub const INDICATOR_COUNT: usize = 11;

/// Output column labels for the demographic indicator counts, in record
/// order. These match the published eligibility sheets.
pub const INDICATOR_LABELS: [&str; INDICATOR_COUNT] = [
    "American Indian and Alaska Native",
    "Asian",
    "Black or African American",
    "Native Hawaiian",
    "Pacific Islander",
    "White",
    "Hispanic or Latino",
    "Veteran",
    "Elderly",
    "DIS",
    "English less than very well",
];

/// The categorical eligibility tuple a household is grouped by: poverty-ratio
/// bucket, program-participation flags, and adjusted household income.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EligibilityKey {
    pub povpip: i32,
    pub has_pap: bool,
    pub has_ssip: bool,
    pub has_hins4: bool,
    pub has_snap: bool,
    pub hh_income: i64,
}

/// One collapsed household cluster: a geography code, the eligibility tuple,
/// a survey weight, and weight-scaled demographic counts.
///
/// Invariants: `weight >= 0`; every indicator count is in `[0, weight]`. The
/// indicator counts are absolute contributions (per-unit flag times weight),
/// so they stay meaningful under fractional reallocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRecord {
    pub geo: String,
    pub key: EligibilityKey,
    pub weight: f64,
    pub indicators: [f64; INDICATOR_COUNT],
}

/// One row of the final per-geography table: integral weight and indicator
/// totals for a (geography, eligibility tuple) group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub geo: String,
    pub key: EligibilityKey,
    pub weight: i64,
    pub indicators: [i64; INDICATOR_COUNT],
}

impl AggregateRow {
    /// View an aggregated row as a weighted record again, for chaining one
    /// geography transition into the next.
    pub fn into_record(self) -> WeightedRecord {
        WeightedRecord {
            geo: self.geo,
            key: self.key,
            weight: self.weight as f64,
            indicators: self.indicators.map(|v| v as f64),
        }
    }
}
