//! Raw PUMS microdata rows, one serde model per file kind. Only the columns
//! the collapse needs are declared; everything else in the survey files is
//! ignored.

use serde::Deserialize;

/// One person row from a PUMS person file (`psam_p*.csv`).
#[derive(Debug, Clone, Deserialize)]
pub struct PersonRow {
    #[serde(rename = "SERIALNO")]
    pub serialno: String,
    /// Medicaid/means-tested coverage: 1 = yes, 2 = no.
    #[serde(rename = "HINS4", default)]
    pub hins4: Option<f64>,
    /// Public-assistance income, dollars.
    #[serde(rename = "PAP", default)]
    pub pap: Option<f64>,
    /// Supplemental Security Income, dollars.
    #[serde(rename = "SSIP", default)]
    pub ssip: Option<f64>,
    /// Income-to-poverty ratio percentage (0-501).
    #[serde(rename = "POVPIP", default)]
    pub povpip: Option<f64>,
    #[serde(rename = "RACAIAN", default)]
    pub racaian: Option<f64>,
    #[serde(rename = "RACASN", default)]
    pub racasn: Option<f64>,
    #[serde(rename = "RACBLK", default)]
    pub racblk: Option<f64>,
    #[serde(rename = "RACNH", default)]
    pub racnh: Option<f64>,
    #[serde(rename = "RACPI", default)]
    pub racpi: Option<f64>,
    #[serde(rename = "RACWHT", default)]
    pub racwht: Option<f64>,
    /// Hispanic origin recode: 1 = not Hispanic, anything above is a
    /// specific origin.
    #[serde(rename = "HISP", default)]
    pub hisp: Option<f64>,
    /// Veteran period of service; present and positive means veteran.
    #[serde(rename = "VPS", default)]
    pub vps: Option<f64>,
    #[serde(rename = "AGEP", default)]
    pub agep: Option<f64>,
    /// Disability recode: 1 = with a disability, 2 = without.
    #[serde(rename = "DIS", default)]
    pub dis: Option<f64>,
    /// English ability: 1 = very well, 2-4 = less than very well.
    #[serde(rename = "ENG", default)]
    pub eng: Option<f64>,
}

/// One household row from a PUMS household file (`psam_h*.csv`).
#[derive(Debug, Clone, Deserialize)]
pub struct HouseholdRow {
    #[serde(rename = "SERIALNO")]
    pub serialno: String,
    #[serde(rename = "PUMA")]
    pub puma: String,
    /// Household survey weight.
    #[serde(rename = "WGTP", default)]
    pub wgtp: Option<f64>,
    /// Household income, unadjusted dollars.
    #[serde(rename = "HINCP", default)]
    pub hincp: Option<f64>,
    /// Income adjustment factor, six implied decimals.
    #[serde(rename = "ADJINC", default)]
    pub adjinc: Option<f64>,
    /// Food stamps / SNAP recipiency: 1 = yes, 2 = no.
    #[serde(rename = "FS", default)]
    pub fs: Option<f64>,
}
