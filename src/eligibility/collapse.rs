//! Collapse PUMS person/household microdata into one weighted record per
//! household, carrying program-eligibility flags and weight-scaled
//! demographic counts.

use std::io::Read;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use itertools::Itertools;

use crate::error::{ReapportionError, Result};
use crate::engine::{EligibilityKey, INDICATOR_COUNT, WeightedRecord};

use super::types::{HouseholdRow, PersonRow};

pub fn load_person_rows(path: &Path) -> Result<Vec<PersonRow>> {
    read_rows(std::fs::File::open(path)?, path)
}

pub fn load_household_rows(path: &Path) -> Result<Vec<HouseholdRow>> {
    read_rows(std::fs::File::open(path)?, path)
}

pub fn read_rows<T, R>(reader: R, path: impl Into<PathBuf>) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let path = path.into();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for (i, row) in rdr.deserialize::<T>().enumerate() {
        rows.push(row.map_err(|e| {
            ReapportionError::malformed_records(&path, format!("row {}: {e}", i + 2))
        })?);
    }
    Ok(rows)
}

/// Accumulates one household's members.
#[derive(Default)]
struct MemberAcc {
    any_hins4: bool,
    pap_total: f64,
    ssip_total: f64,
    povpip_first: Option<i32>,
    flags: [bool; INDICATOR_COUNT],
}

impl MemberAcc {
    fn absorb(&mut self, person: &PersonRow) {
        // HINS4 is coded 1 = covered, 2 = not covered.
        self.any_hins4 |= person.hins4 == Some(1.0);
        self.pap_total += person.pap.unwrap_or(0.0);
        self.ssip_total += person.ssip.unwrap_or(0.0);
        if self.povpip_first.is_none() {
            self.povpip_first = person.povpip.map(|v| v.round_ties_even() as i32);
        }

        let one = |v: Option<f64>| v == Some(1.0);
        self.flags[0] |= one(person.racaian);
        self.flags[1] |= one(person.racasn);
        self.flags[2] |= one(person.racblk);
        self.flags[3] |= one(person.racnh);
        self.flags[4] |= one(person.racpi);
        self.flags[5] |= one(person.racwht);
        // HISP code 1 means not Hispanic; any higher code is an origin.
        self.flags[6] |= person.hisp.unwrap_or(0.0) > 1.0;
        self.flags[7] |= person.vps.unwrap_or(0.0) > 0.0;
        self.flags[8] |= person.agep.unwrap_or(0.0) >= 60.0;
        self.flags[9] |= one(person.dis);
        self.flags[10] |= person.eng.unwrap_or(0.0) > 1.0;
    }
}

/// Join person rows to their households (many-to-one on serial number) and
/// collapse each household into a single [`WeightedRecord`] keyed by its
/// 7-character PUMA code (2-digit state prefix + 5-digit PUMA).
///
/// Households with zero weight or no person rows are skipped; they would
/// contribute nothing downstream. Demographic flags are maxed across members
/// and then multiplied by the household weight to become absolute count
/// contributions.
pub fn collapse_households(
    persons: &[PersonRow],
    households: &[HouseholdRow],
    state_code: &str,
) -> Vec<WeightedRecord> {
    let state: String = format!("{:0>2}", state_code.trim());

    let mut members: AHashMap<&str, MemberAcc> = AHashMap::new();
    for person in persons {
        members
            .entry(person.serialno.as_str())
            .or_default()
            .absorb(person);
    }

    let mut records = Vec::with_capacity(households.len());
    for household in households
        .iter()
        .sorted_by(|a, b| a.serialno.cmp(&b.serialno))
    {
        let Some(acc) = members.get(household.serialno.as_str()) else {
            continue;
        };
        let weight = household.wgtp.unwrap_or(0.0).round_ties_even();
        if weight <= 0.0 {
            continue;
        }

        // ADJINC carries six implied decimals.
        let adjinc = household.adjinc.unwrap_or(0.0);
        let hh_income =
            (household.hincp.unwrap_or(0.0) * (adjinc / 1_000_000.0)).round_ties_even() as i64;

        let mut indicators = [0.0f64; INDICATOR_COUNT];
        for (slot, flag) in indicators.iter_mut().zip(acc.flags.iter()) {
            if *flag {
                *slot = weight;
            }
        }

        records.push(WeightedRecord {
            geo: format!("{state}{:0>5}", household.puma.trim()),
            key: EligibilityKey {
                povpip: acc.povpip_first.unwrap_or(-1),
                has_pap: acc.pap_total > 0.0,
                has_ssip: acc.ssip_total > 0.0,
                has_hins4: acc.any_hins4,
                // FS is coded 1 = recipient, 2 = not.
                has_snap: household.fs == Some(1.0),
                hh_income,
            },
            weight,
            indicators,
        });
    }
    records
}
