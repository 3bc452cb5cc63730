//! Record-table I/O: weighted eligibility sheets in, aggregated geography
//! tables out. Geography codes stay strings throughout.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ReapportionError, Result};
use crate::geography::{GeoFamily, pad_code};

use super::types::{AggregateRow, EligibilityKey, INDICATOR_COUNT, INDICATOR_LABELS, WeightedRecord};

const WEIGHT_COL: &str = "WGTP";
const POVPIP_COL: &str = "POVPIP";
const FLAG_COLS: [&str; 4] = ["has_pap", "has_ssip", "has_hins4", "has_snap"];
const INCOME_COL: &str = "HH Income";

pub fn load_weighted_records(path: &Path, geo_hint: &str) -> Result<Vec<WeightedRecord>> {
    let file = std::fs::File::open(path)?;
    read_weighted_records(file, geo_hint, path)
}

/// Read a weighted-record table. The geography column is located by
/// `geo_hint` substring (sheets are keyed "puma12", "puma22", "county", ...
/// depending on the pipeline stage); every other column is located by its
/// exact header.
pub fn read_weighted_records<R: Read>(
    reader: R,
    geo_hint: &str,
    path: impl Into<PathBuf>,
) -> Result<Vec<WeightedRecord>> {
    let path = path.into();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns: Vec<&str> = headers.iter().collect();

    let hint = geo_hint.to_ascii_lowercase();
    let geo_idx = columns
        .iter()
        .position(|c| c.to_ascii_lowercase().contains(&hint))
        .ok_or_else(|| {
            ReapportionError::malformed_records(
                &path,
                format!("no geography column matches `{geo_hint}`"),
            )
        })?;

    let col = |name: &str| -> Result<usize> {
        columns.iter().position(|c| *c == name).ok_or_else(|| {
            ReapportionError::malformed_records(&path, format!("missing column `{name}`"))
        })
    };
    let weight_idx = col(WEIGHT_COL)?;
    let povpip_idx = col(POVPIP_COL)?;
    let flag_idx = [
        col(FLAG_COLS[0])?,
        col(FLAG_COLS[1])?,
        col(FLAG_COLS[2])?,
        col(FLAG_COLS[3])?,
    ];
    let income_idx = col(INCOME_COL)?;
    let mut indicator_idx = [0usize; INDICATOR_COUNT];
    for (slot, label) in indicator_idx.iter_mut().zip(INDICATOR_LABELS.iter()) {
        *slot = col(label)?;
    }

    let field = |row: &csv::StringRecord, idx: usize| -> String {
        row.get(idx).unwrap_or("").trim().to_string()
    };
    let number = |row: &csv::StringRecord, idx: usize, row_no: usize| -> Result<f64> {
        let raw = row.get(idx).unwrap_or("").trim();
        raw.parse::<f64>().map_err(|_| {
            ReapportionError::malformed_records(
                &path,
                format!(
                    "row {row_no}: unparsable value `{raw}` in column `{}`",
                    columns[idx]
                ),
            )
        })
    };

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let row_no = i + 2;

        let weight = number(&row, weight_idx, row_no)?;
        if weight < 0.0 {
            return Err(ReapportionError::malformed_records(
                &path,
                format!("row {row_no}: negative weight {weight}"),
            ));
        }
        let mut indicators = [0.0f64; INDICATOR_COUNT];
        for (slot, idx) in indicators.iter_mut().zip(indicator_idx.iter()) {
            *slot = number(&row, *idx, row_no)?;
        }

        records.push(WeightedRecord {
            geo: field(&row, geo_idx),
            key: EligibilityKey {
                povpip: number(&row, povpip_idx, row_no)? as i32,
                has_pap: number(&row, flag_idx[0], row_no)? != 0.0,
                has_ssip: number(&row, flag_idx[1], row_no)? != 0.0,
                has_hins4: number(&row, flag_idx[2], row_no)? != 0.0,
                has_snap: number(&row, flag_idx[3], row_no)? != 0.0,
                hh_income: number(&row, income_idx, row_no)?.round_ties_even() as i64,
            },
            weight,
            indicators,
        });
    }

    Ok(records)
}

/// Write an aggregated table atomically: the full file lands under a `.tmp`
/// name first and is renamed into place only once every row is flushed, so a
/// failed run never leaves a partial output behind.
pub fn write_aggregate_csv(
    path: &Path,
    geo_col: &str,
    family: GeoFamily,
    rows: &[AggregateRow],
) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    let result = write_rows(&tmp, geo_col, family, rows);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
        return result;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn write_rows(tmp: &Path, geo_col: &str, family: GeoFamily, rows: &[AggregateRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(tmp)?;

    let mut header: Vec<&str> = vec![geo_col, WEIGHT_COL, POVPIP_COL];
    header.extend(FLAG_COLS);
    header.extend(INDICATOR_LABELS);
    header.push(INCOME_COL);
    wtr.write_record(&header)?;

    for row in rows {
        let mut out: Vec<String> = Vec::with_capacity(header.len());
        out.push(pad_code(&row.geo, family));
        out.push(row.weight.to_string());
        out.push(row.key.povpip.to_string());
        for flag in [
            row.key.has_pap,
            row.key.has_ssip,
            row.key.has_hins4,
            row.key.has_snap,
        ] {
            out.push(if flag { "1" } else { "0" }.to_string());
        }
        for count in row.indicators {
            out.push(count.to_string());
        }
        out.push(row.key.hh_income.to_string());
        wtr.write_record(&out)?;
    }

    wtr.flush()?;
    Ok(())
}
