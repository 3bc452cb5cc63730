//! Crosswalk CSV parsing and index construction.
//!
//! Geography codes are read as strings and never parsed numerically; FIPS
//! codes keep their leading zeros.

use std::io::Read;
use std::path::{Path, PathBuf};

use ahash::AHashSet;

use crate::error::{ReapportionError, Result};
use crate::geography::{GeoFamily, pad_code};

use super::types::{CrosswalkEntry, CrosswalkIndex};

const AFACT_COL: &str = "afact";

pub fn load_crosswalk(path: &Path, source_hint: &str) -> Result<CrosswalkIndex> {
    let file = std::fs::File::open(path)?;
    build_index(file, source_hint, path)
}

/// Parse crosswalk rows from `reader` and build the index for the transition
/// named by `source_hint` (a substring of the source-geography column, e.g.
/// "puma12"). `path` is only used to label errors.
pub fn build_index<R: Read>(
    reader: R,
    source_hint: &str,
    path: impl Into<PathBuf>,
) -> Result<CrosswalkIndex> {
    let path = path.into();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns: Vec<&str> = headers.iter().collect();

    let hint = source_hint.to_ascii_lowercase();
    let source_idx = columns
        .iter()
        .position(|c| c.to_ascii_lowercase().contains(&hint))
        .ok_or_else(|| {
            ReapportionError::malformed_crosswalk(
                &path,
                format!("no column matches source hint `{source_hint}`"),
            )
        })?;
    let source_col = columns[source_idx].to_string();

    let afact_idx = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(AFACT_COL))
        .ok_or_else(|| {
            ReapportionError::malformed_crosswalk(&path, "allocation-fraction column `afact` absent")
        })?;

    let remaining: Vec<&str> = columns
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != source_idx && i != afact_idx)
        .map(|(_, c)| *c)
        .collect();
    let (family, target_col) = GeoFamily::resolve(&remaining).ok_or_else(|| {
        ReapportionError::malformed_crosswalk(&path, "no target-geography column recognized")
    })?;
    let target_idx = columns
        .iter()
        .position(|c| **c == target_col)
        .expect("resolved column comes from the header");

    let mut entries: Vec<CrosswalkEntry> = Vec::new();
    let mut seen: AHashSet<(String, String)> = AHashSet::new();
    for (row_idx, row) in rdr.records().enumerate() {
        let row = row?;
        let source = row.get(source_idx).unwrap_or("").trim();
        let target = row.get(target_idx).unwrap_or("").trim();
        let afact_raw = row.get(afact_idx).unwrap_or("").trim();

        let afact = match afact_raw.parse::<f64>() {
            Ok(v) => v,
            // Geocorr exports carry a human-readable label row right under
            // the header; tolerate it, nothing else.
            Err(_) if row_idx == 0 => continue,
            Err(_) => {
                return Err(ReapportionError::malformed_crosswalk(
                    &path,
                    format!("row {}: unparsable afact `{afact_raw}`", row_idx + 2),
                ));
            }
        };
        if !afact.is_finite() || !(0.0..=1.0).contains(&afact) {
            return Err(ReapportionError::malformed_crosswalk(
                &path,
                format!("row {}: afact {afact} outside [0, 1]", row_idx + 2),
            ));
        }
        if source.is_empty() || target.is_empty() {
            return Err(ReapportionError::malformed_crosswalk(
                &path,
                format!("row {}: empty geography code", row_idx + 2),
            ));
        }

        let target = pad_code(target, family);
        if !seen.insert((source.to_string(), target.clone())) {
            // Duplicate (source, target) pairs keep the first fraction seen.
            log::debug!(
                "{}: duplicate pair ({source}, {target}) at row {}; keeping first afact",
                path.display(),
                row_idx + 2
            );
            continue;
        }
        entries.push(CrosswalkEntry {
            source: source.to_string(),
            target,
            afact,
        });
    }

    let pairs = entries.len();
    let index = CrosswalkIndex::new(family, source_col, target_col, entries);
    log::info!(
        "crosswalk {}: {} -> {} ({:?}), {} pairs, {} targets",
        path.display(),
        index.source_col(),
        index.target_col(),
        family,
        pairs,
        index.target_count(),
    );

    Ok(index)
}
