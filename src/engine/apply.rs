//! The reapportionment kernel: redistribute weighted records from their
//! source geography across the crosswalk's target geographies.
//!
//! Weight math follows the population-count convention: rescaled weights are
//! rounded half-to-even to whole units, and each indicator count is re-derived
//! from its per-unit fraction under the new weight, then clamped back into
//! `[0, weight']` so rounding can never produce a count exceeding the
//! population it describes.

use crate::crosswalk::CrosswalkIndex;
use crate::error::{ReapportionError, Result};

use super::types::{INDICATOR_COUNT, WeightedRecord};

/// Records whose source geography has no crosswalk entry are dropped from the
/// output but tallied here, so a run can report how much weight fell through
/// an incomplete crosswalk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DropStats {
    pub records: u64,
    pub weight: f64,
}

impl DropStats {
    pub fn merge(&mut self, other: DropStats) {
        self.records += other.records;
        self.weight += other.weight;
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

#[derive(Debug, Default)]
pub struct ChunkOutput {
    pub records: Vec<WeightedRecord>,
    pub dropped: DropStats,
}

/// Reapportion one chunk of records against a shared immutable index.
///
/// A single source record fans out into one output record per
/// (source, target) pairing it participates in; that is expected, not an
/// error, since one PUMA can span several counties. Inputs are never mutated.
pub fn reapportion_chunk(
    records: &[WeightedRecord],
    index: &CrosswalkIndex,
) -> Result<ChunkOutput> {
    let mut out = ChunkOutput {
        records: Vec::with_capacity(records.len()),
        dropped: DropStats::default(),
    };

    for rec in records {
        let Some(targets) = index.targets_of(&rec.geo) else {
            out.dropped.records += 1;
            out.dropped.weight += rec.weight;
            continue;
        };

        for (target, afact) in targets {
            let scaled = rec.weight * afact;
            if !scaled.is_finite() {
                return Err(ReapportionError::ChunkFailure(format!(
                    "non-finite weight for source {} -> {target} (weight {}, afact {afact})",
                    rec.geo, rec.weight
                )));
            }
            let new_weight = scaled.round_ties_even();

            // Re-derive each per-unit indicator fraction under the new
            // weight. A zero-weight source contributes zero counts.
            let mut indicators = [0.0f64; INDICATOR_COUNT];
            if rec.weight > 0.0 && new_weight > 0.0 {
                for (slot, &count) in indicators.iter_mut().zip(rec.indicators.iter()) {
                    let per_unit = count / rec.weight;
                    *slot = (per_unit * new_weight)
                        .round_ties_even()
                        .clamp(0.0, new_weight);
                }
            }

            out.records.push(WeightedRecord {
                geo: target.clone(),
                key: rec.key.clone(),
                weight: new_weight,
                indicators,
            });
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crosswalk::CrosswalkEntry;
    use crate::geography::GeoFamily;
    use crate::engine::types::fixtures::{record, record_with_indicator};

    fn index(entries: &[(&str, &str, f64)]) -> CrosswalkIndex {
        CrosswalkIndex::new(
            GeoFamily::County,
            "puma22".into(),
            "county".into(),
            entries
                .iter()
                .map(|(s, t, a)| CrosswalkEntry {
                    source: s.to_string(),
                    target: t.to_string(),
                    afact: *a,
                })
                .collect(),
        )
    }

    #[test]
    fn splits_weight_and_indicators_across_targets() {
        let index = index(&[("P1", "T1", 0.6), ("P1", "T2", 0.4)]);
        let input = vec![record_with_indicator("P1", 100.0, 1, 30.0)];

        let out = reapportion_chunk(&input, &index).unwrap();
        assert_eq!(out.records.len(), 2);
        assert!(out.dropped.is_empty());

        let t1 = out.records.iter().find(|r| r.geo == "T1").unwrap();
        assert_eq!(t1.weight, 60.0);
        assert_eq!(t1.indicators[1], 18.0);

        let t2 = out.records.iter().find(|r| r.geo == "T2").unwrap();
        assert_eq!(t2.weight, 40.0);
        assert_eq!(t2.indicators[1], 12.0);
    }

    #[test]
    fn partial_coverage_yields_only_covered_weight() {
        let index = index(&[("P2", "T1", 0.5)]);
        let out = reapportion_chunk(&[record("P2", 50.0)], &index).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].geo, "T1");
        assert_eq!(out.records[0].weight, 25.0);
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn orphaned_source_produces_nothing_but_is_tallied() {
        let index = index(&[("P1", "T1", 1.0)]);
        let out = reapportion_chunk(&[record("P9", 10.0)], &index).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.dropped.records, 1);
        assert_eq!(out.dropped.weight, 10.0);
    }

    #[test]
    fn weight_rounds_half_to_even() {
        let index = index(&[("P1", "T1", 0.5)]);
        // 5 * 0.5 = 2.5 -> 2, 3 * 0.5 = 1.5 -> 2
        let out = reapportion_chunk(&[record("P1", 5.0)], &index).unwrap();
        assert_eq!(out.records[0].weight, 2.0);
        let out = reapportion_chunk(&[record("P1", 3.0)], &index).unwrap();
        assert_eq!(out.records[0].weight, 2.0);
    }

    #[test]
    fn zero_weight_source_contributes_zero_counts() {
        let index = index(&[("P1", "T1", 0.7)]);
        let out = reapportion_chunk(&[record_with_indicator("P1", 0.0, 0, 0.0)], &index).unwrap();
        assert_eq!(out.records[0].weight, 0.0);
        assert_eq!(out.records[0].indicators, [0.0; INDICATOR_COUNT]);
    }

    #[test]
    fn indicator_never_exceeds_new_weight() {
        let index = index(&[("P1", "T1", 0.33)]);
        // Saturated indicator: count == weight before reallocation.
        let out = reapportion_chunk(&[record_with_indicator("P1", 10.0, 3, 10.0)], &index).unwrap();
        let rec = &out.records[0];
        assert_eq!(rec.weight, 3.0);
        assert!(rec.indicators[3] <= rec.weight);
        assert_eq!(rec.indicators[3], 3.0);
    }

    #[test]
    fn fully_covered_source_conserves_weight_within_rounding() {
        let index = index(&[("P1", "T1", 0.21), ("P1", "T2", 0.33), ("P1", "T3", 0.46)]);
        let out = reapportion_chunk(&[record("P1", 997.0)], &index).unwrap();
        let total: f64 = out.records.iter().map(|r| r.weight).sum();
        assert!((total - 997.0).abs() <= out.records.len() as f64);
    }
}
