//! Final grouping pass: merge reapportioned records into one row per
//! (geography, eligibility tuple).

use ahash::AHashMap;

use super::types::{AggregateRow, EligibilityKey, INDICATOR_COUNT, WeightedRecord};

#[derive(Default)]
struct GroupAcc {
    weight: f64,
    indicators: [f64; INDICATOR_COUNT],
}

/// Group records by (geography, eligibility key), sum weights and indicator
/// contributions, and emit integral rows.
///
/// Summation is commutative, so worker completion order never changes the
/// result. Groups whose weight rounds to zero are dropped; every indicator
/// total is clamped to `[0, group weight]` to absorb accumulated rounding
/// drift. Rows come back sorted by (geography, key) so output files are
/// reproducible, but consumers must treat them as a set.
pub fn normalize(records: impl IntoIterator<Item = WeightedRecord>) -> Vec<AggregateRow> {
    let mut groups: AHashMap<(String, EligibilityKey), GroupAcc> = AHashMap::new();

    for rec in records {
        let acc = groups.entry((rec.geo, rec.key)).or_default();
        acc.weight += rec.weight;
        for (slot, count) in acc.indicators.iter_mut().zip(rec.indicators.iter()) {
            *slot += count;
        }
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .filter_map(|((geo, key), acc)| {
            let weight = acc.weight.round_ties_even() as i64;
            if weight <= 0 {
                return None;
            }
            let indicators = acc
                .indicators
                .map(|v| (v.round_ties_even() as i64).clamp(0, weight));
            Some(AggregateRow {
                geo,
                key,
                weight,
                indicators,
            })
        })
        .collect();

    rows.sort_by(|a, b| a.geo.cmp(&b.geo).then_with(|| a.key.cmp(&b.key)));
    rows
}
