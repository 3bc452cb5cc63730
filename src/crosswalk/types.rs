use ahash::AHashMap;
use smallvec::SmallVec;

use crate::geography::GeoFamily;

/// One raw crosswalk row: the fraction of `source`'s population allocated to
/// `target`. Fractions for a single source need not sum to 1; partial
/// coverage is tolerated end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosswalkEntry {
    pub source: String,
    pub target: String,
    pub afact: f64,
}

/// Per-source fan-out is nearly always 1-3 targets.
pub type TargetList = SmallVec<[(String, f64); 4]>;

/// Immutable mapping for one geography transition. Built once, then shared
/// read-only across all workers.
#[derive(Debug)]
pub struct CrosswalkIndex {
    family: GeoFamily,
    source_col: String,
    target_col: String,
    /// target code -> (source code, afact) pairs, first-seen order.
    forward: AHashMap<String, Vec<(String, f64)>>,
    /// source code -> (target code, afact) pairs; the hot-path view used by
    /// the reapportioner so application stays O(records x fan-out).
    reverse: AHashMap<String, TargetList>,
}

impl CrosswalkIndex {
    pub fn new(
        family: GeoFamily,
        source_col: String,
        target_col: String,
        entries: Vec<CrosswalkEntry>,
    ) -> Self {
        let mut forward: AHashMap<String, Vec<(String, f64)>> = AHashMap::new();
        let mut reverse: AHashMap<String, TargetList> = AHashMap::new();
        for entry in entries {
            forward
                .entry(entry.target.clone())
                .or_default()
                .push((entry.source.clone(), entry.afact));
            reverse
                .entry(entry.source)
                .or_default()
                .push((entry.target, entry.afact));
        }
        Self {
            family,
            source_col,
            target_col,
            forward,
            reverse,
        }
    }

    pub fn family(&self) -> GeoFamily {
        self.family
    }

    pub fn source_col(&self) -> &str {
        &self.source_col
    }

    pub fn target_col(&self) -> &str {
        &self.target_col
    }

    /// Number of distinct target codes.
    pub fn target_count(&self) -> usize {
        self.forward.len()
    }

    pub fn source_count(&self) -> usize {
        self.reverse.len()
    }

    pub fn sources_of(&self, target: &str) -> Option<&[(String, f64)]> {
        self.forward.get(target).map(Vec::as_slice)
    }

    #[inline]
    pub fn targets_of(&self, source: &str) -> Option<&[(String, f64)]> {
        self.reverse.get(source).map(SmallVec::as_slice)
    }

    #[inline]
    pub fn contains_source(&self, source: &str) -> bool {
        self.reverse.contains_key(source)
    }

    /// Sum of allocation fractions for one source; ~1.0 means the crosswalk
    /// covers it fully.
    pub fn coverage_of(&self, source: &str) -> f64 {
        self.reverse
            .get(source)
            .map(|targets| targets.iter().map(|(_, afact)| afact).sum())
            .unwrap_or(0.0)
    }
}
