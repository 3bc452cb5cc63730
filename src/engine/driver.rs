//! Data-parallel batch driver for the reapportionment kernel.

use std::time::Instant;

use rayon::prelude::*;

use crate::crosswalk::CrosswalkIndex;
use crate::error::Result;

use super::apply::{ChunkOutput, DropStats, reapportion_chunk};
use super::types::WeightedRecord;

#[derive(Debug, Default)]
pub struct BatchOutput {
    pub records: Vec<WeightedRecord>,
    pub dropped: DropStats,
}

/// Reapportion `records` against `index` across `workers` parallel chunks.
///
/// `workers == 0` means one chunk per thread in the rayon pool. Chunks are
/// contiguous and near-equal; chunk boundaries cannot affect correctness
/// because the kernel is per-record. Output order is unspecified; consumers
/// must treat the result as an unordered multiset, which the aggregation
/// stage's commutative grouping does.
///
/// Fail-fast: the first chunk error fails the whole batch and no partial
/// result is surfaced. There is no I/O inside this stage, so a chunk failure
/// is deterministic and retry cannot help.
pub fn run_parallel(
    records: &[WeightedRecord],
    index: &CrosswalkIndex,
    workers: usize,
) -> Result<BatchOutput> {
    if records.is_empty() {
        return Ok(BatchOutput::default());
    }

    let workers = if workers == 0 {
        rayon::current_num_threads()
    } else {
        workers
    }
    .max(1);
    let chunk_size = records.len().div_ceil(workers).max(1);

    let t0 = Instant::now();
    let chunks: Vec<ChunkOutput> = records
        .par_chunks(chunk_size)
        .map(|chunk| reapportion_chunk(chunk, index))
        .collect::<Result<_>>()?;

    let mut out = BatchOutput::default();
    for chunk in chunks {
        out.records.extend(chunk.records);
        out.dropped.merge(chunk.dropped);
    }

    log::info!(
        "reapportioned {} records -> {} across {} targets in {:.3}s ({} chunks)",
        records.len(),
        out.records.len(),
        index.target_count(),
        t0.elapsed().as_secs_f64(),
        records.len().div_ceil(chunk_size),
    );
    if !out.dropped.is_empty() {
        log::warn!(
            "{} records with no crosswalk entry dropped ({} weight)",
            out.dropped.records,
            out.dropped.weight,
        );
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crosswalk::CrosswalkEntry;
    use crate::geography::GeoFamily;
    use crate::engine::aggregate::normalize;
    use crate::engine::types::fixtures::record_with_indicator;

    fn index() -> CrosswalkIndex {
        let entries = vec![
            ("S0", "T0", 0.5),
            ("S0", "T1", 0.5),
            ("S1", "T1", 1.0),
            ("S2", "T0", 0.25),
            ("S2", "T2", 0.75),
        ];
        CrosswalkIndex::new(
            GeoFamily::County,
            "puma22".into(),
            "county".into(),
            entries
                .into_iter()
                .map(|(s, t, a)| CrosswalkEntry {
                    source: s.to_string(),
                    target: t.to_string(),
                    afact: a,
                })
                .collect(),
        )
    }

    fn sample_records(n: usize) -> Vec<WeightedRecord> {
        (0..n)
            .map(|i| {
                record_with_indicator(
                    &format!("S{}", i % 3),
                    (i % 17) as f64 + 1.0,
                    i % 3,
                    (i % 5) as f64,
                )
            })
            .collect()
    }

    #[test]
    fn parallel_run_matches_serial_kernel() {
        let index = index();
        let records = sample_records(101);

        let serial = reapportion_chunk(&records, &index).unwrap();
        let parallel = run_parallel(&records, &index, 7).unwrap();

        assert_eq!(parallel.dropped, serial.dropped);
        assert_eq!(
            normalize(parallel.records),
            normalize(serial.records),
        );
    }

    #[test]
    fn chunk_order_does_not_affect_the_aggregate() {
        let index = index();
        let records = sample_records(64);
        let mut reversed = records.clone();
        reversed.reverse();

        let a = run_parallel(&records, &index, 4).unwrap();
        let b = run_parallel(&reversed, &index, 4).unwrap();
        assert_eq!(normalize(a.records), normalize(b.records));
    }

    #[test]
    fn worker_count_above_record_count_is_fine() {
        let index = index();
        let records = sample_records(3);
        let out = run_parallel(&records, &index, 64).unwrap();
        assert!(!out.records.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = run_parallel(&[], &index(), 4).unwrap();
        assert!(out.records.is_empty());
        assert!(out.dropped.is_empty());
    }
}
