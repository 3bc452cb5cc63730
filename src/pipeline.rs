//! Staged pipeline: chain geography transitions over per-state eligibility
//! sheets, writing one aggregated table per stage.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::crosswalk::{CrosswalkIndex, load_crosswalk};
use crate::error::Result;
use crate::engine::{
    AggregateRow, DropStats, WeightedRecord, load_weighted_records, normalize, run_parallel,
    write_aggregate_csv,
};

/// What one transition did, for logging and tests.
#[derive(Debug)]
pub struct StageReport {
    pub source_hint: String,
    pub target_col: String,
    pub records_in: usize,
    pub rows_out: usize,
    pub dropped: DropStats,
}

/// One reapportionment stage: batch-apply the index, then aggregate.
pub fn run_stage(
    records: &[WeightedRecord],
    index: &CrosswalkIndex,
    workers: usize,
) -> Result<(Vec<AggregateRow>, DropStats)> {
    let batch = run_parallel(records, index, workers)?;
    Ok((normalize(batch.records), batch.dropped))
}

/// Load a record table, push it through one crosswalk, and write the
/// aggregated result. Used directly by the `apply` subcommand.
pub fn run_transition(
    records_path: &Path,
    crosswalk_path: &Path,
    source_hint: &str,
    out_path: &Path,
    workers: usize,
) -> Result<StageReport> {
    let index = load_crosswalk(crosswalk_path, source_hint)?;
    let records = load_weighted_records(records_path, source_hint)?;
    let records_in = records.len();

    log::info!(
        "transition {} -> {}: {} records from {}",
        source_hint,
        index.target_col(),
        records_in,
        records_path.display(),
    );
    let (rows, dropped) = run_stage(&records, &index, workers)?;
    write_aggregate_csv(out_path, index.target_col(), index.family(), &rows)?;

    Ok(StageReport {
        source_hint: source_hint.to_string(),
        target_col: index.target_col().to_string(),
        records_in,
        rows_out: rows.len(),
        dropped,
    })
}

/// The standard chain over every state sheet: legacy PUMA -> current PUMA via
/// the equivalency crosswalk, then current PUMA -> county. Each state writes
/// `<stem>-puma22.csv` and `<stem>-county.csv` into the output directory; a
/// failed stage aborts the run and leaves no partial file behind.
pub fn run_chain(config: &Config) -> Result<()> {
    let equivalency = if config.legacy_puma_sheets {
        Some(load_crosswalk(&config.puma_equivalency, "puma12")?)
    } else {
        None
    };
    let county = load_crosswalk(&config.puma_to_county, "puma22")?;

    let mut sheets: Vec<_> = std::fs::read_dir(&config.sheets_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| config.wants_state(stem))
        })
        .collect();
    sheets.sort();

    std::fs::create_dir_all(&config.output_dir)?;

    let pb = ProgressBar::new(sheets.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} states {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut total_dropped = DropStats::default();
    for sheet in &sheets {
        let stem = sheet
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sheet")
            .to_string();
        pb.set_message(stem.clone());

        let records = if let Some(equivalency) = &equivalency {
            let records = load_weighted_records(sheet, "puma12")?;
            let (rows, dropped) = run_stage(&records, equivalency, config.workers)?;
            total_dropped.merge(dropped);
            let out = config.output_dir.join(format!("{stem}-puma22.csv"));
            write_aggregate_csv(&out, equivalency.target_col(), equivalency.family(), &rows)?;
            rows.into_iter().map(AggregateRow::into_record).collect()
        } else {
            load_weighted_records(sheet, "puma22")?
        };

        let (rows, dropped) = run_stage(&records, &county, config.workers)?;
        total_dropped.merge(dropped);
        let out = config.output_dir.join(format!("{stem}-county.csv"));
        write_aggregate_csv(&out, county.target_col(), county.family(), &rows)?;

        pb.inc(1);
    }
    pb.finish_and_clear();

    log::info!("chain complete: {} state sheets", sheets.len());
    if !total_dropped.is_empty() {
        log::warn!(
            "chain dropped {} orphaned records ({} weight) across all stages",
            total_dropped.records,
            total_dropped.weight,
        );
    }
    Ok(())
}
