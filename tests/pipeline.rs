//! End-to-end tests for the staged pipeline: sheet in, two crosswalk
//! transitions, aggregated county table out.

use std::fs;
use std::path::PathBuf;

use reapportion::config::Config;
use reapportion::engine::{INDICATOR_LABELS, load_weighted_records};
use reapportion::error::ReapportionError;
use reapportion::pipeline::{run_chain, run_transition};

struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "reapportion-{tag}-{}-{:?}",
            std::process::id(),
            std::thread::current().id(),
        ));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn path(&self) -> &PathBuf {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.0).ok();
    }
}

fn sheet_csv(geo_col: &str, rows: &[(&str, u64, u64)]) -> String {
    let mut header = vec![geo_col.to_string(), "WGTP".into(), "POVPIP".into()];
    header.extend(["has_pap", "has_ssip", "has_hins4", "has_snap"].map(String::from));
    header.extend(INDICATOR_LABELS.map(String::from));
    header.push("HH Income".into());

    let mut out = header.join(",");
    out.push('\n');
    for (geo, weight, black) in rows {
        let mut fields = vec![geo.to_string(), weight.to_string(), "120".into()];
        fields.extend(["0", "0", "1", "0"].map(String::from));
        for (i, _) in INDICATOR_LABELS.iter().enumerate() {
            fields.push(if i == 2 { black.to_string() } else { "0".into() });
        }
        fields.push("28000".into());
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn write_fixtures(dir: &PathBuf) -> Config {
    let sheets = dir.join("sheets");
    let out = dir.join("out");
    fs::create_dir_all(&sheets).unwrap();

    fs::write(
        sheets.join("mi-eligibility.csv"),
        sheet_csv("puma12", &[("2600100", 100, 30), ("2600200", 50, 10)]),
    )
    .unwrap();

    // 2600100 splits across two current PUMAs; 2600200 maps 1:1.
    fs::write(
        dir.join("equivalency.csv"),
        "puma12,puma22,afact\n\
         2600100,2600101,0.6\n\
         2600100,2600102,0.4\n\
         2600200,2600201,1.0\n",
    )
    .unwrap();

    // Both current PUMAs of the split land in the same county.
    fs::write(
        dir.join("county.csv"),
        "puma22,county,afact\n\
         2600101,26001,1.0\n\
         2600102,26001,1.0\n\
         2600201,26003,1.0\n",
    )
    .unwrap();

    Config {
        sheets_dir: sheets,
        output_dir: out,
        puma_equivalency: dir.join("equivalency.csv"),
        puma_to_county: dir.join("county.csv"),
        legacy_puma_sheets: true,
        workers: 2,
        states: Vec::new(),
    }
}

#[test]
fn chain_produces_both_stage_tables() {
    let tmp = TempDir::new("chain");
    let config = write_fixtures(tmp.path());

    run_chain(&config).unwrap();

    let puma22 = config.output_dir.join("mi-eligibility-puma22.csv");
    let county = config.output_dir.join("mi-eligibility-county.csv");
    assert!(puma22.exists());
    assert!(county.exists());

    let rows = load_weighted_records(&puma22, "puma22").unwrap();
    assert_eq!(rows.len(), 3);
    let total: f64 = rows.iter().map(|r| r.weight).sum();
    assert_eq!(total, 150.0, "fully covered sources conserve weight");

    let rows = load_weighted_records(&county, "county").unwrap();
    assert_eq!(rows.len(), 2, "the split PUMA re-merges inside one county");
    let by_geo = |geo: &str| rows.iter().find(|r| r.geo == geo).unwrap();
    assert_eq!(by_geo("26001").weight, 100.0);
    assert_eq!(by_geo("26001").indicators[2], 30.0);
    assert_eq!(by_geo("26003").weight, 50.0);
    assert_eq!(by_geo("26003").indicators[2], 10.0);
}

#[test]
fn chain_matches_manual_stage_by_stage_run() {
    let tmp = TempDir::new("manual");
    let config = write_fixtures(tmp.path());

    run_chain(&config).unwrap();
    let chained = fs::read_to_string(config.output_dir.join("mi-eligibility-county.csv")).unwrap();

    let manual_mid = tmp.path().join("mid.csv");
    let manual_out = tmp.path().join("manual-county.csv");
    run_transition(
        &config.sheets_dir.join("mi-eligibility.csv"),
        &config.puma_equivalency,
        "puma12",
        &manual_mid,
        1,
    )
    .unwrap();
    run_transition(&manual_mid, &config.puma_to_county, "puma22", &manual_out, 1).unwrap();

    assert_eq!(chained, fs::read_to_string(&manual_out).unwrap());
}

#[test]
fn failed_transition_writes_no_partial_output() {
    let tmp = TempDir::new("abort");
    let config = write_fixtures(tmp.path());

    // Corrupt the county crosswalk: afact column gone.
    fs::write(
        tmp.path().join("county.csv"),
        "puma22,county\n2600101,26001\n",
    )
    .unwrap();

    let err = run_chain(&config).unwrap_err();
    assert!(matches!(err, ReapportionError::MalformedCrosswalk { .. }));

    assert!(
        !config.output_dir.join("mi-eligibility-county.csv").exists(),
        "no partial county table on failure"
    );
    let leftovers: Vec<_> = match fs::read_dir(&config.output_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect(),
        Err(_) => Vec::new(),
    };
    assert!(leftovers.is_empty(), "no stray .tmp files");
}

#[test]
fn orphaned_sheet_rows_reach_no_county() {
    let tmp = TempDir::new("orphan");
    let config = write_fixtures(tmp.path());

    // Add a sheet row whose PUMA the equivalency crosswalk does not know.
    let sheet = config.sheets_dir.join("mi-eligibility.csv");
    let mut text = fs::read_to_string(&sheet).unwrap();
    text.push_str(&sheet_csv("puma12", &[("2699900", 77, 0)]).lines().nth(1).unwrap().to_string());
    text.push('\n');
    fs::write(&sheet, text).unwrap();

    run_chain(&config).unwrap();

    let rows =
        load_weighted_records(&config.output_dir.join("mi-eligibility-county.csv"), "county")
            .unwrap();
    let total: f64 = rows.iter().map(|r| r.weight).sum();
    assert_eq!(total, 150.0, "orphaned weight leaks into no county");
}
