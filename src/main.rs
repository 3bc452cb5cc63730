use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use reapportion::config::Config;
use reapportion::eligibility::{collapse_households, load_household_rows, load_person_rows};
use reapportion::engine::{normalize, write_aggregate_csv};
use reapportion::geography::GeoFamily;
use reapportion::pipeline;
use reapportion::runtime;

#[derive(Parser)]
#[command(
    name = "reapportion",
    version,
    about = "Crosswalk reapportionment for broadband-subsidy eligibility tables"
)]
struct Cli {
    /// Worker threads (0 = env hints, then hardware autodetect).
    #[arg(long, global = true, default_value_t = 0)]
    threads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collapse PUMS person/household files into a state eligibility sheet.
    Derive {
        #[arg(long)]
        person: PathBuf,
        #[arg(long)]
        household: PathBuf,
        /// Two-digit state FIPS prefix for the PUMA codes.
        #[arg(long)]
        state_code: String,
        /// Geography column name for the sheet.
        #[arg(long, default_value = "puma12")]
        geo_col: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Apply one crosswalk transition to a weighted-record table.
    Apply {
        #[arg(long)]
        records: PathBuf,
        #[arg(long)]
        crosswalk: PathBuf,
        /// Substring naming the source-geography column (e.g. "puma12").
        #[arg(long)]
        source_hint: String,
        #[arg(long)]
        out: PathBuf,
        /// Chunks per batch (0 = one per pool thread).
        #[arg(long, default_value_t = 0)]
        workers: usize,
    },
    /// Run the standard puma12 -> puma22 -> county chain from a config file.
    Chain {
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    runtime::configure_thread_pool((cli.threads > 0).then_some(cli.threads));

    match cli.command {
        Command::Derive {
            person,
            household,
            state_code,
            geo_col,
            out,
        } => {
            let persons = load_person_rows(&person)
                .with_context(|| format!("reading person file {}", person.display()))?;
            let households = load_household_rows(&household)
                .with_context(|| format!("reading household file {}", household.display()))?;
            let records = collapse_households(&persons, &households, &state_code);
            log::info!(
                "collapsed {} person rows / {} households into {} records",
                persons.len(),
                households.len(),
                records.len(),
            );
            let rows = normalize(records);
            write_aggregate_csv(&out, &geo_col, GeoFamily::Puma, &rows)
                .with_context(|| format!("writing sheet {}", out.display()))?;
        }
        Command::Apply {
            records,
            crosswalk,
            source_hint,
            out,
            workers,
        } => {
            let report = pipeline::run_transition(&records, &crosswalk, &source_hint, &out, workers)
                .with_context(|| format!("transition from `{source_hint}`"))?;
            log::info!(
                "wrote {}: {} records in, {} rows out ({} orphaned)",
                out.display(),
                report.records_in,
                report.rows_out,
                report.dropped.records,
            );
        }
        Command::Chain { config } => {
            let config = Config::load_from_file(&config)
                .with_context(|| format!("loading config {}", config.display()))?;
            pipeline::run_chain(&config).context("running the transition chain")?;
        }
    }

    Ok(())
}
