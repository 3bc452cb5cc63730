use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReapportionError, Result};

/// Pipeline configuration for the standard two-stage chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one eligibility sheet per state (`*.csv`).
    pub sheets_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Legacy-to-current PUMA equivalency crosswalk (puma12 -> puma22).
    pub puma_equivalency: PathBuf,
    /// Current-PUMA-to-county crosswalk (puma22 -> county).
    pub puma_to_county: PathBuf,
    /// Whether the sheets are keyed by legacy (2012-vintage) PUMA codes and
    /// need the equivalency stage first.
    pub legacy_puma_sheets: bool,
    /// Worker threads per batch; 0 sizes chunks to the rayon pool.
    pub workers: usize,
    /// Optional subset of state sheets to process, matched by file stem
    /// prefix (e.g. "mi"). Empty means every sheet found.
    pub states: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheets_dir: PathBuf::from("data/sheets"),
            output_dir: PathBuf::from("output"),
            puma_equivalency: PathBuf::from("data/geocorr/puma_equivalency.csv"),
            puma_to_county: PathBuf::from("data/geocorr/puma_to_county.csv"),
            legacy_puma_sheets: true,
            workers: 0,
            states: Vec::new(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ReapportionError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn wants_state(&self, stem: &str) -> bool {
        self.states.is_empty()
            || self
                .states
                .iter()
                .any(|s| stem.to_ascii_lowercase().starts_with(&s.to_ascii_lowercase()))
    }
}
