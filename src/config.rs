// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::info;
use url::Url;

use crate::fetch::{SourceSet, DEFAULT_USER_AGENT};
use crate::freshness::DEFAULT_THRESHOLD_HOURS;
use crate::load::LoadOptions;

/// Where extracted tables go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    Seeds,
    Warehouse,
    Both,
}

impl Output {
    pub fn seeds(self) -> bool {
        matches!(self, Output::Seeds | Output::Both)
    }

    pub fn warehouse(self) -> bool {
        matches!(self, Output::Warehouse | Output::Both)
    }
}

impl FromStr for Output {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seeds" => Ok(Output::Seeds),
            "warehouse" => Ok(Output::Warehouse),
            "both" => Ok(Output::Both),
            other => bail!("unknown output {:?} (expected seeds, warehouse or both)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project_id: String,
    pub dataset_id: String,
    pub output: Output,
    pub seeds_dir: PathBuf,
    pub warehouse_dir: PathBuf,
    pub tables_to_delete: Vec<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub statistics: SourceSet,
    pub market_values: SourceSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: "dataglowup-458411".into(),
            dataset_id: "DataGlowUp".into(),
            output: Output::Warehouse,
            seeds_dir: PathBuf::from("seeds"),
            warehouse_dir: PathBuf::from("warehouse"),
            tables_to_delete: Vec::new(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.into(),
            statistics: SourceSet::fbref_statistics(),
            market_values: SourceSet::ogol_market_values(),
        }
    }
}

impl Config {
    /// Read a YAML config file. Missing keys take their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {:?}", path))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults, or the file named by `CONFIG_PATH`, then the
    /// `SEEDS_DIR`, `WAREHOUSE_DIR` and `OUTPUT` overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match env::var("CONFIG_PATH") {
            Ok(path) if !path.is_empty() => {
                info!(path = %path, "loading config file");
                Self::load(path)?
            }
            _ => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SEEDS_DIR").filter(|v| !v.is_empty()) {
            self.seeds_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WAREHOUSE_DIR").filter(|v| !v.is_empty()) {
            self.warehouse_dir = PathBuf::from(dir);
        }
        if let Some(out) = lookup("OUTPUT").filter(|v| !v.is_empty()) {
            self.output = out.parse().context("invalid OUTPUT")?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            bail!("project_id must not be empty");
        }
        if self.dataset_id.trim().is_empty() {
            bail!("dataset_id must not be empty");
        }
        let sets = [
            ("statistics", &self.statistics),
            ("market_values", &self.market_values),
        ];
        for (what, set) in sets {
            for team in &set.teams {
                if team.name.trim().is_empty() {
                    bail!("{}: team with empty name ({})", what, team.url);
                }
                Url::parse(&team.url)
                    .with_context(|| format!("{}: bad url for {}: {}", what, team.name, team.url))?;
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            dataset: self.dataset_id.clone(),
            tables_to_delete: self.tables_to_delete.clone(),
        }
    }
}

/// Staleness threshold for `check_freshness`, from `FRESHNESS_THRESHOLD_HOURS`.
pub fn freshness_threshold_hours() -> Result<f64> {
    match env::var("FRESHNESS_THRESHOLD_HOURS") {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .with_context(|| format!("invalid FRESHNESS_THRESHOLD_HOURS {:?}", v)),
        _ => Ok(DEFAULT_THRESHOLD_HOURS),
    }
}
