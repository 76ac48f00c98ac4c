// src/freshness.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::{fs, path::Path};

pub const DEFAULT_THRESHOLD_HOURS: f64 = 96.0;

const TABLE_EXTENSIONS: [&str; 2] = ["parquet", "ndjson"];

/// Hours since a loaded table was last written.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAge {
    pub table: String,
    pub modified: DateTime<Utc>,
    pub age_hours: f64,
}

impl TableAge {
    pub fn is_stale(&self, threshold_hours: f64) -> bool {
        self.age_hours > threshold_hours
    }
}

/// List the tables stored in a dataset directory with their age at `now`,
/// sorted by table name. Temp files left by interrupted loads are skipped.
pub fn scan(dir: &Path, now: DateTime<Utc>) -> Result<Vec<TableAge>> {
    let mut ages = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("reading {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(fname) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        if fname.starts_with('.') {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !TABLE_EXTENSIONS.contains(&ext) {
            continue;
        }
        let Some(table) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let modified: DateTime<Utc> = entry
            .metadata()
            .and_then(|m| m.modified())
            .with_context(|| format!("reading mtime of {:?}", path))?
            .into();
        let age_hours = (now - modified).num_seconds() as f64 / 3600.0;

        ages.push(TableAge {
            table: table.to_string(),
            modified,
            age_hours,
        });
    }

    ages.sort_by(|a, b| a.table.cmp(&b.table));
    Ok(ages)
}
