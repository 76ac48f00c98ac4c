// src/seeds.rs

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

use crate::table::NormalizedTable;

/// Write one table as `<dir>/<key>.csv`, header row first.
/// Timestamps are stringified; nulls become empty fields.
pub fn write_seed(key: &str, table: &NormalizedTable, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", key));
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("creating seed file {:?}", path))?;

    wtr.write_record(table.column_names())
        .with_context(|| format!("writing header of {}", key))?;

    for row in 0..table.num_rows() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.values[row].render().unwrap_or_default())
            .collect();
        wtr.write_record(&record)
            .with_context(|| format!("writing row {} of {}", row, key))?;
    }

    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    Ok(path)
}

/// Save every table as a seed file under `dir`, creating it if needed.
#[instrument(level = "info", skip(tables, dir), fields(dir = %dir.as_ref().display()))]
pub fn write_seeds<P: AsRef<Path>>(
    tables: &BTreeMap<String, NormalizedTable>,
    dir: P,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating seeds directory {:?}", dir))?;

    let mut written = Vec::with_capacity(tables.len());
    for (key, table) in tables {
        let path = write_seed(key, table, dir)?;
        info!(table = %key, rows = table.num_rows(), path = %path.display(), "wrote seed");
        written.push(path);
    }

    info!(count = written.len(), "seeds saved");
    Ok(written)
}
