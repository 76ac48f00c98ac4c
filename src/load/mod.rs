// src/load/mod.rs

pub mod local;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

use crate::table::{ColumnKind, NormalizedTable, Value};

pub use local::LocalWarehouse;

/// One field of an explicit load schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Destination the pipeline loads into. Every load replaces the target table.
pub trait Warehouse {
    /// Create `dataset` if it does not exist. Returns `true` when it was created.
    fn ensure_dataset(&self, dataset: &str) -> Result<bool>;

    /// Drop `table` if present. Returns `true` when something was deleted.
    fn delete_table(&self, dataset: &str, table: &str) -> Result<bool>;

    /// Replace `table` letting the warehouse take column types from the data.
    fn load_autodetect(&self, dataset: &str, table: &str, data: &NormalizedTable) -> Result<()>;

    /// Replace `table` using an explicit schema.
    fn load_with_schema(
        &self,
        dataset: &str,
        table: &str,
        data: &NormalizedTable,
        schema: &[SchemaField],
    ) -> Result<()>;

    /// Rows currently stored in `table`.
    fn row_count(&self, dataset: &str, table: &str) -> Result<u64>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub dataset: String,
    /// Tables dropped before anything is loaded.
    #[serde(default)]
    pub tables_to_delete: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Explicit schema for the fallback load path.
pub fn infer_schema(table: &NormalizedTable) -> Vec<SchemaField> {
    table
        .columns()
        .iter()
        .map(|c| SchemaField {
            name: c.name.clone(),
            ty: c.kind.warehouse_type().to_string(),
        })
        .collect()
}

/// Findings of the pre-load checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    pub empty_columns: Vec<String>,
    pub numeric_text_columns: Vec<String>,
}

/// Look for columns that are entirely null, and text columns whose every
/// value would parse as a number.
pub fn check_table(table: &NormalizedTable) -> TableReport {
    let mut report = TableReport::default();
    for col in table.columns() {
        if col.is_all_null() {
            report.empty_columns.push(col.name.clone());
            continue;
        }
        if col.kind == ColumnKind::Text
            && col.values.iter().all(|v| match v {
                Value::Null | Value::Float(_) | Value::Int(_) => true,
                Value::Text(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            })
        {
            report.numeric_text_columns.push(col.name.clone());
        }
    }
    report
}

fn load_one<W: Warehouse>(
    warehouse: &W,
    dataset: &str,
    name: &str,
    table: &NormalizedTable,
) -> bool {
    info!(table = %name, "sending to {}.{}", dataset, name);

    match warehouse.load_autodetect(dataset, name, table) {
        Ok(()) => {
            match warehouse.row_count(dataset, name) {
                Ok(rows) => info!(table = %name, rows, "loaded {}.{}", dataset, name),
                Err(e) => warn!(table = %name, error = %e, "loaded, row count unavailable"),
            }
            return true;
        }
        Err(e) => {
            error!(table = %name, error = %e, "primary load failed; trying explicit schema");
        }
    }

    let schema = infer_schema(table);
    match warehouse.load_with_schema(dataset, name, table, &schema) {
        Ok(()) => {
            info!(table = %name, "loaded via explicit schema");
            true
        }
        Err(e) => {
            error!(table = %name, error = %e, "explicit schema load failed too");
            false
        }
    }
}

/// Load every table into `opts.dataset`, replacing existing contents.
///
/// The dataset is created when missing and `opts.tables_to_delete` are dropped
/// first. A table whose two load attempts both fail is recorded in
/// [`LoadSummary::failed`]; the remaining tables are still loaded.
#[instrument(level = "info", skip(warehouse, tables), fields(dataset = %opts.dataset))]
pub fn send_to_warehouse<W: Warehouse>(
    warehouse: &W,
    tables: &BTreeMap<String, NormalizedTable>,
    opts: &LoadOptions,
) -> Result<LoadSummary> {
    let created = warehouse
        .ensure_dataset(&opts.dataset)
        .with_context(|| format!("ensuring dataset {}", opts.dataset))?;
    if created {
        info!(dataset = %opts.dataset, "dataset created");
    } else {
        info!(dataset = %opts.dataset, "dataset already exists");
    }

    if !opts.tables_to_delete.is_empty() {
        info!(tables = ?opts.tables_to_delete, "deleting listed tables");
        for old in &opts.tables_to_delete {
            match warehouse.delete_table(&opts.dataset, old) {
                Ok(true) => info!(table = %old, "table deleted"),
                Ok(false) => info!(table = %old, "table not found; nothing to delete"),
                Err(e) => warn!(table = %old, error = %e, "failed to delete table"),
            }
        }
    }

    let mut summary = LoadSummary::default();
    for (name, table) in tables {
        let report = check_table(table);
        if !report.empty_columns.is_empty() {
            warn!(table = %name, columns = ?report.empty_columns, "completely empty columns");
        }
        for col in &report.numeric_text_columns {
            warn!(table = %name, column = %col, "text column could be numeric");
        }

        if load_one(warehouse, &opts.dataset, name, table) {
            summary.succeeded.push(name.clone());
        } else {
            summary.failed.push(name.clone());
        }
    }

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "load summary"
    );
    if !summary.failed.is_empty() {
        error!(tables = ?summary.failed, "tables failed to load");
    }
    Ok(summary)
}
