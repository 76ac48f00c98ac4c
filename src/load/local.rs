// src/load/local.rs

use anyhow::{bail, Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::{Map, Value as JsonValue};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

use super::{SchemaField, Warehouse};
use crate::table::{to_record_batch, NormalizedTable, Value, TIMESTAMP_FORMAT};

/// Directory-backed warehouse: `<root>/<project>/<dataset>/<table>.parquet`.
///
/// The explicit-schema path writes `<table>.ndjson` next to a
/// `<table>.schema.json`. Either way the previous contents of the table are
/// replaced.
#[derive(Debug, Clone)]
pub struct LocalWarehouse {
    root: PathBuf,
    project: String,
}

impl LocalWarehouse {
    pub fn new(root: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            project: project.into(),
        }
    }

    pub fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.root.join(&self.project).join(dataset)
    }

    fn table_files(&self, dataset: &str, table: &str) -> [PathBuf; 3] {
        let dir = self.dataset_dir(dataset);
        [
            dir.join(format!("{}.parquet", table)),
            dir.join(format!("{}.ndjson", table)),
            dir.join(format!("{}.schema.json", table)),
        ]
    }

    fn require_dataset(&self, dataset: &str) -> Result<PathBuf> {
        let dir = self.dataset_dir(dataset);
        if !dir.is_dir() {
            bail!("dataset {} does not exist at {}", dataset, dir.display());
        }
        Ok(dir)
    }
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("removing {:?}", path))?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Write via a dot-prefixed temp file, then rename over the target.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let dir = path.parent().context("table path has no parent")?;
    let fname = path
        .file_name()
        .and_then(|f| f.to_str())
        .context("table path has no file name")?;
    let tmp_path = dir.join(format!(".{}.tmp", fname));

    let file = File::create(&tmp_path).with_context(|| format!("creating {:?}", tmp_path))?;
    if let Err(e) = write(file) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

fn json_cell(value: &Value, ty: &str) -> JsonValue {
    match (value, ty) {
        (Value::Null, _) => JsonValue::Null,
        (Value::Int(i), "INTEGER") => JsonValue::from(*i),
        (Value::Float(f), "FLOAT") => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        (Value::Int(i), "FLOAT") => JsonValue::from(*i as f64),
        (Value::Bool(b), "BOOLEAN") => JsonValue::Bool(*b),
        (Value::Timestamp(ts), "TIMESTAMP") => {
            JsonValue::String(ts.format(TIMESTAMP_FORMAT).to_string())
        }
        (other, _) => other.render().map(JsonValue::String).unwrap_or(JsonValue::Null),
    }
}

impl Warehouse for LocalWarehouse {
    fn ensure_dataset(&self, dataset: &str) -> Result<bool> {
        let dir = self.dataset_dir(dataset);
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir).with_context(|| format!("creating dataset {:?}", dir))?;
        Ok(true)
    }

    fn delete_table(&self, dataset: &str, table: &str) -> Result<bool> {
        let mut deleted = false;
        for path in self.table_files(dataset, table) {
            deleted |= remove_if_exists(&path)?;
        }
        Ok(deleted)
    }

    fn load_autodetect(&self, dataset: &str, table: &str, data: &NormalizedTable) -> Result<()> {
        self.require_dataset(dataset)?;
        let [parquet_path, ndjson_path, schema_path] = self.table_files(dataset, table);

        let batch = to_record_batch(data)?;
        write_atomically(&parquet_path, |file| {
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();
            let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
                .context("creating Arrow writer")?;
            writer.write(&batch).context("writing record batch")?;
            writer.close().context("closing parquet writer")?;
            Ok(())
        })?;

        remove_if_exists(&ndjson_path)?;
        remove_if_exists(&schema_path)?;
        debug!(path = %parquet_path.display(), rows = batch.num_rows(), "wrote parquet table");
        Ok(())
    }

    fn load_with_schema(
        &self,
        dataset: &str,
        table: &str,
        data: &NormalizedTable,
        schema: &[SchemaField],
    ) -> Result<()> {
        self.require_dataset(dataset)?;
        if schema.len() != data.num_columns() {
            bail!(
                "schema has {} fields but {} has {} columns",
                schema.len(),
                table,
                data.num_columns()
            );
        }
        let [parquet_path, ndjson_path, schema_path] = self.table_files(dataset, table);

        write_atomically(&ndjson_path, |file| {
            let mut w = BufWriter::new(file);
            for row in 0..data.num_rows() {
                let mut obj = Map::with_capacity(schema.len());
                for (field, col) in schema.iter().zip(data.columns()) {
                    obj.insert(field.name.clone(), json_cell(&col.values[row], &field.ty));
                }
                serde_json::to_writer(&mut w, &obj).context("serializing row")?;
                w.write_all(b"\n")?;
            }
            w.flush()?;
            Ok(())
        })?;

        write_atomically(&schema_path, |file| {
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, schema).context("serializing schema")?;
            w.write_all(b"\n")?;
            w.flush()?;
            Ok(())
        })?;

        remove_if_exists(&parquet_path)?;
        debug!(path = %ndjson_path.display(), rows = data.num_rows(), "wrote ndjson table");
        Ok(())
    }

    fn row_count(&self, dataset: &str, table: &str) -> Result<u64> {
        let [parquet_path, ndjson_path, _] = self.table_files(dataset, table);

        if parquet_path.exists() {
            let file = File::open(&parquet_path)
                .with_context(|| format!("opening {:?}", parquet_path))?;
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)
                .with_context(|| format!("reading parquet footer of {:?}", parquet_path))?;
            return Ok(builder.metadata().file_metadata().num_rows() as u64);
        }

        if ndjson_path.exists() {
            let file = File::open(&ndjson_path)
                .with_context(|| format!("opening {:?}", ndjson_path))?;
            let mut n = 0u64;
            for line in BufReader::new(file).lines() {
                if !line?.trim().is_empty() {
                    n += 1;
                }
            }
            return Ok(n);
        }

        bail!("table {}.{} not found", dataset, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::infer_schema;
    use crate::table::{Column, ColumnKind};
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::DataType;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample() -> NormalizedTable {
        let mut t = NormalizedTable::new("flamengo_tabela_0_mercado", 2);
        t.insert_column(Column::new(
            "jogador",
            ColumnKind::Text,
            vec![Value::Text("Arrascaeta".into()), Value::Text("Pedro".into())],
        ));
        t.insert_column(Column::new(
            "valor",
            ColumnKind::Float,
            vec![Value::Float(18_000_000.0), Value::Float(750_000.0)],
        ));
        t.insert_constant("data_extracao", ColumnKind::Timestamp, Value::Timestamp(Utc::now()));
        t
    }

    #[test]
    fn autodetect_load_writes_parquet() {
        let tmp = tempdir().unwrap();
        let wh = LocalWarehouse::new(tmp.path(), "dataglowup");

        assert!(wh.ensure_dataset("DataGlowUp").unwrap());
        assert!(!wh.ensure_dataset("DataGlowUp").unwrap());

        wh.load_autodetect("DataGlowUp", "flamengo_tabela_0_mercado", &sample())
            .unwrap();
        assert_eq!(wh.row_count("DataGlowUp", "flamengo_tabela_0_mercado").unwrap(), 2);

        let path = wh
            .dataset_dir("DataGlowUp")
            .join("flamengo_tabela_0_mercado.parquet");
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Float64);
        let names = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(names.value(0), "Arrascaeta");
        let values = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(values.value(1), 750_000.0);
    }

    #[test]
    fn reload_replaces_previous_contents() {
        let tmp = tempdir().unwrap();
        let wh = LocalWarehouse::new(tmp.path(), "p");
        wh.ensure_dataset("d").unwrap();

        let table = sample();
        wh.load_autodetect("d", "t", &table).unwrap();
        wh.load_autodetect("d", "t", &table).unwrap();
        assert_eq!(wh.row_count("d", "t").unwrap(), 2);

        wh.load_with_schema("d", "t", &table, &infer_schema(&table))
            .unwrap();
        let dir = wh.dataset_dir("d");
        assert!(!dir.join("t.parquet").exists());
        assert!(dir.join("t.schema.json").exists());
        assert_eq!(wh.row_count("d", "t").unwrap(), 2);

        let first = fs::read_to_string(dir.join("t.ndjson")).unwrap();
        let row: JsonValue = serde_json::from_str(first.lines().next().unwrap()).unwrap();
        assert_eq!(row["jogador"], "Arrascaeta");
        assert_eq!(row["valor"], 18_000_000.0);
    }

    #[test]
    fn load_requires_dataset() {
        let tmp = tempdir().unwrap();
        let wh = LocalWarehouse::new(tmp.path(), "p");
        assert!(wh.load_autodetect("missing", "t", &sample()).is_err());
    }

    #[test]
    fn delete_reports_presence() {
        let tmp = tempdir().unwrap();
        let wh = LocalWarehouse::new(tmp.path(), "p");
        wh.ensure_dataset("d").unwrap();
        wh.load_autodetect("d", "t", &sample()).unwrap();

        assert!(wh.delete_table("d", "t").unwrap());
        assert!(!wh.delete_table("d", "t").unwrap());
        assert!(wh.row_count("d", "t").is_err());
    }
}
