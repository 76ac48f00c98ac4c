// src/table/mod.rs

pub mod arrow;

use chrono::{DateTime, Utc};

pub use self::arrow::{build_arrow_schema, map_to_arrow_type, to_record_batch};

/// Metadata column carrying the team identifier.
pub const TEAM_COLUMN: &str = "time";
/// Metadata column carrying the extraction timestamp.
pub const EXTRACTED_AT_COLUMN: &str = "data_extracao";
/// Metadata column carrying the source URL.
pub const SOURCE_COLUMN: &str = "fonte";

/// Timestamp layout used whenever a timestamp cell is rendered as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A single converted cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text rendering used by seed files and by string-typed columns.
    /// `None` for nulls.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            Value::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

/// Whole floats keep a trailing `.0` so seed readers still see a float.
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Storage class of a column, decided before any value conversion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Float,
    Timestamp,
    Boolean,
    /// Free text; may hold a mix of `Float` and `Text` cells after conversion.
    Text,
}

impl ColumnKind {
    /// Warehouse type name for an explicit load schema.
    pub fn warehouse_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Float => "FLOAT",
            ColumnKind::Timestamp => "TIMESTAMP",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Text => "STRING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }
}

/// A cleaned, tagged table ready for the seed writer or the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub name: String,
    columns: Vec<Column>,
    num_rows: usize,
}

impl NormalizedTable {
    pub fn new(name: impl Into<String>, num_rows: usize) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            num_rows,
        }
    }

    /// Add `column`, replacing any existing column with the same name in place.
    /// Short columns are padded with nulls, long ones truncated, so every
    /// column holds exactly `num_rows` values.
    pub fn insert_column(&mut self, mut column: Column) {
        column.values.resize(self.num_rows, Value::Null);
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Append a column holding `value` in every row.
    pub fn insert_constant(&mut self, name: &str, kind: ColumnKind, value: Value) {
        let values = vec![value; self.num_rows];
        self.insert_column(Column::new(name, kind, values));
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
