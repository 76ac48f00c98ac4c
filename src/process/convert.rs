// src/process/convert.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::{ColumnKind, Value};

/// Anything that marks a column as money / percentage / scaled.
static MARKET_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"R\$|\$|€|%|M|K").expect("marker regex should compile"));

/// Symbols stripped before a market value is parsed.
static MARKET_SYMBOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"R\$|\$|€|%").expect("symbol regex should compile"));

/// Comma-grouped thousands, e.g. `12,345` or `-1,234.5`.
static THOUSANDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d*)?$").expect("thousands regex should compile")
});

/// Drop `,` thousands separators when the cell is grouped in threes.
fn strip_thousands(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    THOUSANDS.is_match(s).then(|| s.replace(',', ""))
}

fn parse_int(s: &str) -> Option<i64> {
    strip_thousands(s)?.parse().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    strip_thousands(s)?.parse().ok()
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Decide the storage class of a raw column from its cells.
/// Empty cells are nulls and never affect the decision.
pub fn classify_column(cells: &[&str]) -> ColumnKind {
    let present: Vec<&str> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
    if present.is_empty() {
        ColumnKind::Float
    } else if present.iter().all(|c| parse_bool(c).is_some()) {
        ColumnKind::Boolean
    } else if present.iter().all(|c| parse_int(c).is_some()) {
        ColumnKind::Integer
    } else if present.iter().all(|c| parse_float(c).is_some()) {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    }
}

/// True when any cell carries a currency symbol, `%`, `K` or `M`.
pub fn has_market_markers(cells: &[&str]) -> bool {
    cells.iter().any(|c| MARKET_MARKERS.is_match(c))
}

fn parse_scaled(s: &str, suffix: char, factor: f64) -> Option<f64> {
    s.replace(suffix, "")
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .map(|v| v * factor)
}

/// Parse a `.`-grouped, `,`-decimal number such as `1.500,50`.
fn parse_locale(s: &str) -> Option<f64> {
    s.replace('.', "").replace(',', ".").trim().parse().ok()
}

/// Convert one cell of a money / percentage column.
///
/// A cell that does not parse comes back as the symbol-stripped text.
pub fn convert_market_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    let stripped = MARKET_SYMBOLS.replace_all(cell, "").trim().to_string();
    if stripped.eq_ignore_ascii_case("none") {
        return Value::Text(stripped);
    }

    let parsed = if stripped.contains('M') {
        parse_scaled(&stripped, 'M', 1_000_000.0)
    } else if stripped.contains('K') {
        parse_scaled(&stripped, 'K', 1_000.0)
    } else {
        parse_locale(&stripped)
    };

    match parsed {
        Some(v) => Value::Float(v),
        None => Value::Text(stripped),
    }
}

enum Numeric {
    Int(i64),
    Float(f64),
}

fn parse_locale_numeric(cell: &str) -> Option<Numeric> {
    let cleaned = cell.replace('.', "").replace(',', ".");
    let cleaned = cleaned.trim();
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Numeric::Int(i));
    }
    cleaned.parse::<f64>().ok().map(Numeric::Float)
}

/// Classify then convert a raw column into typed values.
pub fn convert_column(cells: &[&str]) -> (ColumnKind, Vec<Value>) {
    match classify_column(cells) {
        ColumnKind::Boolean => (
            ColumnKind::Boolean,
            cells
                .iter()
                .map(|c| parse_bool(c).map_or(Value::Null, Value::Bool))
                .collect(),
        ),
        ColumnKind::Integer => (
            ColumnKind::Integer,
            cells
                .iter()
                .map(|c| parse_int(c).map_or(Value::Null, Value::Int))
                .collect(),
        ),
        ColumnKind::Float | ColumnKind::Timestamp => (
            ColumnKind::Float,
            cells
                .iter()
                .map(|c| parse_float(c).map_or(Value::Null, Value::Float))
                .collect(),
        ),
        ColumnKind::Text if has_market_markers(cells) => convert_market_column(cells),
        ColumnKind::Text => convert_locale_column(cells),
    }
}

fn convert_market_column(cells: &[&str]) -> (ColumnKind, Vec<Value>) {
    let values: Vec<Value> = cells.iter().map(|c| convert_market_value(c)).collect();
    let fully_numeric = values
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Float(_)));
    let kind = if fully_numeric {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    };
    (kind, values)
}

fn convert_locale_column(cells: &[&str]) -> (ColumnKind, Vec<Value>) {
    let parsed: Vec<Option<Numeric>> = cells
        .iter()
        .map(|c| if c.is_empty() { None } else { parse_locale_numeric(c) })
        .collect();

    if parsed.iter().all(|p| matches!(p, Some(Numeric::Int(_)))) {
        let values = parsed
            .into_iter()
            .map(|p| match p {
                Some(Numeric::Int(i)) => Value::Int(i),
                _ => Value::Null,
            })
            .collect();
        return (ColumnKind::Integer, values);
    }

    let values = parsed
        .into_iter()
        .map(|p| match p {
            Some(Numeric::Int(i)) => Value::Float(i as f64),
            Some(Numeric::Float(f)) => Value::Float(f),
            None => Value::Null,
        })
        .collect();
    (ColumnKind::Float, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_value_conversions() {
        assert_eq!(convert_market_value("R$ 1.500,50"), Value::Float(1500.5));
        assert_eq!(convert_market_value("3,5M"), Value::Float(3_500_000.0));
        assert_eq!(convert_market_value("750K"), Value::Float(750_000.0));
        assert_eq!(convert_market_value("€ 12M"), Value::Float(12_000_000.0));
        assert_eq!(convert_market_value("45%"), Value::Float(45.0));
        assert_eq!(convert_market_value("N/A"), Value::Text("N/A".into()));
        assert_eq!(convert_market_value("None"), Value::Text("None".into()));
        assert_eq!(convert_market_value(""), Value::Null);
    }

    #[test]
    fn unparseable_scaled_value_keeps_stripped_text() {
        assert_eq!(convert_market_value("Marcos"), Value::Text("Marcos".into()));
        assert_eq!(convert_market_value("€ abc K"), Value::Text("abc K".into()));
    }

    #[test]
    fn classification() {
        assert_eq!(classify_column(&["1", "2", ""]), ColumnKind::Integer);
        assert_eq!(classify_column(&["1,234", "12"]), ColumnKind::Integer);
        assert_eq!(classify_column(&["1.5", "2"]), ColumnKind::Float);
        assert_eq!(classify_column(&["", ""]), ColumnKind::Float);
        assert_eq!(classify_column(&["True", "false"]), ColumnKind::Boolean);
        assert_eq!(classify_column(&["3,5", "2"]), ColumnKind::Text);
        assert_eq!(classify_column(&["1.500,50"]), ColumnKind::Text);
        assert_eq!(classify_column(&["Weverton", "30"]), ColumnKind::Text);
    }

    #[test]
    fn locale_numeric_column() {
        let (kind, values) = convert_column(&["1.500,50", "2,25"]);
        assert_eq!(kind, ColumnKind::Float);
        assert_eq!(values, vec![Value::Float(1500.5), Value::Float(2.25)]);
    }

    #[test]
    fn locale_numeric_failures_become_null() {
        let (kind, values) = convert_column(&["1.500,50", "Brasil", ""]);
        assert_eq!(kind, ColumnKind::Float);
        assert_eq!(values, vec![Value::Float(1500.5), Value::Null, Value::Null]);
    }

    #[test]
    fn locale_integers_stay_integer() {
        let (kind, values) = convert_column(&["1.500.000", "2.000.000"]);
        assert_eq!(kind, ColumnKind::Integer);
        assert_eq!(values, vec![Value::Int(1_500_000), Value::Int(2_000_000)]);
    }

    #[test]
    fn plain_decimals_are_read_before_locale_rules() {
        let (kind, values) = convert_column(&["1.500", "10.000"]);
        assert_eq!(kind, ColumnKind::Float);
        assert_eq!(values, vec![Value::Float(1.5), Value::Float(10.0)]);
    }

    #[test]
    fn market_column_with_unconvertible_cell_is_mixed() {
        let (kind, values) = convert_column(&["R$ 1.500,50", "N/A", "3,5M", "750K"]);
        assert_eq!(kind, ColumnKind::Text);
        assert_eq!(
            values,
            vec![
                Value::Float(1500.5),
                Value::Text("N/A".into()),
                Value::Float(3_500_000.0),
                Value::Float(750_000.0),
            ]
        );
    }

    #[test]
    fn fully_converted_market_column_is_float() {
        let (kind, _) = convert_column(&["€ 25M", "€ 800K", ""]);
        assert_eq!(kind, ColumnKind::Float);
    }
}
