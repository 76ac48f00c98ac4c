// src/process/mod.rs
pub mod columns;
pub mod convert;
pub mod html;
pub mod raw_table;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::table::{
    Column, ColumnKind, NormalizedTable, Value, EXTRACTED_AT_COLUMN, SOURCE_COLUMN, TEAM_COLUMN,
};

pub use columns::{flatten_headers, slug};
pub use convert::{classify_column, convert_column, convert_market_value};
pub use html::parse_tables;
pub use raw_table::RawTable;

/// Key under which table `index` of `team` is stored.
pub fn table_key(team: &str, index: usize) -> String {
    format!("{}_tabela_{}", team, index)
}

/// Turn a raw HTML table into a typed, tagged table.
///
/// Pure given its inputs: the same raw table and timestamp always produce
/// the same result.
pub fn normalize_table(
    raw: &RawTable,
    name: &str,
    team: &str,
    source_url: &str,
    extracted_at: DateTime<Utc>,
) -> NormalizedTable {
    let mut table = NormalizedTable::new(name, raw.rows.len());

    for (idx, label) in flatten_headers(raw).iter().enumerate() {
        let cells = raw.column_cells(idx);
        let (kind, values) = convert_column(&cells);
        let col_name = slug(label);
        trace!(column = %col_name, ?kind, "converted column");
        table.insert_column(Column::new(col_name, kind, values));
    }

    table.insert_constant(TEAM_COLUMN, ColumnKind::Text, Value::Text(team.to_string()));
    table.insert_constant(
        EXTRACTED_AT_COLUMN,
        ColumnKind::Timestamp,
        Value::Timestamp(extracted_at),
    );
    table.insert_constant(
        SOURCE_COLUMN,
        ColumnKind::Text,
        Value::Text(source_url.to_string()),
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn squad_html() -> &'static str {
        r#"<table>
            <thead>
              <tr><th></th><th colspan="2">Playing Time</th><th>Market</th></tr>
              <tr><th>Player</th><th>MP</th><th>Min/90</th><th>Value</th></tr>
            </thead>
            <tbody>
              <tr><td>Endrick</td><td>30</td><td>1.500,50</td><td>R$ 1.500,50</td></tr>
              <tr><td>Veiga</td><td>28</td><td>2,5</td><td>N/A</td></tr>
            </tbody>
        </table>"#
    }

    #[test]
    fn normalizes_headers_values_and_metadata() {
        let raw = &parse_tables(squad_html())[0];
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t = normalize_table(raw, "palmeiras_tabela_0", "palmeiras", "https://x/y", ts);

        assert_eq!(
            t.column_names(),
            vec![
                "unnamed:_0_level_0_player",
                "playing_time_mp",
                "playing_time_min_90",
                "market_value",
                "time",
                "data_extracao",
                "fonte",
            ]
        );
        assert_eq!(t.num_rows(), 2);

        let mp = t.column("playing_time_mp").unwrap();
        assert_eq!(mp.kind, ColumnKind::Integer);
        assert_eq!(mp.values, vec![Value::Int(30), Value::Int(28)]);

        let min = t.column("playing_time_min_90").unwrap();
        assert_eq!(min.values, vec![Value::Float(1500.5), Value::Float(2.5)]);

        let value = t.column("market_value").unwrap();
        assert_eq!(value.kind, ColumnKind::Text);
        assert_eq!(
            value.values,
            vec![Value::Float(1500.5), Value::Text("N/A".into())]
        );

        assert_eq!(
            t.column("time").unwrap().values,
            vec![Value::Text("palmeiras".into()); 2]
        );
        assert_eq!(t.column("data_extracao").unwrap().values[0], Value::Timestamp(ts));
        assert_eq!(t.column("fonte").unwrap().kind, ColumnKind::Text);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = &parse_tables(squad_html())[0];
        let ts = Utc::now();
        let a = normalize_table(raw, "k", "flamengo", "https://x", ts);
        let b = normalize_table(raw, "k", "flamengo", "https://x", ts);
        assert_eq!(a, b);
    }

    #[test]
    fn slug_collisions_shadow_earlier_columns() {
        let raw = RawTable {
            header_rows: vec![vec!["Gls.".into(), "Gls-".into()]],
            rows: vec![vec!["1".into(), "x".into()]],
        };
        let t = normalize_table(&raw, "k", "team", "https://x", Utc::now());
        assert_eq!(t.column_names()[0], "gls_");
        assert_eq!(t.num_columns(), 4);
        assert_eq!(t.column("gls_").unwrap().values, vec![Value::Null]);
    }

    #[test]
    fn scraped_time_column_is_overwritten_by_team() {
        let raw = RawTable {
            header_rows: vec![vec!["Player".into(), "Time".into(), "Gls".into()]],
            rows: vec![
                vec!["Yuri Alberto".into(), "Corinthians".into(), "8".into()],
                vec!["Romero".into(), "Corinthians".into(), "5".into()],
            ],
        };
        let t = normalize_table(&raw, "k", "corinthians", "https://x", Utc::now());

        assert_eq!(
            t.column_names(),
            vec!["player", "time", "gls", "data_extracao", "fonte"]
        );
        let team = t.column("time").unwrap();
        assert_eq!(team.kind, ColumnKind::Text);
        assert_eq!(team.values, vec![Value::Text("corinthians".into()); 2]);
    }

    #[test]
    fn table_keys() {
        assert_eq!(table_key("corinthians", 4), "corinthians_tabela_4");
    }
}
