// src/process/columns.rs

use std::collections::HashMap;

use super::raw_table::RawTable;

/// One label per column, joining multi-level headers with `_`.
///
/// - no header rows      → column positions `0`, `1`, …
/// - empty label         → `Unnamed: {col}` / `Unnamed: {col}_level_{lvl}`
/// - duplicate label set → `.1`, `.2`, … appended to the last level
pub fn flatten_headers(raw: &RawTable) -> Vec<String> {
    let width = raw.width();
    if raw.header_rows.is_empty() {
        return (0..width).map(|i| i.to_string()).collect();
    }

    let multi = raw.header_rows.len() > 1;
    let tuples: Vec<Vec<String>> = (0..width)
        .map(|col| {
            raw.header_rows
                .iter()
                .enumerate()
                .map(|(lvl, row)| {
                    let label = row.get(col).map(String::as_str).unwrap_or("");
                    if !label.is_empty() {
                        label.to_string()
                    } else if multi {
                        format!("Unnamed: {}_level_{}", col, lvl)
                    } else {
                        format!("Unnamed: {}", col)
                    }
                })
                .collect()
        })
        .collect();

    dedup_labels(tuples)
        .into_iter()
        .map(|levels| levels.join("_").trim().to_string())
        .collect()
}

fn dedup_labels(tuples: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
    let mut out = Vec::with_capacity(tuples.len());

    for mut col in tuples {
        let mut cur = counts.get(&col).copied().unwrap_or(0);
        while cur > 0 {
            counts.insert(col.clone(), cur + 1);
            if let Some(last) = col.last_mut() {
                last.push_str(&format!(".{}", cur));
            }
            cur = counts.get(&col).copied().unwrap_or(0);
        }
        counts.insert(col.clone(), cur + 1);
        out.push(col);
    }

    out
}

/// Lower-case, trim, and turn whitespace, `.`, `-`, `/` into `_`.
pub fn slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '.' | '-' | '/' => '_',
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header_rows: Vec<Vec<&str>>, width: usize) -> RawTable {
        RawTable {
            header_rows: header_rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
            rows: vec![vec![String::new(); width]],
        }
    }

    #[test]
    fn two_level_header_flattens_to_slug() {
        let raw = table(vec![vec!["Playing Time"], vec!["MP"]], 1);
        let names = flatten_headers(&raw);
        assert_eq!(names, vec!["Playing Time_MP"]);
        assert_eq!(slug(&names[0]), "playing_time_mp");
    }

    #[test]
    fn empty_labels_get_placeholders() {
        let multi = table(vec![vec!["", "Performance"], vec!["Player", "Gls"]], 2);
        assert_eq!(
            flatten_headers(&multi),
            vec!["Unnamed: 0_level_0_Player", "Performance_Gls"]
        );

        let single = table(vec![vec!["Jogador", ""]], 2);
        assert_eq!(flatten_headers(&single), vec!["Jogador", "Unnamed: 1"]);
    }

    #[test]
    fn duplicate_labels_are_numbered() {
        let raw = table(vec![vec!["Gls", "Ast", "Gls", "Gls"]], 4);
        assert_eq!(flatten_headers(&raw), vec!["Gls", "Ast", "Gls.1", "Gls.2"]);
    }

    #[test]
    fn headerless_tables_use_positions() {
        let raw = RawTable {
            header_rows: vec![],
            rows: vec![vec!["a".into(), "b".into()]],
        };
        assert_eq!(flatten_headers(&raw), vec!["0", "1"]);
    }

    #[test]
    fn slug_rule() {
        assert_eq!(slug("  Min/90 "), "min_90");
        assert_eq!(slug("Per 90 Minutes_G+A-PK"), "per_90_minutes_g+a_pk");
        assert_eq!(slug("Gls.1"), "gls_1");
        assert_eq!(slug("Valor de Mercado"), "valor_de_mercado");
    }
}
