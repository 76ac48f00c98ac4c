// src/process/html.rs

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, trace};

use super::raw_table::RawTable;

const MAX_COLSPAN: usize = 1_000;
const MAX_ROWSPAN: usize = 65_534;

/// Parse every `<table>` in `html`, in document order.
///
/// Nested tables show up as their own entries; their rows are never counted
/// in the enclosing table. Elements styled `display:none` are dropped, and
/// so are tables without any cell text, so they never take a position.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("table").expect("table selector should parse");

    let mut blank = 0;
    let tables: Vec<RawTable> = doc
        .select(&selector)
        .filter(|t| {
            !is_hidden(t)
                && !t
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| is_hidden(&a))
        })
        .map(parse_table)
        .filter(|t| {
            if t.is_blank() {
                blank += 1;
                false
            } else {
                true
            }
        })
        .collect();

    debug!(count = tables.len(), blank, "parsed html tables");
    tables
}

fn parse_table(table: ElementRef<'_>) -> RawTable {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();

    for child in element_children(table) {
        if is_hidden(&child) {
            continue;
        }
        match child.value().name() {
            "thead" => head.extend(row_elements(child)),
            "tbody" => body.extend(row_elements(child)),
            "tfoot" => foot.extend(row_elements(child)),
            "tr" => body.push(child),
            _ => {}
        }
    }

    // without a <thead>, leading all-<th> rows are the header
    if head.is_empty() {
        let n = body
            .iter()
            .take_while(|tr| {
                let cells = cell_elements(**tr);
                !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th")
            })
            .count();
        head = body.drain(..n).collect();
    }
    body.extend(foot);

    let mut header_rows = expand_spans(&head);
    let mut rows = expand_spans(&body);

    let width = header_rows
        .iter()
        .chain(rows.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    for row in header_rows.iter_mut().chain(rows.iter_mut()) {
        row.resize(width, String::new());
    }

    trace!(header_levels = header_rows.len(), rows = rows.len(), width, "table grid");
    RawTable { header_rows, rows }
}

/// Expand colspan/rowspan so every grid position holds the text of the cell
/// covering it.
fn expand_spans(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(rows.len());
    // (column index, text, rows still to fill)
    let mut remainder: Vec<(usize, String, usize)> = Vec::new();

    for tr in rows {
        let cells = cell_elements(*tr);
        if cells.is_empty() && remainder.is_empty() {
            continue;
        }

        let mut texts = Vec::new();
        let mut next_remainder = Vec::new();
        let mut index = 0;
        let mut pending = remainder.into_iter().peekable();

        for td in cells {
            while let Some((prev_i, prev_text, prev_rowspan)) =
                pending.next_if(|(prev_i, _, _)| *prev_i <= index)
            {
                texts.push(prev_text.clone());
                if prev_rowspan > 1 {
                    next_remainder.push((prev_i, prev_text, prev_rowspan - 1));
                }
                index += 1;
            }

            let text = cell_text(&td);
            let rowspan = span_attr(&td, "rowspan", MAX_ROWSPAN);
            let colspan = span_attr(&td, "colspan", MAX_COLSPAN);
            for _ in 0..colspan {
                texts.push(text.clone());
                if rowspan > 1 {
                    next_remainder.push((index, text.clone(), rowspan - 1));
                }
                index += 1;
            }
        }

        for (prev_i, prev_text, prev_rowspan) in pending {
            texts.push(prev_text.clone());
            if prev_rowspan > 1 {
                next_remainder.push((prev_i, prev_text, prev_rowspan - 1));
            }
        }

        out.push(texts);
        remainder = next_remainder;
    }

    // rowspans reaching past the last <tr>
    while !remainder.is_empty() {
        let mut texts = Vec::new();
        let mut next_remainder = Vec::new();
        for (prev_i, prev_text, prev_rowspan) in remainder {
            texts.push(prev_text.clone());
            if prev_rowspan > 1 {
                next_remainder.push((prev_i, prev_text, prev_rowspan - 1));
            }
        }
        out.push(texts);
        remainder = next_remainder;
    }

    out
}

fn element_children(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

fn row_elements(section: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element_children(section)
        .filter(|c| c.value().name() == "tr" && !is_hidden(c))
        .collect()
}

fn cell_elements(tr: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element_children(tr)
        .filter(|c| matches!(c.value().name(), "td" | "th") && !is_hidden(c))
        .collect()
}

fn span_attr(cell: &ElementRef<'_>, name: &str, max: usize) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| n.min(max))
        .unwrap_or(1)
}

fn is_hidden(el: &ElementRef<'_>) -> bool {
    el.value().attr("style").is_some_and(|style| {
        let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        compact.to_ascii_lowercase().contains("display:none")
    })
}

/// Visible text of a cell, whitespace-collapsed and trimmed.
fn cell_text(cell: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*cell, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_hidden(&child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}
