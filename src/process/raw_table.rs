#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// Header labels, one row per header level, already expanded for colspan/rowspan.
    /// Empty when the table had no header rows.
    pub header_rows: Vec<Vec<String>>,
    /// Each body row, as a Vec of Strings (one per grid position).
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Widest row across header and body.
    pub fn width(&self) -> usize {
        self.header_rows
            .iter()
            .chain(self.rows.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    /// True when no header or body cell holds any text.
    pub fn is_blank(&self) -> bool {
        self.header_rows
            .iter()
            .chain(self.rows.iter())
            .flatten()
            .all(|c| c.is_empty())
    }

    /// All cells of column `idx`, empty strings for short rows.
    pub fn column_cells(&self, idx: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
            .collect()
    }
}
