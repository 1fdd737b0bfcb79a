use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("csv decode error: {0}")]
pub struct GridDecodeError(#[from] csv::Error);

/// Ragged 2-D block of string cells as read from the sheet.
///
/// Rows keep whatever length the backend produced. Out-of-range lookups
/// through [`RawGrid::cell`] yield an empty string instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Decodes CSV text, keeping every record. The first line is data, not a
    /// header, so row offsets match the sheet's own numbering. Blank lines are
    /// kept as empty rows for the same reason.
    pub fn from_csv(input: &str) -> Result<Self, GridDecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input.as_bytes());
        let mut rows = Vec::new();
        let mut record = csv::StringRecord::new();
        loop {
            let start = reader.position().byte() as usize;
            if !reader.read_record(&mut record)? {
                break;
            }
            // The reader drops empty lines silently.
            let skipped = blank_lines_at(input.as_bytes(), start);
            rows.extend(std::iter::repeat_with(Vec::new).take(skipped));
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Counts the empty lines starting at `start`. A `\n` completing the previous
/// record's `\r\n` is not a line of its own.
fn blank_lines_at(input: &[u8], start: usize) -> usize {
    let mut pos = start;
    if pos > 0 && input.get(pos - 1) == Some(&b'\r') && input.get(pos) == Some(&b'\n') {
        pos += 1;
    }
    let mut count = 0;
    loop {
        match input.get(pos) {
            Some(b'\n') => pos += 1,
            Some(b'\r') if input.get(pos + 1) == Some(&b'\n') => pos += 2,
            Some(b'\r') => pos += 1,
            _ => return count,
        }
        count += 1;
    }
}

impl From<Vec<Vec<String>>> for RawGrid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_degrades_to_empty_string() {
        let grid = RawGrid::new(vec![vec!["a".to_string()], vec![]]);
        assert_eq!(grid.cell(0, 0), "a");
        assert_eq!(grid.cell(0, 5), "");
        assert_eq!(grid.cell(1, 0), "");
        assert_eq!(grid.cell(9, 9), "");
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn csv_keeps_first_line_and_ragged_records() {
        let grid = RawGrid::from_csv("title,,\nx,\"gemini-2\",Active,fb\nonly\n")
            .expect("decode csv");
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.cell(0, 0), "title");
        assert_eq!(grid.row(1).map(<[String]>::len), Some(4));
        assert_eq!(grid.cell(1, 1), "gemini-2");
        assert_eq!(grid.row(2).map(<[String]>::len), Some(1));
    }

    #[test]
    fn csv_preserves_quoted_commas_and_emoji() {
        let grid = RawGrid::from_csv("a,\"Coder, Bot\",✅\n").expect("decode csv");
        assert_eq!(grid.cell(0, 1), "Coder, Bot");
        assert_eq!(grid.cell(0, 2), "✅");
    }

    #[test]
    fn blank_lines_are_kept_as_empty_rows() {
        let grid = RawGrid::from_csv("a\n\n,,,\n\n\nb\n\n").expect("decode csv");
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.row(1).map(<[String]>::len), Some(0));
        assert_eq!(grid.row(2).map(<[String]>::len), Some(4));
        assert_eq!(grid.row(3).map(<[String]>::len), Some(0));
        assert_eq!(grid.row(4).map(<[String]>::len), Some(0));
        assert_eq!(grid.cell(5, 0), "b");
    }

    #[test]
    fn leading_blank_lines_and_crlf_keep_offsets() {
        let grid = RawGrid::from_csv("\r\nx,y\r\n\r\nz\r\n").expect("decode csv");
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.row(0).map(<[String]>::len), Some(0));
        assert_eq!(grid.cell(1, 1), "y");
        assert_eq!(grid.row(2).map(<[String]>::len), Some(0));
        assert_eq!(grid.cell(3, 0), "z");
    }

    #[test]
    fn quoted_newlines_do_not_count_as_blank_rows() {
        let grid = RawGrid::from_csv("\"multi\n\nline\",b\nc\n").expect("decode csv");
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(0, 0), "multi\n\nline");
        assert_eq!(grid.cell(1, 0), "c");
    }

    #[test]
    fn empty_csv_is_empty_grid() {
        let grid = RawGrid::from_csv("").expect("decode csv");
        assert!(grid.is_empty());
    }
}
