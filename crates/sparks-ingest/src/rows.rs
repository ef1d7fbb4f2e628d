//! CSV row parsing
//!
//! Sheet exports are parsed without headers into ordered rows of cells. Rows
//! may be ragged; quoted cells may contain commas, doubled quotes and line
//! breaks. Blank rows are dropped. A record that cannot be decoded is logged
//! and skipped, never fatal.

use tracing::{debug, warn};

use crate::error::IngestError;

/// One sheet row, cells in column order
pub type Row = Vec<String>;

/// Parse CSV text into rows, preserving source order
pub fn parse_rows(text: &str) -> Vec<Row> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut blank = 0usize;
    let mut malformed = 0usize;

    for (index, result) in reader.byte_records().enumerate() {
        match result {
            Ok(record) => {
                let cells: Row = record
                    .iter()
                    .map(|cell| String::from_utf8_lossy(cell).into_owned())
                    .collect();

                if cells.iter().all(|c| c.trim().is_empty()) {
                    blank += 1;
                    continue;
                }

                rows.push(cells);
            },
            Err(e) => {
                let err = IngestError::MalformedRow {
                    line: e
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(index as u64 + 1),
                    reason: e.to_string(),
                };
                warn!(error = %err, "Skipping malformed row");
                malformed += 1;
            },
        }
    }

    debug!(rows = rows.len(), blank, malformed, "Parsed CSV");
    rows
}

/// Trimmed cell at `index`, empty when the row is shorter
pub(crate) fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|c| c.trim()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_simple_rows() {
        let rows = parse_rows("a,b,c\n1,2,3\n");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_parse_quoted_cells() {
        let text = "\"Track\",\"File Name\"\n\"7\",\"Hello, \"\"world\"\"\"\n\"8\",\"line one\nline two\"\n";
        let rows = parse_rows(text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["7", "Hello, \"world\""]);
        assert_eq!(rows[2], vec!["8", "line one\nline two"]);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let rows = parse_rows("a\nb,c,d\ne,f\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[2].len(), 2);
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let rows = parse_rows("a,b\n\n,,\n\" \",\"\"\nc,d\n\n\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = parse_rows("a,b\r\nc,d\r\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_unterminated_quote_recovers() {
        let rows = parse_rows("a,b\nc,\"d\n");
        assert_eq!(rows[0], vec!["a", "b"]);
        assert_eq!(rows[1][0], "c");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_cell_helper() {
        let row: Row = vec![" x ".to_string()];
        assert_eq!(cell(&row, 0), "x");
        assert_eq!(cell(&row, 5), "");
    }

    fn plain_cell() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{0,8}"
    }

    fn any_cell() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ,\"\n]{0,8}"
    }

    fn quote(cell: &str) -> String {
        format!("\"{}\"", cell.replace('"', "\"\""))
    }

    proptest! {
        #[test]
        fn prop_never_panics(text in ".{0,200}") {
            let _ = parse_rows(&text);
        }

        #[test]
        fn prop_no_plain_row_is_lost(
            table in prop::collection::vec(prop::collection::vec(plain_cell(), 1..6), 0..20)
        ) {
            let text: String = table
                .iter()
                .map(|row| format!("{}\n", row.join(",")))
                .collect();

            let expected: Vec<&Vec<String>> = table
                .iter()
                .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
                .collect();

            let rows = parse_rows(&text);
            prop_assert_eq!(rows.len(), expected.len());
            for (parsed, source) in rows.iter().zip(expected) {
                prop_assert_eq!(parsed, source);
            }
        }

        #[test]
        fn prop_quoted_cells_survive(
            table in prop::collection::vec(prop::collection::vec(any_cell(), 1..5), 1..10)
        ) {
            let text: String = table
                .iter()
                .map(|row| {
                    let cells: Vec<String> = row.iter().map(|c| quote(c)).collect();
                    format!("{}\n", cells.join(","))
                })
                .collect();

            let expected: Vec<&Vec<String>> = table
                .iter()
                .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
                .collect();

            let rows = parse_rows(&text);
            prop_assert_eq!(rows.len(), expected.len());
            for (parsed, source) in rows.iter().zip(expected) {
                prop_assert_eq!(parsed, source);
            }
        }
    }
}
