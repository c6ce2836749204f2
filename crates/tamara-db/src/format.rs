//! Plain-text rendering of query results for the model.

use crate::row::{scalar_text, Row};

/// Rows listed before the remainder is summarized.
pub const MAX_LISTED_ROWS: usize = 15;

/// A single scalar renders as the bare value, a single row as the row, and
/// anything else as a numbered list capped at [`MAX_LISTED_ROWS`].
pub fn format_rows(rows: &[Row]) -> String {
    if let [row] = rows {
        if row.len() == 1 {
            return row
                .first()
                .and_then(scalar_text)
                .unwrap_or_else(|| "None".into());
        }
        return row.to_string();
    }

    let mut lines = vec![format!("Found {} results:", rows.len())];
    lines.extend(
        rows.iter()
            .take(MAX_LISTED_ROWS)
            .enumerate()
            .map(|(i, row)| format!("  {}. {row}", i + 1)),
    );
    if rows.len() > MAX_LISTED_ROWS {
        lines.push(format!(
            "  ... and {} more results.",
            rows.len() - MAX_LISTED_ROWS
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64) -> Row {
        [("id", json!(id)), ("name", json!(format!("u{id}")))]
            .into_iter()
            .collect()
    }

    #[test]
    fn single_scalar_is_bare() {
        let rows = [[("count", json!(42))].into_iter().collect::<Row>()];
        assert_eq!(format_rows(&rows), "42");
    }

    #[test]
    fn single_row_is_the_row() {
        assert_eq!(format_rows(&[row(7)]), "{'id': 7, 'name': 'u7'}");
    }

    #[test]
    fn few_rows_are_numbered() {
        let out = format_rows(&[row(1), row(2)]);
        assert_eq!(
            out,
            "Found 2 results:\n  1. {'id': 1, 'name': 'u1'}\n  2. {'id': 2, 'name': 'u2'}"
        );
    }

    #[test]
    fn many_rows_are_capped() {
        let rows: Vec<Row> = (1..=20).map(row).collect();
        let out = format_rows(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Found 20 results:");
        assert_eq!(lines.len(), 1 + MAX_LISTED_ROWS + 1);
        assert!(lines[15].starts_with("  15. "));
        assert_eq!(lines[16], "  ... and 5 more results.");
    }
}
