//! Plain-text rendering of result rows
//!
//! Produces aligned terminal output for SELECT results:
//! ```text
//! id | name
//! ---+------
//! 1  | Alice
//! (1 row)
//! ```
//! The core engine never prints; the shell (or any other embedder) decides
//! where this text goes.

use crate::storage::table::ResultRow;
use std::fmt::Write as FmtWrite;

/// Format result rows as an aligned text table with a trailing row count.
///
/// All rows of one result share the same columns, so the header comes from
/// the first row. An empty result renders as just `(0 rows)`.
pub fn render_rows(rows: &[ResultRow]) -> String {
    let mut out = String::new();

    if let Some(first) = rows.first() {
        let headers: Vec<&str> = first.columns().collect();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|(_, value)| value.to_string()).collect())
            .collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        render_line(&mut out, &headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        // Using write! on String is infallible.
        let _ = writeln!(out, "{}", rule.join("-+-"));
        for row in &cells {
            let strs: Vec<&str> = row.iter().map(String::as_str).collect();
            render_line(&mut out, &strs, &widths);
        }
    }

    let _ = writeln!(
        out,
        "({} {})",
        rows.len(),
        if rows.len() == 1 { "row" } else { "rows" }
    );
    out
}

fn render_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}
