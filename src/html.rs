//! Standalone HTML rendering of a merged comparison

use crate::error::Result;
use crate::session::ComparisonOutcome;
use crate::table::display_cell;
use anyhow::Context;
use std::fmt::Write as _;
use std::path::Path;

const STYLE: &str = "table { border-collapse: collapse; font-family: sans-serif; font-size: 13px; }\n\
th, td { border: 1px solid #ccc; padding: 4px 8px; }\n\
th { background: #f2f2f2; }\n\
td.diff { font-weight: bold; }\n";

pub struct HtmlRenderer;

impl HtmlRenderer {
    /// Render the merged table; flagged cells are red, absent cells empty
    pub fn render(outcome: &ComparisonOutcome) -> String {
        let merged = &outcome.merged;
        let columns = merged.table().column_names();
        let mut out = String::new();

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str("<title>Comparison</title>\n<style>\n");
        out.push_str(STYLE);
        out.push_str("</style>\n</head>\n<body>\n");
        let _ = writeln!(
            out,
            "<p>Reference: <strong>{}</strong> &middot; {} rows &middot; {} flagged cells</p>",
            escape_html(merged.reference().as_str()),
            outcome.summary.total_rows,
            outcome.summary.flagged_cells
        );

        out.push_str("<table>\n<thead>\n<tr>");
        for column in &columns {
            let _ = write!(out, "<th>{}</th>", escape_html(column));
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");

        for (row_idx, row) in merged.rows().iter().enumerate() {
            out.push_str("<tr>");
            for (column, cell) in columns.iter().zip(row) {
                let text = escape_html(&display_cell(cell));
                if outcome.flags.is_flagged(row_idx, column) {
                    let _ = write!(out, "<td class=\"diff\" style=\"color: red\">{}</td>", text);
                } else {
                    let _ = write!(out, "<td>{}</td>", text);
                }
            }
            out.push_str("</tr>\n");
        }

        out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        out
    }

    pub fn write_to(outcome: &ComparisonOutcome, path: &Path) -> Result<()> {
        std::fs::write(path, Self::render(outcome))
            .with_context(|| format!("Failed to write HTML report to {}", path.display()))?;
        log::info!("Wrote HTML report to {}", path.display());
        Ok(())
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
