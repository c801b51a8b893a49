//! Output formatting utilities

use crate::error::Result;
use crate::session::{ComparisonOutcome, DatasetColumns};
use crate::table::Cell;
use serde_json::{json, Value};
use std::fmt::Write as _;

/// How many flagged cells the terminal summary lists
const FLAG_SAMPLE_SIZE: usize = 5;

/// Pretty printer for tabmerge output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print the columns of every loaded dataset
    pub fn print_column_catalog(catalog: &[DatasetColumns]) {
        print!("{}", Self::render_column_catalog(catalog));
    }

    pub fn render_column_catalog(catalog: &[DatasetColumns]) -> String {
        let mut out = String::new();
        for (i, dataset) in catalog.iter().enumerate() {
            let _ = writeln!(out, "📄 {} ({} rows)", dataset.dataset, dataset.row_count);
            if let Some(source) = &dataset.source {
                let _ = writeln!(out, "├─ Source: {}", source.display());
            }
            if dataset.columns.is_empty() {
                let _ = writeln!(out, "└─ No columns");
            }
            for (j, column) in dataset.columns.iter().enumerate() {
                let prefix = if j == dataset.columns.len() - 1 { "└─" } else { "├─" };
                let absent = if column.nullable {
                    format!(", {} absent", column.absent_count)
                } else {
                    String::new()
                };
                let _ = writeln!(out, "{} {} ({}{})", prefix, column.name, column.data_type, absent);
            }
            if i + 1 < catalog.len() {
                out.push('\n');
            }
        }
        out
    }

    /// Print comparison results
    pub fn print_comparison(outcome: &ComparisonOutcome, quiet: bool) {
        print!("{}", Self::render_comparison(outcome, quiet));
    }

    pub fn render_comparison(outcome: &ComparisonOutcome, quiet: bool) -> String {
        let summary = &outcome.summary;
        let merged = &outcome.merged;
        let mut out = String::new();

        if quiet {
            // Machine-readable output
            let _ = writeln!(out, "datasets={}", outcome.datasets.len());
            let _ = writeln!(out, "rows={}", summary.total_rows);
            let _ = writeln!(out, "introduced_rows={}", summary.introduced_rows);
            let _ = writeln!(out, "flagged_cells={}", summary.flagged_cells);
            let _ = writeln!(out, "rows_with_flags={}", summary.rows_with_flags);
            let _ = writeln!(out, "fingerprint={}", outcome.fingerprint);
            return out;
        }

        let _ = writeln!(out, "🔍 Comparison against '{}'", merged.reference());
        let others: Vec<String> = merged.others().iter().map(|d| d.to_string()).collect();
        let _ = writeln!(out, "├─ Compared: {}", others.join(", "));
        let _ = writeln!(out, "├─ Keys: {}", merged.keys().join(", "));
        let _ = writeln!(
            out,
            "├─ Rows: {} ({} from reference, {} introduced)",
            summary.total_rows, summary.reference_rows, summary.introduced_rows
        );

        if summary.has_differences() {
            let _ = writeln!(
                out,
                "├─ ❌ Flagged cells: {} in {} rows",
                summary.flagged_cells, summary.rows_with_flags
            );
            for (column, count) in &summary.flags_by_column {
                let _ = writeln!(out, "│  ├─ {}: {}", column, count);
            }

            let sample: Vec<(usize, &str)> = outcome.flags.iter().take(FLAG_SAMPLE_SIZE).collect();
            let _ = writeln!(out, "│  └─ Sample:");
            for (i, (row, column)) in sample.iter().enumerate() {
                let marker = if i == sample.len() - 1 { "└─" } else { "├─" };
                let canonical = merged.column(column).map(|c| c.canonical.as_str()).unwrap_or(column);
                let _ = writeln!(
                    out,
                    "│     {} [{}] {}: {} (reference: {})",
                    marker,
                    merged.key_label(*row),
                    column,
                    show(merged.get(*row, column)),
                    show(merged.get(*row, canonical))
                );
            }
            if summary.flagged_cells > sample.len() {
                let _ = writeln!(out, "│        ... and {} more", summary.flagged_cells - sample.len());
            }
        } else {
            let _ = writeln!(out, "├─ ✅ No differences from the reference");
        }

        let _ = writeln!(out, "└─ Fingerprint: {}", outcome.fingerprint);
        out
    }
}

fn show(cell: Option<&Cell>) -> String {
    match cell {
        Some(Some(value)) => format!("'{}'", value),
        _ => "<absent>".to_string(),
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    pub fn format_column_catalog(catalog: &[DatasetColumns]) -> Result<String> {
        Self::format(catalog)
    }

    /// Session metadata, column origins, rows as arrays, flags and summary
    pub fn comparison_value(outcome: &ComparisonOutcome) -> Result<Value> {
        let merged = &outcome.merged;
        let rows: Vec<&[Cell]> = merged.rows().iter().map(Vec::as_slice).collect();

        Ok(json!({
            "session_id": outcome.session_id,
            "created": outcome.created,
            "reference": merged.reference(),
            "datasets": outcome.datasets,
            "keys": merged.keys(),
            "columns": serde_json::to_value(merged.columns())?,
            "rows": serde_json::to_value(rows)?,
            "flags": serde_json::to_value(&outcome.flags)?,
            "summary": serde_json::to_value(&outcome.summary)?,
            "fingerprint": outcome.fingerprint,
        }))
    }

    pub fn format_comparison(outcome: &ComparisonOutcome) -> Result<String> {
        Self::format(&Self::comparison_value(outcome)?)
    }
}
