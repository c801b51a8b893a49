//! Excel export of a merged comparison

use crate::error::{Result, TabmergeError};
use crate::session::ComparisonOutcome;
use crate::table::Value;
use chrono::Timelike;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use std::path::Path;

/// Sheet holding the merged table
pub const SHEET_NAME: &str = "Comparison";

/// File name used when no output path is given
pub const DEFAULT_FILE_NAME: &str = "comparison_result.xlsx";

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Integers beyond this magnitude lose precision as Excel doubles
const MAX_EXACT_INT: u64 = 1 << 53;

struct CellFormats {
    header: Format,
    plain: Format,
    date: Format,
    datetime: Format,
    flagged: Format,
    flagged_date: Format,
    flagged_datetime: Format,
}

impl CellFormats {
    fn new() -> Self {
        let red = |f: Format| f.set_font_color(Color::Red);
        Self {
            header: Format::new().set_bold(),
            plain: Format::new(),
            date: Format::new().set_num_format(DATE_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_FORMAT),
            flagged: red(Format::new()),
            flagged_date: red(Format::new().set_num_format(DATE_FORMAT)),
            flagged_datetime: red(Format::new().set_num_format(DATETIME_FORMAT)),
        }
    }

    fn for_value(&self, value: &Value, flagged: bool) -> &Format {
        let date_only = matches!(
            value,
            Value::DateTime(dt) if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0
        );
        match (value, flagged) {
            (Value::DateTime(_), false) if date_only => &self.date,
            (Value::DateTime(_), false) => &self.datetime,
            (Value::DateTime(_), true) if date_only => &self.flagged_date,
            (Value::DateTime(_), true) => &self.flagged_datetime,
            (_, false) => &self.plain,
            (_, true) => &self.flagged,
        }
    }
}

pub struct XlsxExporter;

impl XlsxExporter {
    /// Build the workbook in memory
    pub fn build(outcome: &ComparisonOutcome) -> Result<Workbook> {
        let merged = &outcome.merged;
        let formats = CellFormats::new();
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;

        let columns = merged.table().column_names();
        for (col_idx, column) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, excel_col(col_idx)?, column, &formats.header)?;
        }

        for (row_idx, row) in merged.rows().iter().enumerate() {
            let excel_row = excel_row(row_idx + 1)?;
            for (col_idx, (column, cell)) in columns.iter().zip(row).enumerate() {
                // Absent cells stay blank
                let Some(value) = cell else { continue };
                let format = formats.for_value(value, outcome.flags.is_flagged(row_idx, column));
                write_value(worksheet, excel_row, excel_col(col_idx)?, value, format)?;
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();
        Ok(workbook)
    }

    pub fn write_to(outcome: &ComparisonOutcome, path: &Path) -> Result<()> {
        let mut workbook = Self::build(outcome)?;
        workbook.save(path)?;
        log::info!("Wrote Excel report to {}", path.display());
        Ok(())
    }
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value, format: &Format) -> Result<()> {
    match value {
        Value::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
        Value::Int(i) if i.unsigned_abs() <= MAX_EXACT_INT => {
            worksheet.write_number_with_format(row, col, *i as f64, format)?;
        }
        // Stored as text to keep every digit
        Value::Int(i) => {
            worksheet.write_string_with_format(row, col, i.to_string(), format)?;
        }
        Value::Float(f) if f.0.is_finite() => {
            worksheet.write_number_with_format(row, col, f.0, format)?;
        }
        Value::Float(f) => {
            worksheet.write_string_with_format(row, col, f.0.to_string(), format)?;
        }
        Value::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, format)?;
        }
        Value::Text(s) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
    }
    Ok(())
}

fn excel_row(idx: usize) -> Result<u32> {
    u32::try_from(idx)
        .ok()
        .filter(|r| *r < 1_048_576)
        .ok_or_else(|| TabmergeError::invalid_input(format!("Row {} exceeds the Excel sheet limit", idx)))
}

fn excel_col(idx: usize) -> Result<u16> {
    u16::try_from(idx)
        .ok()
        .filter(|c| *c < 16_384)
        .ok_or_else(|| TabmergeError::invalid_input(format!("Column {} exceeds the Excel sheet limit", idx)))
}
