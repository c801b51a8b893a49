//! Decoding delimited-text and spreadsheet files into tables

use crate::dataset::{Dataset, DatasetId};
use crate::error::{Result, TabmergeError};
use crate::table::{Cell, Row, Table, Value};
use calamine::{open_workbook_auto, CellErrorType, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::path::Path;

/// Tokens decoded as absent values, in delimited text and spreadsheet strings
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const BOOL_TRUE: &[&str] = &["true", "True", "TRUE"];
const BOOL_FALSE: &[&str] = &["false", "False", "FALSE"];

/// Largest magnitude at which every integer is exactly representable in an f64
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Text,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "txt" => Some(Self::Text),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Loads files into datasets
pub struct DataLoader;

impl DataLoader {
    /// Decode one file into a dataset whose identifier is the file stem
    pub fn load(path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(TabmergeError::invalid_input(format!(
                "File not found: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(TabmergeError::invalid_input(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        let format = FileFormat::from_path(path).ok_or_else(|| {
            TabmergeError::invalid_input(format!("Unsupported file format: {}", path.display()))
        })?;
        let id = DatasetId::from_path(path)?;

        log::debug!("Decoding {} as {:?}", path.display(), format);

        let table = match format {
            FileFormat::Csv => Self::decode_delimited_file(id.as_str(), path, Some(b','))?,
            FileFormat::Tsv => Self::decode_delimited_file(id.as_str(), path, Some(b'\t'))?,
            FileFormat::Text => Self::decode_delimited_file(id.as_str(), path, None)?,
            FileFormat::Spreadsheet => Self::decode_spreadsheet(id.as_str(), path)?,
        };

        log::info!(
            "Loaded '{}': {} rows, {} columns",
            id,
            table.row_count(),
            table.column_count()
        );

        Ok(Dataset::new(id, table).with_source(path.to_path_buf()))
    }

    fn decode_delimited_file(name: &str, path: &Path, delimiter: Option<u8>) -> Result<Table> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            TabmergeError::decode(format!("File is not valid UTF-8: {}", path.display()))
        })?;
        let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
        Self::decode_delimited(name, &content, delimiter)
    }

    /// Decode delimited text; the first record is the header
    pub fn decode_delimited(name: &str, content: &str, delimiter: u8) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = reader.records();
        let header = match records.next() {
            Some(record) => record?,
            None => return Err(TabmergeError::decode(format!("'{}' has no header row", name))),
        };
        let columns = header_names(header.iter().map(str::to_string).collect());
        let width = columns.len();

        // Raw text per column, absent tokens already removed
        let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        for (idx, record) in records.enumerate() {
            let record = record?;
            if record.len() > width {
                return Err(TabmergeError::MalformedRow {
                    dataset: name.to_string(),
                    row: idx,
                    expected: width,
                    found: record.len(),
                });
            }
            for (col, raw) in raw_columns.iter_mut().enumerate() {
                let field = record.get(col).filter(|f| !MISSING_TOKENS.contains(f));
                raw.push(field.map(str::to_string));
            }
        }

        let typed: Vec<Vec<Cell>> = raw_columns.into_iter().map(infer_column).collect();
        let row_count = typed.first().map_or(0, Vec::len);
        let mut rows: Vec<Row> = (0..row_count).map(|_| Vec::with_capacity(width)).collect();
        for column in typed {
            for (row, cell) in rows.iter_mut().zip(column) {
                row.push(cell);
            }
        }

        Table::new(name, columns, rows)
    }

    /// Decode the first sheet of a workbook; the first row is the header
    pub fn decode_spreadsheet(name: &str, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| TabmergeError::decode(format!("'{}' contains no sheets", name)))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut sheet_rows = range.rows();

        let header = match sheet_rows.next() {
            Some(cells) => cells.iter().map(header_text).collect(),
            None => return Err(TabmergeError::decode(format!("'{}' has no header row", name))),
        };
        let columns = header_names(header);
        let width = columns.len();

        let mut rows = Vec::new();
        for cells in sheet_rows {
            let mut row: Row = cells.iter().map(convert_data).collect();
            if row.iter().all(Option::is_none) {
                continue;
            }
            row.resize(width, None);
            rows.push(row);
        }

        Table::new(name, columns, rows)
    }
}

/// Replace blank header names with `Unnamed: <index>`
fn header_names(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Type a column from its raw text: int, then float, then bool, else text
fn infer_column(raw: Vec<Option<String>>) -> Vec<Cell> {
    let all_present = |pred: &dyn Fn(&str) -> bool| raw.iter().flatten().all(|s| pred(s));

    let kind = if all_present(&|s| s.parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if all_present(&|s| s.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if all_present(&|s| BOOL_TRUE.contains(&s) || BOOL_FALSE.contains(&s)) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    };

    raw.into_iter()
        .map(|cell| {
            let s = cell?;
            match kind {
                ColumnKind::Int => s.parse().ok().map(Value::Int),
                ColumnKind::Float => s.parse::<f64>().ok().map(normalize_float),
                ColumnKind::Bool => Some(Value::Bool(BOOL_TRUE.contains(&s.as_str()))),
                ColumnKind::Text => Some(Value::Text(s)),
            }
        })
        .collect()
}

/// Integral floats become ints so that `1.0` and `1` compare equal
fn normalize_float(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
        Value::Int(f as i64)
    } else {
        Value::float(f)
    }
}

fn convert_data(data: &Data) -> Cell {
    match data {
        Data::Empty => None,
        Data::String(s) if MISSING_TOKENS.contains(&s.as_str()) => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Int(i) => Some(Value::Int(*i)),
        Data::Float(f) if f.is_nan() => None,
        Data::Float(f) => Some(normalize_float(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) if dt.is_duration() => {
            Some(dt.as_duration().map_or_else(|| normalize_float(dt.as_f64()), |d| Value::Text(format_duration(d))))
        }
        // Honours the workbook's 1900/1904 date system
        Data::DateTime(dt) => Some(dt.as_datetime().map_or_else(|| normalize_float(dt.as_f64()), Value::DateTime)),
        Data::DateTimeIso(s) => Some(parse_iso_datetime(s).map_or_else(|| Value::Text(s.clone()), Value::DateTime)),
        Data::DurationIso(s) => Some(Value::Text(s.clone())),
        Data::Error(CellErrorType::NA) => None,
        Data::Error(e) => Some(Value::Text(e.to_string())),
    }
}

/// Header cells keep their literal text, even when it reads as a missing token
fn header_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        other => crate::table::display_cell(&convert_data(other)),
    }
}

/// Elapsed time as `[h]:mm:ss`, with milliseconds when present
fn format_duration(d: TimeDelta) -> String {
    let sign = if d < TimeDelta::zero() { "-" } else { "" };
    let d = d.abs();
    let secs = d.num_seconds();
    let millis = d.subsec_nanos() / 1_000_000;
    let base = format!("{}{}:{:02}:{:02}", sign, secs / 3600, (secs / 60) % 60, secs % 60);
    if millis == 0 {
        base
    } else {
        format!("{}.{:03}", base, millis)
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| s.parse::<NaiveDate>().ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Pick the delimiter that splits the first lines into the most consistent
/// number of fields
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b',', b';', b'\t', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| line.as_bytes().iter().filter(|&&b| b == delim).count() + 1)
            .collect();

        let target = match counts.first() {
            Some(&c) if c > 1 => c,
            _ => continue,
        };
        let score = counts.iter().filter(|&&c| c == target).count() * target;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}
