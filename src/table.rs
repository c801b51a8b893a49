//! In-memory tables and cell values

use crate::error::{Result, TabmergeError};
use chrono::{NaiveDateTime, Timelike};
use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A decoded, present cell value.
///
/// Equality is exact: values of different variants never compare equal, so
/// `Text("1")` and `Int(1)` differ. Decoders are responsible for normalising
/// representations before a value reaches a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn float(f: f64) -> Self {
        Self::Float(OrderedFloat(f))
    }

    /// Type label used in column listings
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::DateTime(_) => "datetime",
            Self::Text(_) => "text",
        }
    }
}

// Non-finite floats serialise as text so they stay distinct from absent (`null`)
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) if f.0.is_finite() => serializer.serialize_f64(f.0),
            Self::Float(f) => serializer.serialize_str(&f.0.to_string()),
            Self::DateTime(dt) => dt.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v.0),
            Self::DateTime(dt) => {
                if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A table cell; `None` is an absent value
pub type Cell = Option<Value>;

/// One table row, aligned with the table's columns
pub type Row = Vec<Cell>;

/// Render a cell for display; absent cells render as an empty string
pub fn display_cell(cell: &Cell) -> String {
    cell.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Column information for schema listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub absent_count: usize,
}

/// An immutable, named, column-ordered table.
///
/// Every row carries exactly one cell per column. Transformations return new
/// tables and never mutate in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: IndexSet<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table from column names and positional rows
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let name = name.into();
        let mut set = IndexSet::with_capacity(columns.len());
        for column in columns {
            if set.contains(&column) {
                return Err(TabmergeError::column_collision(name, column));
            }
            set.insert(column);
        }

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != set.len() {
                return Err(TabmergeError::MalformedRow {
                    dataset: name,
                    row: idx,
                    expected: set.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Self {
            name,
            columns: set,
            rows,
        })
    }

    /// Build a table from rows given as column-to-cell maps.
    ///
    /// Each record must name every column exactly once; absent values are
    /// spelled out as `None` rather than omitted.
    pub fn from_records(
        name: impl Into<String>,
        columns: Vec<String>,
        records: Vec<IndexMap<String, Cell>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut rows = Vec::with_capacity(records.len());

        for (idx, mut record) in records.into_iter().enumerate() {
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                match record.swap_remove(column) {
                    Some(cell) => row.push(cell),
                    None => {
                        return Err(TabmergeError::MalformedRow {
                            dataset: name,
                            row: idx,
                            expected: columns.len(),
                            found: row.len() + record.len(),
                        })
                    }
                }
            }
            if let Some((extra, _)) = record.into_iter().next() {
                return Err(TabmergeError::unknown_column(name, extra));
            }
            rows.push(row);
        }

        Self::new(name, columns, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().cloned().collect()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.get_index_of(column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cell at (row, column); `None` when either is out of range
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Keep only the given columns, in the given order
    pub fn project(&self, columns: &[String]) -> Result<Table> {
        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let idx = self
                .column_index(column)
                .ok_or_else(|| TabmergeError::unknown_column(&self.name, column))?;
            indices.push(idx);
        }

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Table::new(self.name.clone(), columns.to_vec(), rows)
    }

    /// Rename columns; entries for columns not in the schema are ignored
    pub fn rename(&self, map: &IndexMap<String, String>) -> Result<Table> {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| map.get(c).cloned().unwrap_or_else(|| c.clone()))
            .collect();

        Table::new(self.name.clone(), columns, self.rows.clone())
    }

    /// Describe each column: common value type, nullability and absent count
    pub fn column_info(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut data_type: Option<&'static str> = None;
                let mut mixed = false;
                let mut absent_count = 0;

                for row in &self.rows {
                    match &row[idx] {
                        None => absent_count += 1,
                        Some(value) => match data_type {
                            None => data_type = Some(value.type_name()),
                            Some(t) if t != value.type_name() => mixed = true,
                            Some(_) => {}
                        },
                    }
                }

                let data_type = if mixed {
                    "mixed"
                } else {
                    data_type.unwrap_or("empty")
                };

                ColumnInfo {
                    name: name.clone(),
                    data_type: data_type.to_string(),
                    nullable: absent_count > 0,
                    absent_count,
                }
            })
            .collect()
    }
}
