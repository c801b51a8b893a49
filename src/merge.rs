//! Outer-joining any number of tables on canonical key columns

use crate::dataset::DatasetId;
use crate::error::{Result, TabmergeError};
use crate::table::{display_cell, Cell, Row, Table};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Role of a merged column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Key,
    Compare,
    View,
}

/// Where a merged column came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedColumn {
    pub name: String,
    pub canonical: String,
    /// Owning dataset; `None` for key columns, which all datasets share
    pub dataset: Option<DatasetId>,
    pub kind: ColumnKind,
}

/// Name of a non-key column in the merged table.
///
/// The reference keeps the canonical name; every other dataset gets
/// `<canonical>_<dataset>` whether or not a collision would occur.
pub fn merged_column_name(canonical: &str, dataset: &DatasetId, is_reference: bool) -> String {
    if is_reference {
        canonical.to_string()
    } else {
        format!("{}_{}", canonical, dataset)
    }
}

/// Result of a key join, with per-column provenance
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    table: Table,
    keys: Vec<String>,
    datasets: Vec<DatasetId>,
    columns: Vec<MergedColumn>,
    reference_rows: usize,
}

impl MergedTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn datasets(&self) -> &[DatasetId] {
        &self.datasets
    }

    pub fn reference(&self) -> &DatasetId {
        &self.datasets[0]
    }

    /// Every dataset after the reference
    pub fn others(&self) -> &[DatasetId] {
        &self.datasets[1..]
    }

    pub fn columns(&self) -> &[MergedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&MergedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Row] {
        self.table.rows()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Rows whose key appears in the reference dataset
    pub fn reference_row_count(&self) -> usize {
        self.reference_rows
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        self.table.get(row, column)
    }

    /// Human-readable key of a row, e.g. `ID=3, Region=EU`
    pub fn key_label(&self, row: usize) -> String {
        let cells = self.table.rows().get(row).map(|r| &r[..self.keys.len()]);
        match cells {
            Some(cells) => format_key(&self.keys, cells),
            None => String::new(),
        }
    }
}

fn format_key(keys: &[String], cells: &[Cell]) -> String {
    keys.iter()
        .zip(cells)
        .map(|(k, c)| format!("{}={}", k, display_cell(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sequential outer join over an ordered list of tables
pub struct KeyJoinMerger;

impl KeyJoinMerger {
    /// Merge `tables` on `keys`; `tables[0]` is the reference.
    ///
    /// Rows come out in reference order, followed by keys first seen in later
    /// datasets in the order they are encountered. A key tuple must be unique
    /// within each dataset. Absent key cells match each other.
    pub fn merge(
        tables: &[(DatasetId, Table)],
        keys: &[String],
        compare: &[String],
        view: &[String],
    ) -> Result<MergedTable> {
        if tables.len() < 2 {
            return Err(TabmergeError::EmptyDatasetList {
                count: tables.len(),
            });
        }

        let projection: Vec<String> = keys.iter().chain(compare).chain(view).cloned().collect();
        let key_width = keys.len();
        let block_width = compare.len() + view.len();

        let mut names: IndexSet<String> = IndexSet::new();
        let mut columns: Vec<MergedColumn> = Vec::new();
        for key in keys {
            names.insert(key.clone());
            columns.push(MergedColumn {
                name: key.clone(),
                canonical: key.clone(),
                dataset: None,
                kind: ColumnKind::Key,
            });
        }

        for (pos, (id, _)) in tables.iter().enumerate() {
            let block = compare
                .iter()
                .map(|c| (c, ColumnKind::Compare))
                .chain(view.iter().map(|c| (c, ColumnKind::View)));
            for (canonical, kind) in block {
                let name = merged_column_name(canonical, id, pos == 0);
                if !names.insert(name.clone()) {
                    return Err(TabmergeError::column_collision(id.as_str(), name));
                }
                columns.push(MergedColumn {
                    name,
                    canonical: canonical.clone(),
                    dataset: Some(id.clone()),
                    kind,
                });
            }
        }

        let width = columns.len();
        let mut rows: Vec<Row> = Vec::new();
        let mut index: HashMap<Vec<Cell>, usize> = HashMap::new();
        let mut reference_rows = 0;

        for (pos, (id, table)) in tables.iter().enumerate() {
            for key in keys {
                if !table.has_column(key) {
                    return Err(TabmergeError::KeyColumnMissing {
                        dataset: id.to_string(),
                        column: key.clone(),
                    });
                }
            }

            let projected = table.project(&projection)?;
            let offset = key_width + pos * block_width;
            let mut seen: HashSet<&[Cell]> = HashSet::with_capacity(projected.row_count());
            let mut matched = 0usize;

            for row in projected.rows() {
                let key = &row[..key_width];
                if !seen.insert(key) {
                    return Err(TabmergeError::DuplicateKey {
                        dataset: id.to_string(),
                        key: format_key(keys, key),
                    });
                }

                let target = match index.get(key) {
                    Some(&existing) => {
                        matched += 1;
                        existing
                    }
                    None => {
                        let mut merged_row: Row = vec![None; width];
                        merged_row[..key_width].clone_from_slice(key);
                        rows.push(merged_row);
                        index.insert(key.to_vec(), rows.len() - 1);
                        rows.len() - 1
                    }
                };

                rows[target][offset..offset + block_width].clone_from_slice(&row[key_width..]);
            }

            if pos == 0 {
                reference_rows = rows.len();
            }
            log::debug!(
                "Joined '{}': {} rows, {} matched existing keys, {} total",
                id,
                projected.row_count(),
                matched,
                rows.len()
            );
        }

        let table = Table::new("merged", names.into_iter().collect(), rows)?;

        Ok(MergedTable {
            table,
            keys: keys.to_vec(),
            datasets: tables.iter().map(|(id, _)| id.clone()).collect(),
            columns,
            reference_rows,
        })
    }
}
