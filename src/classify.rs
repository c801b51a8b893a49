//! Flagging cells where another dataset disagrees with the reference

use crate::dataset::DatasetId;
use crate::error::{Result, TabmergeError};
use crate::merge::{merged_column_name, MergedTable};
use crate::table::Cell;
use indexmap::IndexMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Set of flagged `(row, merged column)` cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffFlagSet {
    flags: BTreeMap<usize, BTreeSet<String>>,
}

impl DiffFlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the cell was already flagged
    pub fn insert(&mut self, row: usize, column: impl Into<String>) -> bool {
        self.flags.entry(row).or_default().insert(column.into())
    }

    pub fn is_flagged(&self, row: usize, column: &str) -> bool {
        self.flags
            .get(&row)
            .map(|columns| columns.contains(column))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flags in row order, then column name order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.flags
            .iter()
            .flat_map(|(row, columns)| columns.iter().map(move |c| (*row, c.as_str())))
    }

    /// Number of rows carrying at least one flag
    pub fn rows_flagged(&self) -> usize {
        self.flags.len()
    }

    pub fn counts_by_column(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, column) in self.iter() {
            *counts.entry(column.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Serialize)]
struct FlagEntry<'a> {
    row: usize,
    column: &'a str,
}

impl Serialize for DiffFlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (row, column) in self.iter() {
            seq.serialize_element(&FlagEntry { row, column })?;
        }
        seq.end()
    }
}

/// A present value that is new or differs from the reference
pub fn differs(reference: &Cell, candidate: &Cell) -> bool {
    match (reference, candidate) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(r), Some(c)) => r != c,
    }
}

pub struct DiffClassifier;

impl DiffClassifier {
    /// Flag every `<column>_<dataset>` cell that disagrees with `<column>`.
    ///
    /// Only non-reference compare columns are ever flagged; an absent
    /// candidate never is, whatever the reference holds.
    pub fn classify(merged: &MergedTable, compare: &[String], others: &[DatasetId]) -> Result<DiffFlagSet> {
        let table = merged.table();
        let reference = merged.reference();

        let mut pairs: IndexMap<String, (usize, usize)> = IndexMap::new();
        for column in compare {
            let ref_idx = table
                .column_index(column)
                .ok_or_else(|| TabmergeError::unknown_column(reference.as_str(), column))?;
            for dataset in others {
                let name = merged_column_name(column, dataset, false);
                let cmp_idx = table
                    .column_index(&name)
                    .ok_or_else(|| TabmergeError::unknown_column(dataset.as_str(), &name))?;
                pairs.insert(name, (ref_idx, cmp_idx));
            }
        }

        let mut flags = DiffFlagSet::new();
        for (row_idx, row) in table.rows().iter().enumerate() {
            for (name, &(ref_idx, cmp_idx)) in &pairs {
                if differs(&row[ref_idx], &row[cmp_idx]) {
                    flags.insert(row_idx, name.clone());
                }
            }
        }

        log::debug!(
            "Classified {} rows across {} column pair(s): {} flagged cell(s)",
            table.row_count(),
            pairs.len(),
            flags.len()
        );
        Ok(flags)
    }
}
