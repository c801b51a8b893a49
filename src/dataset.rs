//! Datasets, their identifiers, and the batch a comparison runs over

use crate::error::{Result, TabmergeError};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identifier of a dataset within one batch.
///
/// Derived from the uploaded file's name with the extension removed; it is
/// also the suffix given to that dataset's columns in a merged table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Use `id` verbatim; it must be non-empty and free of `:`
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.contains(':') {
            return Err(TabmergeError::invalid_input(format!(
                "Invalid dataset identifier: '{}'",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Derive an identifier from a file path: sanitised file stem
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                TabmergeError::invalid_input(format!("Invalid file name: {}", path.display()))
            })?;

        Self::new(sanitize_file_name(stem)).map_err(|_| {
            TabmergeError::invalid_input(format!(
                "Cannot derive a dataset identifier from '{}'",
                path.display()
            ))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce a file name to ASCII letters, digits, `.`, `_` and `-`.
///
/// Whitespace runs become a single `_`; everything else is dropped.
/// Leading and trailing `.`/`_` are trimmed.
fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for ch in name.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            if pending_space && !out.is_empty() {
                out.push('_');
            }
            pending_space = false;
            out.push(ch);
        }
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// A decoded dataset and where it came from
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub source: Option<PathBuf>,
    pub table: Table,
}

impl Dataset {
    pub fn new(id: DatasetId, table: Table) -> Self {
        Self {
            id,
            source: None,
            table,
        }
    }

    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }
}

/// An ordered set of datasets with unique identifiers.
///
/// The first dataset is the reference for every comparison.
#[derive(Debug, Clone)]
pub struct DatasetBatch {
    datasets: Vec<Dataset>,
}

impl DatasetBatch {
    /// Fails on fewer than two datasets or on duplicate identifiers
    pub fn new(datasets: Vec<Dataset>) -> Result<Self> {
        if datasets.len() < 2 {
            return Err(TabmergeError::InsufficientDatasets {
                count: datasets.len(),
            });
        }

        for (idx, dataset) in datasets.iter().enumerate() {
            if datasets[..idx].iter().any(|d| d.id == dataset.id) {
                let path = dataset
                    .source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<memory>".to_string());
                return Err(TabmergeError::DuplicateDatasetId {
                    id: dataset.id.to_string(),
                    path,
                });
            }
        }

        Ok(Self { datasets })
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn reference(&self) -> &Dataset {
        &self.datasets[0]
    }

    pub fn ids(&self) -> Vec<DatasetId> {
        self.datasets.iter().map(|d| d.id.clone()).collect()
    }

    pub fn get(&self, id: &DatasetId) -> Option<&Dataset> {
        self.datasets.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DatasetId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
