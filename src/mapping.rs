//! Typed column-role configuration for a comparison request

use crate::dataset::{DatasetBatch, DatasetId};
use crate::error::{Result, TabmergeError};
use crate::unify::ColumnUnifier;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A native column of one dataset, written `dataset:column`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef {
    pub dataset: DatasetId,
    pub column: String,
}

impl FromStr for ColumnRef {
    type Err = TabmergeError;

    /// Splits at the first `:`; column names may themselves contain `:`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TabmergeError::InvalidColumnRef {
            value: s.to_string(),
        };
        let (dataset, column) = s.split_once(':').ok_or_else(invalid)?;
        let dataset = dataset.trim();
        if dataset.is_empty() || column.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            dataset: DatasetId::new(dataset).map_err(|_| invalid())?,
            column: column.to_string(),
        })
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = TabmergeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dataset, self.column)
    }
}

/// Columns from several datasets naming the same real-world attribute.
///
/// The first member's column name becomes the canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnRef>", into = "Vec<ColumnRef>")]
pub struct KeyGroup {
    members: Vec<ColumnRef>,
}

impl KeyGroup {
    pub fn new(members: Vec<ColumnRef>) -> Result<Self> {
        if members.is_empty() {
            return Err(TabmergeError::config("A key group needs at least one column"));
        }
        Ok(Self { members })
    }

    /// Parse a comma-separated list of `dataset:column` references
    pub fn parse(s: &str) -> Result<Self> {
        let members = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ColumnRef::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(members)
    }

    pub fn canonical_name(&self) -> &str {
        &self.members[0].column
    }

    pub fn members(&self) -> &[ColumnRef] {
        &self.members
    }
}

impl TryFrom<Vec<ColumnRef>> for KeyGroup {
    type Error = TabmergeError;

    fn try_from(value: Vec<ColumnRef>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<KeyGroup> for Vec<ColumnRef> {
    fn from(value: KeyGroup) -> Self {
        value.members
    }
}

/// What to join on, what to compare, and what to carry along.
///
/// Compare and view columns use canonical (post-rename) names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPlan {
    #[serde(default)]
    pub keys: Vec<KeyGroup>,
    #[serde(default)]
    pub compare: Vec<String>,
    #[serde(default)]
    pub view: Vec<String>,
}

impl ComparisonPlan {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TabmergeError::config(format!("Invalid comparison plan: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Append key groups and columns given on the command line
    pub fn extend_from_args(&mut self, keys: &[String], compare: &[String], view: &[String]) -> Result<()> {
        for key in keys {
            self.keys.push(KeyGroup::parse(key)?);
        }
        self.compare.extend(compare.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()));
        self.view.extend(view.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()));
        Ok(())
    }

    /// Validate the plan against a batch before any table is touched
    pub fn resolve(&self, batch: &DatasetBatch) -> Result<ResolvedPlan> {
        if self.keys.is_empty() {
            return Err(TabmergeError::EmptyKeyMapping);
        }

        for member in self.keys.iter().flat_map(KeyGroup::members) {
            if !batch.contains(&member.dataset) {
                return Err(TabmergeError::UnknownDataset {
                    dataset: member.dataset.to_string(),
                });
            }
        }

        let unifier = ColumnUnifier::new(&self.keys)?;
        let keys = unifier.canonical_keys();

        let mut seen: IndexSet<&str> = keys.iter().map(String::as_str).collect();
        for column in self.compare.iter().chain(&self.view) {
            if !seen.insert(column.as_str()) {
                return Err(TabmergeError::ColumnRoleConflict {
                    column: column.clone(),
                });
            }
        }

        Ok(ResolvedPlan {
            keys,
            compare: self.compare.clone(),
            view: self.view.clone(),
            unifier,
        })
    }
}

/// A plan validated against a batch
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    pub keys: Vec<String>,
    pub compare: Vec<String>,
    pub view: Vec<String>,
    pub unifier: ColumnUnifier,
}
