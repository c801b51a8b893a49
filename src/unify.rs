//! Renaming each dataset's key columns to their canonical names

use crate::dataset::DatasetId;
use crate::error::{Result, TabmergeError};
use crate::mapping::KeyGroup;
use crate::table::Table;
use indexmap::IndexMap;

/// Per-dataset rename rules derived from key groups
#[derive(Debug, Clone, Default)]
pub struct ColumnUnifier {
    keys: Vec<String>,
    renames: IndexMap<DatasetId, IndexMap<String, String>>,
}

impl ColumnUnifier {
    /// Build rename maps; each canonical name and each native column may be
    /// claimed by one group only
    pub fn new(groups: &[KeyGroup]) -> Result<Self> {
        let mut keys: Vec<String> = Vec::with_capacity(groups.len());
        let mut renames: IndexMap<DatasetId, IndexMap<String, String>> = IndexMap::new();

        for group in groups {
            let canonical = group.canonical_name();
            if keys.iter().any(|k| k == canonical) {
                return Err(TabmergeError::ambiguous_key_mapping(format!(
                    "canonical name '{}' is declared by more than one key group",
                    canonical
                )));
            }
            keys.push(canonical.to_string());

            for member in group.members() {
                let map = renames.entry(member.dataset.clone()).or_default();
                if let Some(previous) = map.get(&member.column) {
                    return Err(TabmergeError::ambiguous_key_mapping(format!(
                        "'{}' is mapped to both '{}' and '{}'",
                        member, previous, canonical
                    )));
                }
                map.insert(member.column.clone(), canonical.to_string());
            }
        }

        Ok(Self { keys, renames })
    }

    /// Canonical key names in declaration order
    pub fn canonical_keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    /// Apply a dataset's renames; every declared native column must exist
    pub fn unify(&self, dataset: &DatasetId, table: &Table) -> Result<Table> {
        let Some(map) = self.renames.get(dataset) else {
            return Ok(table.clone());
        };

        for native in map.keys() {
            if !table.has_column(native) {
                return Err(TabmergeError::missing_key_column(dataset.as_str(), native));
            }
        }

        log::debug!("Unifying '{}' with {} rename(s)", dataset, map.len());
        table.rename(map)
    }
}
