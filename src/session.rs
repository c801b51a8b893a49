//! Request-scoped comparison state

use crate::classify::{DiffClassifier, DiffFlagSet};
use crate::data::DataLoader;
use crate::dataset::{Dataset, DatasetBatch, DatasetId};
use crate::error::{Result, TabmergeError};
use crate::hash::{HashComputer, HashValue};
use crate::mapping::ComparisonPlan;
use crate::merge::{KeyJoinMerger, MergedTable};
use crate::progress::ProgressReporter;
use crate::table::{ColumnInfo, Table};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Headline numbers for one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub total_rows: usize,
    pub reference_rows: usize,
    /// Rows whose key the reference does not contain
    pub introduced_rows: usize,
    pub flagged_cells: usize,
    pub rows_with_flags: usize,
    pub flags_by_column: BTreeMap<String, usize>,
}

impl ComparisonSummary {
    pub fn from_result(merged: &MergedTable, flags: &DiffFlagSet) -> Self {
        Self {
            total_rows: merged.row_count(),
            reference_rows: merged.reference_row_count(),
            introduced_rows: merged.row_count() - merged.reference_row_count(),
            flagged_cells: flags.len(),
            rows_with_flags: flags.rows_flagged(),
            flags_by_column: flags.counts_by_column(),
        }
    }

    pub fn has_differences(&self) -> bool {
        self.flagged_cells > 0
    }
}

/// Everything a renderer needs
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub session_id: Uuid,
    pub created: DateTime<Utc>,
    pub datasets: Vec<DatasetId>,
    pub plan: ComparisonPlan,
    pub merged: MergedTable,
    pub flags: DiffFlagSet,
    pub summary: ComparisonSummary,
    pub fingerprint: HashValue,
}

/// Columns of one dataset, for column listings
#[derive(Debug, Clone, Serialize)]
pub struct DatasetColumns {
    pub dataset: DatasetId,
    pub source: Option<PathBuf>,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
}

/// One upload-and-compare request.
///
/// Owns its datasets; nothing is shared between sessions.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    id: Uuid,
    created: DateTime<Utc>,
    batch: DatasetBatch,
}

impl ComparisonSession {
    /// Decode every file, in order; the first becomes the reference
    pub fn load(paths: &[PathBuf], progress: &mut ProgressReporter) -> Result<Self> {
        if paths.len() < 2 {
            return Err(TabmergeError::InsufficientDatasets { count: paths.len() });
        }

        let mut datasets = Vec::with_capacity(paths.len());
        for (idx, path) in paths.iter().enumerate() {
            let dataset = DataLoader::load(path)?;
            progress.update_load(idx as u64 + 1, &format!("Loaded '{}'", dataset.id));
            datasets.push(dataset);
        }
        progress.finish_load(&format!("✅ Loaded {} datasets", datasets.len()));

        Self::from_datasets(datasets)
    }

    pub fn from_datasets(datasets: Vec<Dataset>) -> Result<Self> {
        let batch = DatasetBatch::new(datasets)?;
        let session = Self {
            id: Uuid::new_v4(),
            created: Utc::now(),
            batch,
        };
        log::debug!("Session {} opened with {} datasets", session.id, session.batch.len());
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn datasets(&self) -> &[Dataset] {
        self.batch.datasets()
    }

    pub fn dataset_ids(&self) -> Vec<DatasetId> {
        self.batch.ids()
    }

    /// Column names and inferred types of every dataset, for building a plan
    pub fn column_catalog(&self) -> Vec<DatasetColumns> {
        self.batch
            .datasets()
            .iter()
            .map(|d| DatasetColumns {
                dataset: d.id.clone(),
                source: d.source.clone(),
                row_count: d.table.row_count(),
                columns: d.table.column_info(),
            })
            .collect()
    }

    pub fn compare(&self, plan: &ComparisonPlan) -> Result<ComparisonOutcome> {
        let mut progress = ProgressReporter::new_minimal();
        self.compare_with_progress(plan, &mut progress)
    }

    /// Validate, unify, merge, classify and fingerprint
    pub fn compare_with_progress(
        &self,
        plan: &ComparisonPlan,
        progress: &mut ProgressReporter,
    ) -> Result<ComparisonOutcome> {
        let resolved = plan.resolve(&self.batch)?;

        progress.update_merge("Unifying key columns...");
        let mut unified: Vec<(DatasetId, Table)> = Vec::with_capacity(self.batch.len());
        for dataset in self.batch.datasets() {
            let table = resolved.unifier.unify(&dataset.id, &dataset.table)?;
            for key in &resolved.keys {
                if !table.has_column(key) {
                    return Err(TabmergeError::missing_key_column(dataset.id.as_str(), key));
                }
            }
            unified.push((dataset.id.clone(), table));
        }

        progress.update_merge("Merging on keys...");
        let merged = KeyJoinMerger::merge(&unified, &resolved.keys, &resolved.compare, &resolved.view)?;

        progress.update_merge("Classifying differences...");
        let flags = DiffClassifier::classify(&merged, &resolved.compare, merged.others())?;
        let summary = ComparisonSummary::from_result(&merged, &flags);
        let fingerprint = HashComputer::fingerprint(&merged, &flags);
        progress.finish_merge(&format!(
            "✅ Merged {} rows, {} flagged cells",
            summary.total_rows, summary.flagged_cells
        ));

        log::info!(
            "Compared {} datasets: {} rows, {} flagged cells in {} rows",
            self.batch.len(),
            summary.total_rows,
            summary.flagged_cells,
            summary.rows_with_flags
        );

        Ok(ComparisonOutcome {
            session_id: self.id,
            created: self.created,
            datasets: self.batch.ids(),
            plan: plan.clone(),
            merged,
            flags,
            summary,
            fingerprint,
        })
    }
}
