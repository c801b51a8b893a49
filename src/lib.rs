//! # tabmerge
//!
//! Merges several tabular datasets on shared key columns and flags every cell
//! where a later dataset disagrees with the first one, the reference.

pub mod classify;
pub mod cli;
pub mod commands;
pub mod data;
pub mod dataset;
pub mod error;
pub mod hash;
pub mod html;
pub mod mapping;
pub mod merge;
pub mod output;
pub mod progress;
pub mod session;
pub mod table;
pub mod unify;
pub mod xlsx;

pub use classify::{DiffClassifier, DiffFlagSet};
pub use dataset::{Dataset, DatasetBatch, DatasetId};
pub use error::{Result, TabmergeError};
pub use mapping::{ColumnRef, ComparisonPlan, KeyGroup};
pub use merge::{KeyJoinMerger, MergedTable};
pub use session::{ComparisonOutcome, ComparisonSession, ComparisonSummary};
pub use table::{Cell, Table, Value};
