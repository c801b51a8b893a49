//! Error types for tabmerge operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabmergeError>;

#[derive(Error, Debug)]
pub enum TabmergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("XLSX export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("At least 2 datasets are required, got {count}")]
    InsufficientDatasets { count: usize },

    #[error("Duplicate dataset identifier '{id}' (from {path})")]
    DuplicateDatasetId { id: String, path: String },

    #[error("Unknown dataset '{dataset}'")]
    UnknownDataset { dataset: String },

    #[error("Dataset '{dataset}': unknown column '{column}'")]
    UnknownColumn { dataset: String, column: String },

    #[error("Dataset '{dataset}': column name collision on '{column}'")]
    ColumnCollision { dataset: String, column: String },

    #[error("Ambiguous key mapping: {message}")]
    AmbiguousKeyMapping { message: String },

    #[error("Dataset '{dataset}': key column '{column}' does not exist")]
    MissingKeyColumn { dataset: String, column: String },

    #[error("No key columns were declared")]
    EmptyKeyMapping,

    #[error("Column '{column}' is assigned more than one role")]
    ColumnRoleConflict { column: String },

    #[error("Invalid column reference '{value}': expected DATASET:COLUMN")]
    InvalidColumnRef { value: String },

    #[error("Merge requires at least 2 tables, got {count}")]
    EmptyDatasetList { count: usize },

    #[error("Dataset '{dataset}': key column '{column}' missing at merge time")]
    KeyColumnMissing { dataset: String, column: String },

    #[error("Dataset '{dataset}': key ({key}) occurs more than once")]
    DuplicateKey { dataset: String, key: String },

    #[error("Dataset '{dataset}': row {row} has {found} cells, expected {expected}")]
    MalformedRow {
        dataset: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TabmergeError {
    pub fn unknown_column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    pub fn column_collision(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnCollision {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    pub fn ambiguous_key_mapping(msg: impl Into<String>) -> Self {
        Self::AmbiguousKeyMapping {
            message: msg.into(),
        }
    }

    pub fn missing_key_column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingKeyColumn {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
