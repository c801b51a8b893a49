//! Command-line interface for tabmerge

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabmerge")]
#[command(about = "Merge tabular datasets on shared keys and flag disagreements with the first")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the columns of each dataset
    Columns {
        /// Input files (CSV, TSV, TXT, XLSX, XLS, ODS)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Merge datasets on key columns and flag differences from the first file
    Compare {
        /// Input files; the first is the reference
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Key group as DATASET:COLUMN,DATASET:COLUMN (repeatable)
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Columns to compare, by canonical name
        #[arg(long, value_delimiter = ',')]
        compare: Vec<String>,

        /// Columns to carry along without comparing
        #[arg(long, value_delimiter = ',')]
        view: Vec<String>,

        /// JSON plan file with keys, compare and view lists
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Excel output path
        #[arg(long, default_value = crate::xlsx::DEFAULT_FILE_NAME)]
        xlsx: PathBuf,

        /// Skip the Excel output
        #[arg(long)]
        no_xlsx: bool,

        /// Also write an HTML report
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Quiet output (machine-readable)
        #[arg(long)]
        quiet: bool,
    },
}

/// Parse output format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}
