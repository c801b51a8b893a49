//! Command implementations for tabmerge CLI

use crate::cli::{Commands, OutputFormat};
use crate::error::{Result, TabmergeError};
use crate::html::HtmlRenderer;
use crate::mapping::ComparisonPlan;
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::session::ComparisonSession;
use crate::xlsx::XlsxExporter;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Columns { files, format } => columns_command(&files, &format),
        Commands::Compare {
            files,
            keys,
            compare,
            view,
            plan,
            xlsx,
            no_xlsx,
            html,
            format,
            quiet,
        } => {
            let xlsx = if no_xlsx { None } else { Some(xlsx) };
            let request = CompareRequest {
                files,
                keys,
                compare,
                view,
                plan,
                xlsx,
                html,
            };
            compare_command(&request, &format, quiet)
        }
    }
}

/// Inputs of one `compare` invocation
#[derive(Debug, Clone, Default)]
pub struct CompareRequest {
    pub files: Vec<PathBuf>,
    pub keys: Vec<String>,
    pub compare: Vec<String>,
    pub view: Vec<String>,
    pub plan: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl CompareRequest {
    /// Plan file first, then command-line additions
    pub fn build_plan(&self) -> Result<ComparisonPlan> {
        let mut plan = match &self.plan {
            Some(path) => ComparisonPlan::from_json_file(path)?,
            None => ComparisonPlan::default(),
        };
        plan.extend_from_args(&self.keys, &self.compare, &self.view)?;
        Ok(plan)
    }
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(TabmergeError::invalid_input)
}

/// List the columns of every dataset
fn columns_command(files: &[PathBuf], format: &str) -> Result<()> {
    let output_format = parse_format(format)?;
    let mut progress = match output_format {
        OutputFormat::Json => ProgressReporter::new_minimal(),
        OutputFormat::Pretty => ProgressReporter::new_for_columns(files.len()),
    };

    let session = ComparisonSession::load(files, &mut progress)?;
    drop(progress);

    let catalog = session.column_catalog();
    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_column_catalog(&catalog),
        OutputFormat::Json => println!("{}", JsonFormatter::format_column_catalog(&catalog)?),
    }

    Ok(())
}

/// Load, merge, classify, and write every requested output
fn compare_command(request: &CompareRequest, format: &str, quiet: bool) -> Result<()> {
    let output_format = parse_format(format)?;
    let plan = request.build_plan()?;

    let mut progress = if quiet || output_format == OutputFormat::Json {
        ProgressReporter::new_minimal()
    } else {
        ProgressReporter::new_for_compare(request.files.len())
    };

    let session = ComparisonSession::load(&request.files, &mut progress)?;
    let outcome = session.compare_with_progress(&plan, &mut progress)?;

    let mut written: Vec<&Path> = Vec::new();
    if let Some(path) = &request.xlsx {
        progress.update_export(&format!("Writing {}...", path.display()));
        XlsxExporter::write_to(&outcome, path)?;
        written.push(path);
    }
    if let Some(path) = &request.html {
        progress.update_export(&format!("Writing {}...", path.display()));
        HtmlRenderer::write_to(&outcome, path)?;
        written.push(path);
    }
    progress.finish_export("✅ Results written");
    log::debug!("Compare finished in {:?}", progress.elapsed());
    drop(progress);

    match output_format {
        OutputFormat::Json => println!("{}", JsonFormatter::format_comparison(&outcome)?),
        OutputFormat::Pretty => {
            PrettyPrinter::print_comparison(&outcome, quiet);
            if !quiet {
                for path in written {
                    println!("📁 Saved: {}", path.display());
                }
            }
        }
    }

    Ok(())
}
