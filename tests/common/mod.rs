//! Common test utilities and helpers

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tabmerge::{ComparisonPlan, ComparisonSession, Result};
use tempfile::TempDir;

/// Test fixture manager for creating temporary input files
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the root path of the test fixture
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a file inside the fixture, existing or not
    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Create a test CSV file with sample data
    pub fn create_csv(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let mut content = String::new();
        for row in data {
            content.push_str(&row.join(","));
            content.push('\n');
        }
        self.create_raw(name, &content)
    }

    /// Create a file with raw string content
    pub fn create_raw(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a one-sheet workbook; numeric-looking cells are written as numbers
    /// and empty strings are left blank
    pub fn create_xlsx(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let path = self.path(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (r, row) in data.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) if r > 0 => {
                        worksheet.write_number(r as u32, c as u16, n)?;
                    }
                    _ => {
                        worksheet.write_string(r as u32, c as u16, *value)?;
                    }
                }
            }
        }

        workbook.save(&path)?;
        Ok(path)
    }

    /// Create a workbook with an `ID` column and a date-formatted `When` column
    /// holding raw serials; `date_1904` switches the workbook's date system
    pub fn create_xlsx_dates(&self, name: &str, serials: &[f64], date_1904: bool) -> Result<PathBuf> {
        let path = self.path(name);
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "ID")?;
        worksheet.write_string(0, 1, "When")?;
        for (i, serial) in serials.iter().enumerate() {
            let row = i as u32 + 1;
            worksheet.write_number(row, 0, row as f64)?;
            worksheet.write_number_with_format(row, 1, *serial, &date_format)?;
        }
        workbook.save(&path)?;

        if date_1904 {
            rewrite_xlsx_part(&path, "xl/workbook.xml", |xml| {
                xml.replacen("<workbookPr ", "<workbookPr date1904=\"1\" ", 1)
            });
        }
        Ok(path)
    }

    /// Write a comparison plan file
    pub fn create_plan(&self, name: &str, plan: &serde_json::Value) -> Result<PathBuf> {
        let content = serde_json::to_string_pretty(plan)?;
        self.create_raw(name, &content)
    }

    /// Load files into a session without progress bars
    pub fn session(&self, files: &[PathBuf]) -> Result<ComparisonSession> {
        let mut progress = tabmerge::progress::ProgressReporter::new_minimal();
        ComparisonSession::load(files, &mut progress)
    }
}

/// Build a plan from `--key`-style groups and compare/view column lists
pub fn plan(keys: &[&str], compare: &[&str], view: &[&str]) -> ComparisonPlan {
    let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let mut plan = ComparisonPlan::default();
    plan.extend_from_args(&to_strings(keys), &to_strings(compare), &to_strings(view))
        .expect("valid plan arguments");
    plan
}

/// Read every row of a sheet, header included
pub fn read_sheet(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto(path).expect("workbook should open");
    let range = workbook.worksheet_range(sheet).expect("sheet should exist");
    range.rows().map(|r| r.to_vec()).collect()
}

/// Read one XML part of an xlsx package
pub fn read_xlsx_part(path: &Path, part: &str) -> String {
    let file = fs::File::open(path).expect("workbook should open");
    let mut archive = zip::ZipArchive::new(file).expect("workbook should be a zip package");
    let mut entry = archive.by_name(part).expect("part should exist");
    let mut content = String::new();
    entry.read_to_string(&mut content).expect("part should be UTF-8");
    content
}

/// Rewrite one XML part of an xlsx package in place
pub fn rewrite_xlsx_part(path: &Path, part: &str, edit: impl Fn(&str) -> String) {
    let file = fs::File::open(path).expect("workbook should open");
    let mut archive = zip::ZipArchive::new(file).expect("workbook should be a zip package");
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).expect("entry should be readable");
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).expect("entry should be readable");
        entries.push((entry.name().to_string(), bytes));
    }
    drop(archive);

    let mut writer = zip::ZipWriter::new(fs::File::create(path).expect("workbook should be writable"));
    for (name, bytes) in entries {
        let bytes = if name == part {
            edit(&String::from_utf8(bytes).expect("part should be UTF-8")).into_bytes()
        } else {
            bytes
        };
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .expect("entry should start");
        writer.write_all(&bytes).expect("entry should write");
    }
    writer.finish().expect("package should close");
}

/// Style index of every cell in a worksheet part, keyed by `(row, col)`
/// with zero-based indices; cells without a style attribute use index 0
pub fn cell_styles(sheet_xml: &str) -> Vec<((u32, u32), u32)> {
    sheet_xml
        .split("<c r=\"")
        .skip(1)
        .map(|cell| {
            let reference = &cell[..cell.find('"').expect("cell reference")];
            let letters: String = reference.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
            let col = letters.bytes().fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1)) - 1;
            let row: u32 = reference[letters.len()..].parse::<u32>().expect("cell row") - 1;

            let tag = &cell[..cell.find('>').expect("cell tag")];
            let style = tag
                .split(" s=\"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .map_or(0, |s| s.parse().expect("style index"));
            ((row, col), style)
        })
        .collect()
}

/// Indices of cell formats whose font is red
pub fn red_font_styles(styles_xml: &str) -> Vec<u32> {
    let section = |name: &str| {
        let start = styles_xml.find(&format!("<{} ", name)).expect("styles section");
        let end = styles_xml.find(&format!("</{}>", name)).expect("styles section end");
        &styles_xml[start..end]
    };

    let red_fonts: Vec<u32> = section("fonts")
        .split("<font>")
        .skip(1)
        .enumerate()
        .filter(|(_, font)| font.contains("FF0000\""))
        .map(|(i, _)| i as u32)
        .collect();

    section("cellXfs")
        .split("<xf ")
        .skip(1)
        .enumerate()
        .filter(|(_, xf)| {
            xf.split("fontId=\"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .and_then(|id| id.parse::<u32>().ok())
                .is_some_and(|id| red_fonts.contains(&id))
        })
        .map(|(i, _)| i as u32)
        .collect()
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    /// Run a tabmerge command and return the result
    pub fn run_command(&self, args: &[&str]) -> Result<()> {
        use clap::Parser;
        use tabmerge::cli::Cli;
        use tabmerge::commands::execute_command;

        let mut cmd_args = vec!["tabmerge"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| tabmerge::TabmergeError::invalid_input(e.to_string()))?;
        execute_command(cli.command)
    }

    /// Run a command and expect it to succeed
    pub fn expect_success(&self, args: &[&str]) {
        self.run_command(args).expect("Command should succeed");
    }

    /// Run a command and expect it to fail
    pub fn expect_failure(&self, args: &[&str]) -> tabmerge::TabmergeError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Sample data generators for testing
pub mod sample_data {
    /// Reference with keys 1 and 2
    pub fn reference_prices() -> Vec<Vec<&'static str>> {
        vec![vec!["ID", "Price"], vec!["1", "10"], vec!["2", "20"]]
    }

    /// Second dataset: key 1 unchanged, key 3 new
    pub fn other_prices() -> Vec<Vec<&'static str>> {
        vec![vec!["ID", "Price"], vec!["1", "10"], vec!["3", "30"]]
    }

    /// Inventory snapshot used as the reference in multi-dataset tests
    pub fn inventory_base() -> Vec<Vec<&'static str>> {
        vec![
            vec!["sku", "name", "qty", "price"],
            vec!["A-1", "Widget", "5", "2.50"],
            vec!["A-2", "Gadget", "0", "10"],
            vec!["A-3", "Doohickey", "12", "1.25"],
        ]
    }

    /// Same inventory under different column names, with changes
    pub fn inventory_warehouse() -> Vec<Vec<&'static str>> {
        vec![
            vec!["item_code", "name", "qty", "price"],
            vec!["A-1", "Widget", "5", "2.5"],
            vec!["A-2", "Gadget", "3", "10"],
            vec!["A-4", "Thingamajig", "7", "4"],
        ]
    }

    pub fn inventory_store() -> Vec<Vec<&'static str>> {
        vec![
            vec!["SKU", "name", "qty", "price"],
            vec!["A-3", "Doohickey", "12", "1.30"],
            vec!["A-1", "Widget", "", "2.50"],
        ]
    }
}

/// Assertion helpers
pub mod assertions {
    use tabmerge::{ComparisonOutcome, DiffFlagSet};

    /// Collect flags as owned pairs for comparison
    pub fn flag_pairs(flags: &DiffFlagSet) -> Vec<(usize, String)> {
        flags.iter().map(|(row, column)| (row, column.to_string())).collect()
    }

    /// Reference and view columns must never carry a flag
    pub fn assert_only_candidate_compare_columns_flagged(outcome: &ComparisonOutcome) {
        use tabmerge::merge::ColumnKind;

        for (row, column) in outcome.flags.iter() {
            let info = outcome
                .merged
                .column(column)
                .unwrap_or_else(|| panic!("flagged column '{}' is not in the merged table", column));
            assert_eq!(info.kind, ColumnKind::Compare, "row {} column {}", row, column);
            assert_ne!(
                info.dataset.as_ref(),
                Some(outcome.merged.reference()),
                "reference column '{}' flagged",
                column
            );
        }
    }
}
