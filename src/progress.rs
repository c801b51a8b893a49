//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Progress reporter for tabmerge operations
#[derive(Debug)]
pub struct ProgressReporter {
    pub load_pb: Option<ProgressBar>,
    pub merge_pb: Option<ProgressBar>,
    pub export_pb: Option<ProgressBar>,
    expected_files: u64,
    show_progress: bool,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create progress reporter for a comparison run
    pub fn new_for_compare(expected_files: usize) -> Self {
        // Merge and export bars are created lazily
        let load_pb = create_progress_bar(expected_files as u64, "Loading datasets");

        Self {
            load_pb: Some(load_pb),
            merge_pb: None,
            export_pb: None,
            expected_files: expected_files as u64,
            show_progress: true,
            start_time: Instant::now(),
        }
    }

    /// Create progress reporter for column listings
    pub fn new_for_columns(expected_files: usize) -> Self {
        Self {
            load_pb: Some(create_spinner("Reading headers...")),
            merge_pb: None,
            export_pb: None,
            expected_files: expected_files as u64,
            show_progress: true,
            start_time: Instant::now(),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            load_pb: None,
            merge_pb: None,
            export_pb: None,
            expected_files: 0,
            show_progress: false,
            start_time: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.show_progress
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Record one more decoded file
    pub fn update_load(&mut self, loaded: u64, message: &str) {
        if let Some(pb) = &self.load_pb {
            pb.set_length(self.expected_files.max(loaded));
            pb.set_position(loaded);
            pb.set_message(message.to_string());
        }
    }

    /// Finish loading and prepare for merging
    pub fn finish_load(&mut self, message: &str) {
        if let Some(pb) = self.load_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Lazily create merge spinner when needed
    fn ensure_merge_pb(&mut self) {
        if self.show_progress && self.merge_pb.is_none() {
            self.merge_pb = Some(create_spinner("Merging on keys..."));
        }
    }

    /// Lazily create export spinner when needed
    fn ensure_export_pb(&mut self) {
        if self.show_progress && self.export_pb.is_none() {
            self.export_pb = Some(create_spinner("Writing results..."));
        }
    }

    /// Update merge progress message without finishing
    pub fn update_merge(&mut self, message: &str) {
        self.ensure_merge_pb();
        if let Some(pb) = &self.merge_pb {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_merge(&mut self, message: &str) {
        if let Some(pb) = self.merge_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Update export progress message without finishing
    pub fn update_export(&mut self, message: &str) {
        self.ensure_export_pb();
        if let Some(pb) = &self.export_pb {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_export(&mut self, message: &str) {
        if let Some(pb) = self.export_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        // Ensure all progress bars are cleaned up silently
        for pb in [self.load_pb.take(), self.merge_pb.take(), self.export_pb.take()]
            .into_iter()
            .flatten()
        {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar with known total
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}
