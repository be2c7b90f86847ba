//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars; staging an XCFramework
//! copies hundreds of files, which is long enough to deserve one.

use linya::{Bar, Progress};

/// Progress bar wrapper for file staging
pub struct FileProgress {
  progress: Progress,
  bar: Bar,
}

impl FileProgress {
  /// Create a new progress bar for file operations
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
