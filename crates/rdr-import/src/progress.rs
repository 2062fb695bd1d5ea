//! Terminal progress for import runs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::importer::ImportProgress;
use crate::model::PersistedRef;

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner that counts imported rows
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new(message: &str) -> Self {
        Self {
            bar: create_spinner(message),
        }
    }

    /// Progress that draws nothing, for non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Stop the spinner and leave no trace on the terminal
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ImportProgress for SpinnerProgress {
    fn row_imported(&self, line: u64, persisted: &PersistedRef, imported: usize) {
        self.bar.set_message(format!(
            "Imported {} object(s), last {} from line {}",
            imported, persisted.model, line
        ));
        self.bar.tick();
    }

    fn finished(&self, _imported: usize) {
        self.bar.finish_and_clear();
    }
}
