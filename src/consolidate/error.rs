use std::path::PathBuf;

use thiserror::Error;

/// Conditions that stop a consolidation run outright.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("expected exactly one spreadsheet in {}, found {found}", directory.display())]
    SourceCount { directory: PathBuf, found: usize },

    #[error("no 8-digit work order number in job folder name: {folder}")]
    MissingWorkOrder { folder: String },
}
