//! Error types for the extraction/index/search pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Decode or feature-computation failure for a single file.
///
/// Always local to that file: the indexer and the search driver log it
/// and move on, so one unreadable file never aborts a pass.
#[derive(Debug, Error)]
#[error("failed to extract features from {}: {message}", path.display())]
pub struct ExtractError {
    pub path: PathBuf,
    pub message: String,
}

impl ExtractError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors that can abort an index or search pass as a whole.
///
/// Per-file trouble is [`ExtractError`] and never surfaces here.
#[derive(Debug, Error)]
pub enum Error {
    /// An error propagated from the core persistence layer.
    #[error(transparent)]
    Core(#[from] consonance_core::Error),

    /// The distance worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
