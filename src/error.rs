//! Error types for term_trends.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for corpus runs.
#[derive(Debug, Error)]
pub enum Error {
    /// The given corpus path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A required input file (metadata, replacement table) is absent.
    #[error("missing required file: {0}")]
    MissingFile(PathBuf),

    /// The text handed to the ranking engine exceeds the tagger's budget.
    #[error("input of {len} chars exceeds the tagger limit of {max}")]
    InputTooLarge { len: usize, max: usize },

    /// No document in the corpus yielded a usable publication year.
    #[error("no documents with a resolvable publication year in {0}")]
    EmptyCorpus(PathBuf),

    /// I/O error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error wrapper.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for term_trends operations.
pub type Result<T> = std::result::Result<T, Error>;
