use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain page text from a document.
///
/// These never reach the cumulative state: the pipeline reports them and stops
/// before the state file is locked or loaded.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document not found: {}", path.display())]
    DocumentNotFound { path: PathBuf },

    #[error("could not read {}: {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("failed to extract text from page {page}: {reason}")]
    ExtractionFailure { page: u32, reason: String },
}

impl ExtractError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExtractError::DocumentUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure to read or write the cumulative state file.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state file exists but does not parse. History is never reset silently.
    #[error("cumulative state at {} is corrupted: {source}", path.display())]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on cumulative state {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid keyword configuration.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("category {category:?} contains an empty keyword")]
    EmptyKeyword { category: String },

    #[error("category name must not be empty")]
    EmptyCategory,

    #[error("category {0:?} is defined more than once")]
    DuplicateCategory(String),

    #[error("keyword {keyword:?} appears more than once in category {category:?}")]
    DuplicateKeyword { category: String, keyword: String },

    #[error("could not read keyword file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse keyword file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("could not write chart to {}: {source}", path.display())]
    Chart {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not build page report: {0}")]
    Report(#[from] serde_json::Error),
}
