use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

use crate::reader::ReaderError;

/// Errors that abort an import run.
///
/// Insufficient session data and failed target resolution are deliberately
/// not part of this enum: they are reported through the log and surface as
/// an empty result, so callers see an unambiguous "no result" instead of an
/// error they might be tempted to retry.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no measurement file directory specified")]
    MissingFileDir,

    #[error("failed to read blacklist {path}: {source}")]
    Blacklist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read signal list {path}: {source}")]
    SignalList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Source(#[from] ReaderError),

    #[error(transparent)]
    Frame(#[from] PolarsError),
}
