//! Boundary to the measurement-file reader.
//!
//! Decoding the binary container format is not this crate's business: the
//! pipeline only needs to open a file, see which signals it carries, drop
//! the blacklisted ones and get a time-rastered table back. [`BusReader`]
//! captures exactly that contract, and [`csv::CsvBusReader`] is a shipped
//! reference backend so the binary and the tests can run end to end.
//!
//! Handles are owned values: `filter` consumes the open handle and `stack`
//! consumes the filtered ones, so every underlying resource is released as
//! soon as the next stage has what it needs.

pub mod csv;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::info;
use polars::prelude::DataFrame;
use thiserror::Error;

pub use csv::CsvBusReader;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("cannot open measurement file {path}: {source}")]
    Open {
        path: PathBuf,
        source: polars::error::PolarsError,
    },

    #[error("measurement file {path} has no '{column}' time column")]
    MissingTimeColumn { path: PathBuf, column: String },

    #[error("no measurement files to stack")]
    EmptyStack,

    #[error("invalid raster {raster}: must be positive")]
    InvalidRaster { raster: f64 },

    #[error("cannot convert stacked measurement to a table: {source}")]
    Table { source: polars::error::PolarsError },
}

/// Options forwarded to [`BusReader::to_dataframe`].
#[derive(Debug, Clone, Copy)]
pub struct TableOptions {
    /// Shift each file's time axis so its first sample sits at zero.
    pub time_from_zero: bool,
    /// Hint that the backend may downcast to narrower dtypes.
    pub reduce_memory: bool,
    /// Request raw numeric values instead of value-to-text conversions.
    pub ignore_value_conversions: bool,
}

/// Reader for one measurement-file format.
///
/// `Open` is a freshly opened file, `Filtered` a per-file view restricted
/// to a signal subset, `Stacked` the combination of all parts of one
/// session. Backends decide what those handles actually hold.
pub trait BusReader {
    type Open;
    type Filtered;
    type Stacked;

    fn open(&self, path: &Path) -> Result<Self::Open, ReaderError>;

    /// Signal names matching `pattern` (`*`/`?` wildcards).
    fn list_signals(&self, handle: &Self::Open, pattern: &str, case_insensitive: bool)
        -> Vec<String>;

    fn filter(&self, handle: Self::Open, signals: &[String]) -> Result<Self::Filtered, ReaderError>;

    fn stack(&self, handles: Vec<Self::Filtered>) -> Result<Self::Stacked, ReaderError>;

    /// Resample the stacked signals onto a fixed raster and materialise
    /// them as a table. `raster` is the sampling interval in seconds.
    fn to_dataframe(
        &self,
        handle: Self::Stacked,
        raster: f64,
        options: &TableOptions,
    ) -> Result<DataFrame, ReaderError>;
}

/// Open one file, subtract the blacklist from its signal set and append
/// the filtered handle to the session's accumulator.
///
/// Blacklist removal is pure set subtraction: names that match nothing in
/// the file are inert, never an error.
pub fn read_bus_files<R: BusReader>(
    reader: &R,
    path: &Path,
    collection: &mut Vec<R::Filtered>,
    blacklist: &HashSet<String>,
) -> Result<(), ReaderError> {
    let handle = reader.open(path)?;
    let mut signals = reader.list_signals(&handle, "*", true);
    if !blacklist.is_empty() {
        signals.retain(|signal| !blacklist.contains(signal));
    }
    info!("reading {}", path.display());
    collection.push(reader.filter(handle, &signals)?);
    Ok(())
}

/// Case-(in)sensitive wildcard match on a signal name.
pub(crate) fn signal_matches(name: &str, pattern: &str, case_insensitive: bool) -> bool {
    let options = MatchOptions {
        case_sensitive: !case_insensitive,
        ..MatchOptions::new()
    };
    match Pattern::new(pattern) {
        Ok(p) => p.matches_with(name, options),
        Err(_) => false,
    }
}
