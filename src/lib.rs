//! Importer for automotive bus-measurement recordings.
//!
//! Measurement files are scanned from one or more directories, grouped by
//! a shared filename prefix into recording sessions, filtered against a
//! signal blacklist, resampled onto a common time raster, merged into one
//! combined table and finally split into a target (label) block and a
//! feature block for downstream modeling.
//!
//! Decoding the binary measurement container is delegated to a
//! [`reader::BusReader`] implementation; [`reader::CsvBusReader`] is the
//! shipped reference backend.
//!
//! # Example
//!
//! ```no_run
//! use mf4_import::core::{ImporterConfig, Importer, ImportOptions, PipelineMode, JoinMode, ImportResult};
//! use mf4_import::reader::CsvBusReader;
//!
//! # fn run() -> Result<(), mf4_import::error::ImportError> {
//! let mut importer = Importer::new(ImporterConfig {
//!     filedirs: "/data/recordings".to_string(),
//!     ..Default::default()
//! })?;
//! importer.collect_files();
//!
//! let options = ImportOptions::new(0.5, PipelineMode::Default { join: JoinMode::Outer });
//! if let Some(ImportResult::Split { target, features }) =
//!     importer.import_data(&CsvBusReader::new(), "speed", &options)?
//! {
//!     println!("{} target rows, {} feature columns", target.height(), features.width());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod consts;
pub mod core;
pub mod error;
pub mod output;
pub mod reader;

mod utils;

pub use crate::core::{
    ImportOptions, ImportResult, Importer, ImporterConfig, JoinMode, PipelineMode,
};
pub use crate::error::ImportError;
pub use crate::reader::{BusReader, CsvBusReader, ReaderError, TableOptions};
