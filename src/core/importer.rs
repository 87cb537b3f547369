//! Pipeline orchestration: one [`Importer`] per run drives grouping,
//! reading, merging and the final split.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use log::{error, info};
use polars::prelude::DataFrame;

use crate::core::blacklist::load_blacklist;
use crate::core::grouping::{collect_file_groups, FileGroups};
use crate::core::merge::{
    column_names, concat_sessions, convert_non_numeric_to_categorical, drop_constant_columns,
    drop_object_columns, fill_numeric_nulls_with_zero, sort_columns_alphabetically,
    split_target_features, stamp_file_column, JoinMode, SplitTables,
};
use crate::core::signallist::SignalListSource;
use crate::error::ImportError;
use crate::reader::{read_bus_files, BusReader, TableOptions};

/// Construction-time configuration of a run.
#[derive(Debug, Clone, Default)]
pub struct ImporterConfig {
    /// Comma-separated list of directories holding measurement files.
    pub filedirs: String,
    /// Directory of per-target signal-list files; fallback resolution
    /// applies when absent.
    pub targetdir: Option<PathBuf>,
    /// Optional blacklist file, one signal name per line.
    pub blacklist: Option<PathBuf>,
    /// Model-library source. When set, bus files are not read at all; the
    /// data comes from the library instead (external collaborator branch).
    pub modellib: Option<PathBuf>,
}

/// Which post-stack variant of the pipeline runs.
#[derive(Debug, Clone, Copy)]
pub enum PipelineMode {
    /// Zero-fill per session, concat with the given join, split into
    /// target and feature tables.
    Default { join: JoinMode },
    /// Defer filling, convert non-numeric columns to categoricals, outer
    /// concat, drop single-valued columns, return the combined table.
    FeatureEngineering,
}

/// Per-call options for [`Importer::import_data`].
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Sampling interval in seconds for the common time raster.
    pub raster: f64,
    pub mode: PipelineMode,
    /// Accepted for signal-list resolution but not applied as a filter.
    pub fi_signalnumber: Option<usize>,
    /// Accepted for signal-list resolution but not applied as a filter.
    pub fi_signalthreshold: Option<f64>,
    /// File-analysis runs may proceed with fewer than two sessions.
    pub file_analysis: bool,
    /// Ethernet extension point: strip non-numeric columns after the
    /// concat. No invocation surface sets this.
    pub drop_object_columns: bool,
}

impl ImportOptions {
    pub fn new(raster: f64, mode: PipelineMode) -> Self {
        Self {
            raster,
            mode,
            fi_signalnumber: None,
            fi_signalthreshold: None,
            file_analysis: false,
            drop_object_columns: false,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug)]
pub enum ImportResult {
    /// Default mode: the disjoint target and feature blocks.
    Split {
        target: DataFrame,
        features: DataFrame,
    },
    /// Feature-engineering mode: the combined table, unsplit.
    Combined(DataFrame),
}

/// Imports bus data from grouped measurement files.
#[derive(Debug)]
pub struct Importer {
    config: ImporterConfig,
    groups: FileGroups,
}

impl Importer {
    /// Fails immediately when no directory list was supplied; everything
    /// else is reported at import time.
    pub fn new(config: ImporterConfig) -> Result<Self, ImportError> {
        if config.filedirs.trim().is_empty() {
            error!("no file directory specified");
            return Err(ImportError::MissingFileDir);
        }
        Ok(Self {
            config,
            groups: FileGroups::new(),
        })
    }

    /// Scan the configured directories and group the measurement files by
    /// session key.
    pub fn collect_files(&mut self) {
        self.groups = collect_file_groups(&self.config.filedirs);
    }

    pub fn file_groups(&self) -> &FileGroups {
        &self.groups
    }

    /// Run the merge-and-split pipeline for `target`.
    ///
    /// `Ok(None)` is the reported no-result outcome: fewer than two session
    /// tables, or a target that could not be resolved to any existing
    /// column. Reader failures abort the run unchanged.
    pub fn import_data<R: BusReader>(
        &self,
        reader: &R,
        target: &str,
        options: &ImportOptions,
    ) -> Result<Option<ImportResult>, ImportError> {
        let start = Instant::now();
        let result = self.load_files(reader, target, options)?;
        info!(
            "--- {:.3} seconds to import files for target {} ---",
            start.elapsed().as_secs_f64(),
            target
        );
        Ok(result)
    }

    fn load_files<R: BusReader>(
        &self,
        reader: &R,
        target: &str,
        options: &ImportOptions,
    ) -> Result<Option<ImportResult>, ImportError> {
        let blacklist = load_blacklist(self.config.blacklist.as_deref())?;
        let default_mode = matches!(options.mode, PipelineMode::Default { .. });
        let table_options = TableOptions {
            time_from_zero: true,
            reduce_memory: true,
            ignore_value_conversions: default_mode,
        };

        let mut frames: Vec<DataFrame> = Vec::new();
        let mut accumulated: HashSet<String> = HashSet::new();

        for (key, files) in &self.groups {
            if self.config.modellib.is_some() {
                // Model-library runs take their data from the library, not
                // from the bus files.
                continue;
            }
            let mut collection = Vec::new();
            for file in files {
                read_bus_files(reader, file, &mut collection, &blacklist)?;
            }
            let stacked = reader.stack(collection)?;
            let mut frame = reader.to_dataframe(stacked, options.raster, &table_options)?;
            if default_mode {
                frame = fill_numeric_nulls_with_zero(&frame)?;
            }
            let frame = stamp_file_column(frame, key)?;
            accumulated.extend(column_names(&frame));
            info!(
                "session '{}': {} files, {} columns",
                key,
                files.len(),
                frame.width()
            );
            frames.push(frame);
        }

        if self.config.modellib.is_none() && !options.file_analysis && frames.len() < 2 {
            error!(
                "more training data is required for model generation: {} session table(s), at least 2 needed",
                frames.len()
            );
            return Ok(None);
        }

        match options.mode {
            PipelineMode::FeatureEngineering => {
                // Categoricals from different session tables only
                // concatenate under the shared string cache.
                polars::enable_string_cache();
                let mut converted = Vec::with_capacity(frames.len());
                for frame in &frames {
                    converted.push(convert_non_numeric_to_categorical(frame)?);
                }
                let combined = concat_sessions(converted, JoinMode::Outer)?;
                let combined = drop_constant_columns(combined)?;
                Ok(Some(ImportResult::Combined(combined)))
            }
            PipelineMode::Default { join } => {
                let session_count = frames.len();
                let combined = concat_sessions(frames, join)?;
                info!(
                    "total number of session tables for {}: {}",
                    target, session_count
                );
                info!("total number of combined columns: {}", combined.width());
                if join == JoinMode::Inner {
                    let kept: HashSet<String> = column_names(&combined).into_iter().collect();
                    let mut unused: Vec<&String> = accumulated.difference(&kept).collect();
                    unused.sort();
                    info!("unused columns: {:?}", unused);
                }

                let combined = fill_numeric_nulls_with_zero(&combined)?;
                let combined = if options.drop_object_columns {
                    drop_object_columns(&combined)?
                } else {
                    combined
                };
                let combined = sort_columns_alphabetically(&combined)?;

                let source = SignalListSource::from_target_dir(self.config.targetdir.as_deref());
                let signallist = source.resolve(
                    target,
                    options.fi_signalnumber,
                    options.fi_signalthreshold,
                    &accumulated,
                )?;
                match split_target_features(&combined, target, &signallist)? {
                    Some(SplitTables { target, features }) => {
                        Ok(Some(ImportResult::Split { target, features }))
                    }
                    None => Ok(None),
                }
            }
        }
    }
}
