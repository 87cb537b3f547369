//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigJoinMode};
use crate::core::JoinMode;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub enum JoinArg {
    /// Keep only columns common to every session table
    Inner,
    /// Union of all columns, gaps filled with zero (default)
    #[default]
    Outer,
}

#[derive(Parser, Debug)]
#[command(name = "mf4-import")]
#[command(about = "Process measurement data files with a target and blacklist", version)]
pub struct Cli {
    /// Comma-separated directories containing the measurement files
    #[arg(short = 'f', long)]
    pub filedir: String,

    /// Target name: stem of a signal-list file, or a signal in the data
    #[arg(short = 't', long)]
    pub targetname: String,

    /// Directory with per-target signal-list files (*.txt)
    #[arg(long)]
    pub targetdir: Option<PathBuf>,

    /// File with blacklisted signal names, one per line
    #[arg(short = 'b', long)]
    pub blacklist: Option<PathBuf>,

    /// Sampling interval in seconds for the common time raster
    #[arg(short = 'r', long)]
    pub raster: Option<f64>,

    /// Join semantics when session tables disagree on columns
    #[arg(long, value_enum)]
    pub join: Option<JoinArg>,

    /// Run the feature-engineering variant (combined table, no split)
    #[arg(long)]
    pub feature_engineering: bool,

    /// Feature-importance signal count (accepted, currently unused)
    #[arg(long)]
    pub fi_signalnumber: Option<usize>,

    /// Feature-importance threshold (accepted, currently unused)
    #[arg(long)]
    pub fi_signalthreshold: Option<f64>,

    /// Allow runs with fewer than two session groups
    #[arg(long)]
    pub file_analysis: bool,

    /// Rows printed when previewing the result tables
    #[arg(long)]
    pub preview: Option<usize>,
}

impl Cli {
    /// Merge config-file defaults into the CLI; explicit arguments win.
    pub fn with_config(mut self, config: &Config) -> Self {
        if self.raster.is_none() {
            self.raster = config.raster;
        }
        if self.blacklist.is_none() {
            self.blacklist = config.blacklist.clone();
        }
        if self.targetdir.is_none() {
            self.targetdir = config.targetdir.clone();
        }
        if self.join.is_none() {
            self.join = config.join.map(|mode| match mode {
                ConfigJoinMode::Inner => JoinArg::Inner,
                ConfigJoinMode::Outer => JoinArg::Outer,
            });
        }
        if self.preview.is_none() {
            self.preview = config.preview;
        }
        self
    }

    pub fn join_mode(&self) -> JoinMode {
        match self.join.unwrap_or_default() {
            JoinArg::Inner => JoinMode::Inner,
            JoinArg::Outer => JoinMode::Outer,
        }
    }

    pub fn preview_rows(&self) -> usize {
        self.preview.unwrap_or(10)
    }
}
