use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::consts::SIGNALLIST_EXTENSION;
use crate::error::ImportError;

/// Mapping from a target name to the set of signal names forming that
/// target's label block.
pub type SignalList = HashMap<String, Vec<String>>;

/// Where the target's signal list comes from. Chosen once per run: a
/// configured target directory wins, otherwise the target name itself is
/// looked up in the signal names accumulated while loading.
#[derive(Debug, Clone)]
pub enum SignalListSource {
    Directory(PathBuf),
    Accumulated,
}

impl SignalListSource {
    pub fn from_target_dir(targetdir: Option<&Path>) -> Self {
        match targetdir {
            Some(dir) => Self::Directory(dir.to_path_buf()),
            None => Self::Accumulated,
        }
    }

    /// Resolve the signal list for `target`.
    ///
    /// The feature-importance parameters are accepted but not applied as a
    /// filter; they travel through unchanged from the historical call
    /// surface. A target that cannot be resolved produces no entry, which
    /// the caller reports as a failed run.
    pub fn resolve(
        &self,
        target: &str,
        fi_signalnumber: Option<usize>,
        fi_signalthreshold: Option<f64>,
        accumulated: &HashSet<String>,
    ) -> Result<SignalList, ImportError> {
        let mut signallist = SignalList::new();
        match self {
            Self::Directory(dir) => {
                info!("using target directory: {}", dir.display());
                let pattern = format!("{}/*.{}", dir.display(), SIGNALLIST_EXTENSION);
                let Ok(paths) = glob::glob(&pattern) else {
                    return Ok(signallist);
                };
                for path in paths.flatten() {
                    let stem = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if stem != target {
                        continue;
                    }
                    let signals = read_signal_column(&path)?;
                    select_signals(
                        &mut signallist,
                        &stem,
                        signals,
                        true,
                        fi_signalnumber,
                        fi_signalthreshold,
                    );
                }
            }
            Self::Accumulated => {
                info!("no target directory provided, resolving from accumulated signal names");
                if accumulated.is_empty() {
                    error!("no signal names available to extract signals from");
                } else if accumulated.contains(target) {
                    let signals: Vec<String> = accumulated.iter().cloned().collect();
                    select_signals(
                        &mut signallist,
                        target,
                        signals,
                        false,
                        fi_signalnumber,
                        fi_signalthreshold,
                    );
                    info!("signal list created: {:?}", signallist.get(target));
                } else {
                    error!(
                        "target signal '{}' not found in accumulated signal names",
                        target
                    );
                }
            }
        }
        Ok(signallist)
    }
}

/// First whitespace-separated column of a signal-list file, one signal per
/// non-empty line.
fn read_signal_column(path: &Path) -> Result<Vec<String>, ImportError> {
    let content = fs::read_to_string(path).map_err(|source| ImportError::SignalList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// List-selection step. With a curated directory list every listed signal
/// is taken verbatim; without one only the target name itself qualifies.
/// Later entries for the same key overwrite earlier ones.
fn select_signals(
    signallist: &mut SignalList,
    key: &str,
    signals: Vec<String>,
    curated: bool,
    _fi_signalnumber: Option<usize>,
    _fi_signalthreshold: Option<f64>,
) {
    if curated {
        info!("target directory provided, all {} listed signals for '{}' will be used", signals.len(), key);
        signallist.insert(key.to_string(), signals);
    } else {
        info!("only the target signal '{}' will be used as the target", key);
        signallist.insert(key.to_string(), vec![key.to_string()]);
    }
}
