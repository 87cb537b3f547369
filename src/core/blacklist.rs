use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::info;

use crate::error::ImportError;

/// Load the set of signal names that must never be read.
///
/// An absent or nonexistent path yields an empty set, not an error. Names
/// are not validated against any signal universe: unknown entries are
/// simply inert during filtering.
pub fn load_blacklist(path: Option<&Path>) -> Result<HashSet<String>, ImportError> {
    let mut blacklist = HashSet::new();
    let Some(path) = path else {
        return Ok(blacklist);
    };
    if !path.is_file() {
        return Ok(blacklist);
    }

    let content = fs::read_to_string(path).map_err(|source| ImportError::Blacklist {
        path: path.to_path_buf(),
        source,
    })?;
    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() {
            blacklist.insert(line.to_string());
        }
    }
    info!(
        "blacklist {} holds {} signals",
        path.display(),
        blacklist.len()
    );
    Ok(blacklist)
}
