use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::consts::{MEASUREMENT_EXTENSIONS, SESSION_DELIMITER};

/// Session groups: session key to the deduplicated, sorted list of
/// measurement files belonging to that recording. The BTreeMap keeps the
/// keys sorted so every downstream step iterates deterministically.
pub type FileGroups = BTreeMap<String, Vec<PathBuf>>;

/// Scan a comma-separated list of directories for measurement files and
/// group them by session key.
///
/// A key is the file's base name truncated at the first `#`; files without
/// a delimiter use the whole base name. Keys are global across all input
/// directories, and both extension case variants are matched, so the same
/// path can be seen twice on a case-insensitive filesystem — groups are
/// deduplicated before they are returned. Directories without matches
/// contribute nothing; that is not an error.
pub fn collect_file_groups(filedirs: &str) -> FileGroups {
    let mut groups: FileGroups = BTreeMap::new();

    for dir in filedirs.split(',') {
        let dir = dir.trim();
        if dir.is_empty() {
            continue;
        }
        for extension in MEASUREMENT_EXTENSIONS {
            let pattern = format!("{}/*.{}", dir, extension);
            let Ok(paths) = glob::glob(&pattern) else {
                continue;
            };
            for path in paths.flatten() {
                let key = session_key(&path);
                groups.entry(key).or_default().push(path);
            }
        }
    }

    for files in groups.values_mut() {
        files.sort();
        files.dedup();
    }
    for (key, files) in &groups {
        info!("key '{}' has {} files: {:?}", key, files.len(), files);
    }
    groups
}

/// Base name truncated at the first delimiter.
fn session_key(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match base.find(SESSION_DELIMITER) {
        Some(pos) => base[..pos].to_string(),
        None => base,
    }
}
