/// Measurement-file extensions matched when scanning input directories.
/// Both case variants are globbed and the results merged.
pub const MEASUREMENT_EXTENSIONS: [&str; 2] = ["MF4", "mf4"];

/// Character that separates the session prefix from the part suffix in a
/// measurement file name, e.g. `drive01#002.mf4` belongs to session `drive01`.
pub const SESSION_DELIMITER: char = '#';

/// Synthetic column stamped onto every session table with its session key.
pub const FILE_COLUMN: &str = "file";

/// Time axis column produced by the reader backends.
pub const TIME_COLUMN: &str = "t";

/// Columns with this prefix survive the constant-column drop in
/// feature-engineering mode.
pub const KEEP_COLUMN_PREFIX: &str = "I_";

/// Extension of target signal-list files inside the target directory.
pub const SIGNALLIST_EXTENSION: &str = "txt";
