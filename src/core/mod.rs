pub mod blacklist;
pub mod grouping;
pub mod importer;
pub mod merge;
pub mod signallist;

pub use blacklist::load_blacklist;
pub use grouping::{collect_file_groups, FileGroups};
pub use importer::{ImportOptions, ImportResult, Importer, ImporterConfig, PipelineMode};
pub use merge::{JoinMode, SplitTables};
pub use signallist::{SignalList, SignalListSource};
