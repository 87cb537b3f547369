pub mod table;

pub use table::print_import_result;
