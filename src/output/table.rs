use comfy_table::{
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL, Cell, ContentArrangement, Table,
};
use polars::prelude::DataFrame;

use crate::core::ImportResult;

/// Shape summary of the produced tables.
fn build_summary(entries: &[(&str, &DataFrame)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Table", "Rows", "Columns"]);
    for (name, frame) in entries {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(frame.height()),
            Cell::new(frame.width()),
        ]);
    }
    table
}

fn print_preview(label: &str, frame: &DataFrame, rows: usize) {
    println!("\n{label}:");
    println!("{}", frame.head(Some(rows)));
}

/// Print the run's outcome: a shape summary plus a preview of each table.
pub fn print_import_result(result: &ImportResult, preview_rows: usize) {
    match result {
        ImportResult::Split { target, features } => {
            println!("{}", build_summary(&[("target", target), ("features", features)]));
            print_preview("Target Data", target, preview_rows);
            print_preview("Feature Data", features, preview_rows);
        }
        ImportResult::Combined(combined) => {
            println!("{}", build_summary(&[("combined", combined)]));
            print_preview("Combined Data", combined, preview_rows);
        }
    }
}
