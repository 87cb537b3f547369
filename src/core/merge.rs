//! Session-table merging and the final target/feature split.
//!
//! Per-session tables arrive from the reader already rastered. This module
//! unions or intersects their columns, concatenates them into one combined
//! table, repairs the gaps the join introduced, and partitions the result
//! into a target block and a feature block.

use std::collections::HashSet;

use log::{error, info};
use polars::prelude::*;

use crate::consts::{FILE_COLUMN, KEEP_COLUMN_PREFIX};
use crate::core::signallist::SignalList;
use crate::utils::is_numeric_dtype;

/// How session tables with differing column sets are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Only columns common to every session table survive.
    Inner,
    /// Union of all columns; gaps are filled with zero afterwards.
    #[default]
    Outer,
}

/// The two disjoint column partitions of the combined table.
#[derive(Debug)]
pub struct SplitTables {
    pub target: DataFrame,
    pub features: DataFrame,
}

/// Stamp the session key onto every row. Any pre-existing `file` column is
/// replaced, so the combined table always carries exactly one.
pub fn stamp_file_column(mut frame: DataFrame, key: &str) -> PolarsResult<DataFrame> {
    let values = vec![key.to_string(); frame.height()];
    frame.with_column(Column::new(FILE_COLUMN.into(), values))?;
    Ok(frame)
}

/// Replace nulls in numeric columns with zero. Non-numeric columns keep
/// their nulls: a mixed zero/text column is not representable here.
pub fn fill_numeric_nulls_with_zero(frame: &DataFrame) -> PolarsResult<DataFrame> {
    let mut out = frame.clone();
    for column in frame.get_columns() {
        if is_numeric_dtype(column.dtype()) {
            let filled = column
                .as_materialized_series()
                .fill_null(FillNullStrategy::Zero)?;
            out.with_column(filled)?;
        }
    }
    Ok(out)
}

/// Concatenate all session tables into the combined table.
pub fn concat_sessions(frames: Vec<DataFrame>, mode: JoinMode) -> PolarsResult<DataFrame> {
    if frames.is_empty() {
        return Ok(DataFrame::empty());
    }
    match mode {
        JoinMode::Outer => {
            let lazy: Vec<LazyFrame> = frames.into_iter().map(|f| f.lazy()).collect();
            concat_lf_diagonal(lazy, UnionArgs::default())?.collect()
        }
        JoinMode::Inner => {
            let mut common: HashSet<String> = column_names(&frames[0]).into_iter().collect();
            for frame in &frames[1..] {
                let names: HashSet<String> = column_names(frame).into_iter().collect();
                common.retain(|name| names.contains(name));
            }
            let mut common: Vec<String> = common.into_iter().collect();
            common.sort();

            let exprs: Vec<Expr> = common.iter().map(|name| col(name.as_str())).collect();
            let lazy: Vec<LazyFrame> = frames
                .into_iter()
                .map(|f| f.lazy().select(exprs.clone()))
                .collect();
            concat(
                lazy,
                UnionArgs {
                    to_supertypes: true,
                    ..Default::default()
                },
            )?
            .collect()
        }
    }
}

/// Deterministic column order for the combined table.
pub fn sort_columns_alphabetically(frame: &DataFrame) -> PolarsResult<DataFrame> {
    let mut names = column_names(frame);
    names.sort();
    frame.select(names)
}

/// Drop columns carrying at most one distinct value. The `file` column and
/// columns with the reserved keep-prefix are never dropped.
pub fn drop_constant_columns(frame: DataFrame) -> PolarsResult<DataFrame> {
    let mut dropped: HashSet<String> = HashSet::new();
    for column in frame.get_columns() {
        let name = column.name().as_str();
        if name == FILE_COLUMN || name.starts_with(KEEP_COLUMN_PREFIX) {
            continue;
        }
        if column.as_materialized_series().n_unique()? <= 1 {
            dropped.insert(name.to_string());
        }
    }
    if dropped.is_empty() {
        return Ok(frame);
    }
    info!("dropping {} single-valued columns: {:?}", dropped.len(), dropped);
    let keep: Vec<String> = column_names(&frame)
        .into_iter()
        .filter(|name| !dropped.contains(name))
        .collect();
    frame.select(keep)
}

/// Feature-engineering conversion: every non-numeric column except `file`
/// becomes categorical. Missing cells take the `"nan"` sentinel so that,
/// like the historical `"sna"`/`"nan"` sentinel categories, the category
/// set always has a value for absent data.
pub fn convert_non_numeric_to_categorical(frame: &DataFrame) -> PolarsResult<DataFrame> {
    let mut out = frame.clone();
    for column in frame.get_columns() {
        let name = column.name().clone();
        if name.as_str() == FILE_COLUMN || is_numeric_dtype(column.dtype()) {
            continue;
        }
        let text = column.as_materialized_series().cast(&DataType::String)?;
        let filled: StringChunked = text
            .str()?
            .into_iter()
            .map(|value| value.or(Some("nan")))
            .collect();
        let mut series = filled
            .into_series()
            .cast(&DataType::Categorical(None, CategoricalOrdering::default()))?;
        series.rename(name);
        out.with_column(series)?;
    }
    Ok(out)
}

/// Remove non-numeric object columns, keeping `file`. Extension point for
/// ethernet recordings; no surface sets the flag that reaches this today.
pub fn drop_object_columns(frame: &DataFrame) -> PolarsResult<DataFrame> {
    let keep: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|column| {
            column.name().as_str() == FILE_COLUMN || is_numeric_dtype(column.dtype())
        })
        .map(|column| column.name().to_string())
        .collect();
    frame.select(keep)
}

/// Partition the combined table into the target block and the feature
/// block. Returns `None`, after logging why, when the target has no entry
/// in the signal list or none of its signals exists as a column — the
/// "no result" outcome, not an error.
pub fn split_target_features(
    frame: &DataFrame,
    target: &str,
    signallist: &SignalList,
) -> PolarsResult<Option<SplitTables>> {
    let Some(target_signals) = signallist.get(target) else {
        error!("no target specified for {}", target);
        return Ok(None);
    };

    let columns: HashSet<String> = column_names(frame).into_iter().collect();
    let existing: Vec<String> = target_signals
        .iter()
        .filter(|signal| columns.contains(*signal))
        .cloned()
        .collect();
    if existing.is_empty() {
        error!("no target found in data for {}", target);
        return Ok(None);
    }

    let target_frame = frame.select(existing.clone())?;
    let existing: HashSet<String> = existing.into_iter().collect();
    let feature_columns: Vec<String> = column_names(frame)
        .into_iter()
        .filter(|name| name != FILE_COLUMN && !existing.contains(name))
        .collect();
    let features = frame.select(feature_columns)?;

    Ok(Some(SplitTables {
        target: target_frame,
        features,
    }))
}

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(key: &str, speed: &[f64], rpm: Option<&[f64]>) -> DataFrame {
        let mut frame = df!("speed" => speed).unwrap();
        if let Some(rpm) = rpm {
            frame.with_column(Column::new("rpm".into(), rpm)).unwrap();
        }
        stamp_file_column(frame, key).unwrap()
    }

    #[test]
    fn stamp_file_column_is_constant_per_session() {
        let frame = session("A", &[1.0, 2.0], None);
        let files = frame.column(FILE_COLUMN).unwrap();
        assert_eq!(files.as_materialized_series().n_unique().unwrap(), 1);
        assert_eq!(frame.height(), 2);
    }

    #[test]
    fn stamp_file_column_replaces_existing_column() {
        let frame = df!("file" => &["old"], "speed" => &[1.0]).unwrap();
        let frame = stamp_file_column(frame, "new").unwrap();
        let names = column_names(&frame);
        assert_eq!(names.iter().filter(|n| *n == FILE_COLUMN).count(), 1);
    }

    #[test]
    fn outer_concat_unions_columns() {
        let a = session("A", &[1.0], Some(&[900.0]));
        let b = session("B", &[2.0], None);
        let combined = concat_sessions(vec![a, b], JoinMode::Outer).unwrap();

        let mut names = column_names(&combined);
        names.sort();
        assert_eq!(names, vec!["file", "rpm", "speed"]);
        assert_eq!(combined.height(), 2);
        // Session B contributed no rpm: the gap is null until filled.
        assert_eq!(combined.column("rpm").unwrap().null_count(), 1);
    }

    #[test]
    fn inner_concat_keeps_only_common_columns() {
        let a = session("A", &[1.0], Some(&[900.0]));
        let b = session("B", &[2.0], None);
        let combined = concat_sessions(vec![a, b], JoinMode::Inner).unwrap();

        let mut names = column_names(&combined);
        names.sort();
        assert_eq!(names, vec!["file", "speed"]);
    }

    #[test]
    fn zero_fill_covers_outer_join_gaps() {
        let a = session("A", &[1.0], Some(&[900.0]));
        let b = session("B", &[2.0], None);
        let combined = concat_sessions(vec![a, b], JoinMode::Outer).unwrap();
        let filled = fill_numeric_nulls_with_zero(&combined).unwrap();

        assert_eq!(filled.column("rpm").unwrap().null_count(), 0);
        let rpm: Vec<Option<f64>> = filled
            .column("rpm")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert!(rpm.contains(&Some(0.0)));
    }

    #[test]
    fn columns_sort_alphabetically() {
        let frame = df!("zeta" => &[1.0], "alpha" => &[2.0], "file" => &["A"]).unwrap();
        let sorted = sort_columns_alphabetically(&frame).unwrap();
        assert_eq!(column_names(&sorted), vec!["alpha", "file", "zeta"]);
    }

    #[test]
    fn constant_columns_are_dropped_except_protected_ones() {
        let frame = df!(
            "flat" => &[5.0, 5.0],
            "live" => &[1.0, 2.0],
            "I_flat" => &[3.0, 3.0],
            "file" => &["A", "A"],
        )
        .unwrap();
        let frame = drop_constant_columns(frame).unwrap();
        let mut names = column_names(&frame);
        names.sort();
        assert_eq!(names, vec!["I_flat", "file", "live"]);
    }

    #[test]
    fn non_numeric_columns_become_categorical_with_sentinel() {
        let frame = df!(
            "gear" => &[Some("N"), None, Some("D")],
            "speed" => &[1.0, 2.0, 3.0],
            "file" => &["A", "A", "A"],
        )
        .unwrap();
        let converted = convert_non_numeric_to_categorical(&frame).unwrap();

        let gear = converted.column("gear").unwrap();
        assert!(matches!(gear.dtype(), DataType::Categorical(_, _)));
        assert_eq!(gear.null_count(), 0);
        // Numeric and file columns are untouched.
        assert_eq!(converted.column("speed").unwrap().dtype(), &DataType::Float64);
        assert_eq!(converted.column("file").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn split_is_a_disjoint_cover() {
        let frame = df!(
            "rpm" => &[900.0],
            "speed" => &[10.0],
            "t" => &[0.0],
            "file" => &["A"],
        )
        .unwrap();
        let mut signallist = SignalList::new();
        signallist.insert("speed".to_string(), vec!["speed".to_string()]);

        let split = split_target_features(&frame, "speed", &signallist)
            .unwrap()
            .unwrap();
        assert_eq!(column_names(&split.target), vec!["speed"]);
        assert_eq!(column_names(&split.features), vec!["rpm", "t"]);
    }

    #[test]
    fn split_drops_missing_target_signals_silently() {
        let frame = df!("brake_pressure" => &[1.0], "file" => &["A"]).unwrap();
        let mut signallist = SignalList::new();
        signallist.insert(
            "brake".to_string(),
            vec!["brake_pressure".to_string(), "brake_temp".to_string()],
        );

        let split = split_target_features(&frame, "brake", &signallist)
            .unwrap()
            .unwrap();
        assert_eq!(column_names(&split.target), vec!["brake_pressure"]);
    }

    #[test]
    fn split_with_no_existing_target_signal_is_no_result() {
        let frame = df!("rpm" => &[900.0], "file" => &["A"]).unwrap();
        let mut signallist = SignalList::new();
        signallist.insert("brake".to_string(), vec!["brake_pressure".to_string()]);

        assert!(split_target_features(&frame, "brake", &signallist)
            .unwrap()
            .is_none());
    }

    #[test]
    fn split_with_unknown_target_is_no_result() {
        let frame = df!("rpm" => &[900.0], "file" => &["A"]).unwrap();
        let signallist = SignalList::new();
        assert!(split_target_features(&frame, "brake", &signallist)
            .unwrap()
            .is_none());
    }

    #[test]
    fn object_column_drop_keeps_numeric_and_file() {
        let frame = df!(
            "gear" => &["N"],
            "speed" => &[1.0],
            "file" => &["A"],
        )
        .unwrap();
        let frame = drop_object_columns(&frame).unwrap();
        let mut names = column_names(&frame);
        names.sort();
        assert_eq!(names, vec!["file", "speed"]);
    }
}
