//! CSV reference backend.
//!
//! Reads measurement files that carry CSV text: a `t` time column in
//! seconds plus one column per signal. This backend exists so the binary
//! and the integration tests can exercise the whole pipeline; a real MDF
//! decoder plugs in through the [`BusReader`] trait instead.

use std::collections::HashSet;
use std::path::Path;

use polars::prelude::*;

use crate::consts::TIME_COLUMN;
use crate::utils::is_numeric_dtype;

use super::{signal_matches, BusReader, ReaderError, TableOptions};

/// Comparison slack when matching sample times against the raster grid.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvBusReader;

impl CsvBusReader {
    pub fn new() -> Self {
        Self
    }
}

/// One opened (or filtered) measurement file.
#[derive(Debug)]
pub struct CsvHandle {
    frame: DataFrame,
    signals: Vec<String>,
}

/// All filtered parts of one session, awaiting resampling.
#[derive(Debug)]
pub struct CsvStack {
    parts: Vec<CsvHandle>,
}

enum SignalSamples {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl BusReader for CsvBusReader {
    type Open = CsvHandle;
    type Filtered = CsvHandle;
    type Stacked = CsvStack;

    fn open(&self, path: &Path) -> Result<CsvHandle, ReaderError> {
        let open_err = |source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        };
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(open_err)?
            .finish()
            .map_err(open_err)?;

        if frame.column(TIME_COLUMN).is_err() {
            return Err(ReaderError::MissingTimeColumn {
                path: path.to_path_buf(),
                column: TIME_COLUMN.to_string(),
            });
        }

        let signals = frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name != TIME_COLUMN)
            .collect();

        Ok(CsvHandle { frame, signals })
    }

    fn list_signals(
        &self,
        handle: &CsvHandle,
        pattern: &str,
        case_insensitive: bool,
    ) -> Vec<String> {
        handle
            .signals
            .iter()
            .filter(|name| signal_matches(name, pattern, case_insensitive))
            .cloned()
            .collect()
    }

    fn filter(&self, handle: CsvHandle, signals: &[String]) -> Result<CsvHandle, ReaderError> {
        let keep: HashSet<&String> = signals.iter().collect();
        let CsvHandle {
            frame,
            signals: available,
        } = handle;
        let signals = available
            .into_iter()
            .filter(|name| keep.contains(name))
            .collect();
        Ok(CsvHandle { frame, signals })
    }

    fn stack(&self, handles: Vec<CsvHandle>) -> Result<CsvStack, ReaderError> {
        if handles.is_empty() {
            return Err(ReaderError::EmptyStack);
        }
        Ok(CsvStack { parts: handles })
    }

    fn to_dataframe(
        &self,
        handle: CsvStack,
        raster: f64,
        options: &TableOptions,
    ) -> Result<DataFrame, ReaderError> {
        // reduce_memory and ignore_value_conversions are accepted hints;
        // CSV columns already carry their final dtype.
        if !raster.is_finite() || raster <= 0.0 {
            return Err(ReaderError::InvalidRaster { raster });
        }

        let mut parts = Vec::with_capacity(handle.parts.len());
        let mut duration = 0.0f64;
        for part in handle.parts {
            let part = PreparedPart::prepare(part, options.time_from_zero)?;
            if let Some(&last) = part.times.last() {
                duration = duration.max(last);
            }
            parts.push(part);
        }

        let steps = (duration / raster + TIME_EPSILON).floor() as usize;
        let grid: Vec<f64> = (0..=steps).map(|i| i as f64 * raster).collect();

        let mut columns = vec![Column::new(TIME_COLUMN.into(), &grid)];
        let mut seen: HashSet<String> = HashSet::new();
        for part in &parts {
            for (name, samples) in &part.signals {
                // First occurrence of a signal name wins across parts.
                if !seen.insert(name.clone()) {
                    continue;
                }
                let column = match samples {
                    SignalSamples::Numeric(values) => {
                        Column::new(name.as_str().into(), resample(&part.times, values, &grid))
                    }
                    SignalSamples::Text(values) => {
                        Column::new(name.as_str().into(), resample(&part.times, values, &grid))
                    }
                };
                columns.push(column);
            }
        }

        DataFrame::new(columns).map_err(|source| ReaderError::Table { source })
    }
}

/// One part with its time axis extracted, sorted and optionally shifted
/// to start at zero. Rows without a time value are discarded.
struct PreparedPart {
    times: Vec<f64>,
    signals: Vec<(String, SignalSamples)>,
}

impl PreparedPart {
    fn prepare(part: CsvHandle, time_from_zero: bool) -> Result<Self, ReaderError> {
        let table_err = |source| ReaderError::Table { source };

        let sorted = part
            .frame
            .sort([TIME_COLUMN], SortMultipleOptions::default())
            .map_err(table_err)?;

        let raw_times = numeric_values(sorted.column(TIME_COLUMN).map_err(table_err)?)
            .map_err(table_err)?;
        let keep: Vec<usize> = raw_times
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_some())
            .map(|(i, _)| i)
            .collect();
        let mut times: Vec<f64> = raw_times.into_iter().flatten().collect();
        if time_from_zero {
            if let Some(&t0) = times.first() {
                for t in &mut times {
                    *t -= t0;
                }
            }
        }

        let mut signals = Vec::with_capacity(part.signals.len());
        for name in &part.signals {
            let column = sorted.column(name).map_err(table_err)?;
            let samples = if is_numeric_dtype(column.dtype()) {
                let values = numeric_values(column).map_err(table_err)?;
                SignalSamples::Numeric(select_rows(&values, &keep))
            } else {
                let values = text_values(column).map_err(table_err)?;
                SignalSamples::Text(select_rows(&values, &keep))
            };
            signals.push((name.clone(), samples));
        }

        Ok(Self { times, signals })
    }
}

fn numeric_values(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn text_values(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

fn select_rows<T: Clone>(values: &[Option<T>], keep: &[usize]) -> Vec<Option<T>> {
    keep.iter().map(|&i| values[i].clone()).collect()
}

/// Forward-fill resampling: each grid point takes the most recent sample
/// at or before it, or null before the first sample.
fn resample<T: Clone>(times: &[f64], values: &[Option<T>], grid: &[f64]) -> Vec<Option<T>> {
    let mut out = Vec::with_capacity(grid.len());
    let mut next = 0usize;
    let mut current: Option<T> = None;
    for &point in grid {
        while next < times.len() && times[next] <= point + TIME_EPSILON {
            current = values[next].clone();
            next += 1;
        }
        out.push(current.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn options() -> TableOptions {
        TableOptions {
            time_from_zero: true,
            reduce_memory: true,
            ignore_value_conversions: true,
        }
    }

    #[test]
    fn open_lists_signals_without_time_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.mf4", "t,speed,rpm\n0.0,1.0,900\n");
        let reader = CsvBusReader::new();
        let handle = reader.open(&path).unwrap();
        let mut signals = reader.list_signals(&handle, "*", true);
        signals.sort();
        assert_eq!(signals, vec!["rpm".to_string(), "speed".to_string()]);
    }

    #[test]
    fn open_without_time_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.mf4", "speed,rpm\n1.0,900\n");
        let err = CsvBusReader::new().open(&path).unwrap_err();
        assert!(matches!(err, ReaderError::MissingTimeColumn { .. }));
    }

    #[test]
    fn filter_restricts_to_requested_signals() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.mf4", "t,speed,rpm\n0.0,1.0,900\n");
        let reader = CsvBusReader::new();
        let handle = reader.open(&path).unwrap();
        let filtered = reader.filter(handle, &["speed".to_string()]).unwrap();
        assert_eq!(reader.list_signals(&filtered, "*", true), vec!["speed"]);
    }

    #[test]
    fn stack_of_nothing_is_an_error() {
        let err = CsvBusReader::new().stack(Vec::new()).unwrap_err();
        assert!(matches!(err, ReaderError::EmptyStack));
    }

    #[test]
    fn resample_forward_fills_onto_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "a.mf4",
            "t,speed\n0.0,10.0\n0.3,20.0\n1.0,30.0\n",
        );
        let reader = CsvBusReader::new();
        let handle = reader.open(&path).unwrap();
        let stacked = reader.stack(vec![handle]).unwrap();
        let df = reader.to_dataframe(stacked, 0.5, &options()).unwrap();

        assert_eq!(df.height(), 3); // grid 0.0, 0.5, 1.0
        let speed: Vec<Option<f64>> = df
            .column("speed")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(speed, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn stack_merges_signals_from_both_parts() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(dir.path(), "a.mf4", "t,speed\n0.0,10.0\n1.0,20.0\n");
        let b = write_csv(dir.path(), "b.mf4", "t,rpm\n0.0,900\n1.0,950\n");
        let reader = CsvBusReader::new();
        let parts = vec![reader.open(&a).unwrap(), reader.open(&b).unwrap()];
        let stacked = reader.stack(parts).unwrap();
        let df = reader.to_dataframe(stacked, 1.0, &options()).unwrap();

        let mut names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["rpm", "speed", "t"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn time_from_zero_shifts_offset_recordings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.mf4", "t,speed\n100.0,10.0\n101.0,20.0\n");
        let reader = CsvBusReader::new();
        let handle = reader.open(&path).unwrap();
        let stacked = reader.stack(vec![handle]).unwrap();
        let df = reader.to_dataframe(stacked, 1.0, &options()).unwrap();

        assert_eq!(df.height(), 2);
        let first = df
            .column("speed")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0);
        assert_eq!(first, Some(10.0));
    }

    #[test]
    fn zero_raster_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.mf4", "t,speed\n0.0,1.0\n");
        let reader = CsvBusReader::new();
        let handle = reader.open(&path).unwrap();
        let stacked = reader.stack(vec![handle]).unwrap();
        let err = reader.to_dataframe(stacked, 0.0, &options()).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidRaster { .. }));
    }

    #[test]
    fn text_signals_survive_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "a.mf4",
            "t,gear\n0.0,N\n1.0,D\n",
        );
        let reader = CsvBusReader::new();
        let handle = reader.open(&path).unwrap();
        let stacked = reader.stack(vec![handle]).unwrap();
        let df = reader.to_dataframe(stacked, 1.0, &options()).unwrap();
        let gear = df.column("gear").unwrap();
        assert_eq!(gear.dtype(), &DataType::String);
    }
}
