//! Final pass over the row store: per-second means, or every row unchanged.
use crate::average::{Average, Mean};
use crate::data::output::RowSink;
use crate::data::row::{truncate_to_second, Row, COLUMNS};
use crate::data::store::RowStore;
use crate::error::AppResult;

const PROGRESS_INTERVAL: usize = 1_000_000;

/// How rows leave the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceMode {
    /// One row per completed second holding the mean of every column.
    Aggregate,
    /// Every stored row, unchanged.
    PassThrough,
}

/// Walk `rows` in order and hand the result to `sink`. Returns the number of rows emitted.
pub fn reduce(rows: &RowStore, mode: ReduceMode, sink: &mut dyn RowSink) -> AppResult<u64> {
    let emitted = match mode {
        ReduceMode::Aggregate => aggregate_by_second(rows, sink)?,
        ReduceMode::PassThrough => pass_through(rows, sink)?,
    };
    sink.finish()?;
    tracing::info!(input_rows = rows.len(), output_rows = emitted, ?mode, "Reduction complete");
    Ok(emitted)
}

/// Emit the column means of each second when the next second begins.
///
/// The last second in the store has no successor and is not emitted.
pub fn aggregate_by_second(rows: &RowStore, sink: &mut dyn RowSink) -> AppResult<u64> {
    let mut means: [Mean; COLUMNS] = Default::default();
    let mut current: Option<(i64, String)> = None;
    let mut emitted = 0u64;

    for (index, row) in rows.iter().enumerate() {
        let second = row.epoch_seconds()?;
        if let Some((tracked, datetime)) = &current {
            if *tracked != second {
                emit(&mut means, datetime, sink)?;
                emitted += 1;
            }
        }
        for (mean, value) in means.iter_mut().zip(row.values()) {
            mean.add(*value)?;
        }
        current = Some((second, row.datetime().to_owned()));

        if index > 0 && index % PROGRESS_INTERVAL == 0 {
            tracing::debug!(rows = index, emitted, "Reducing");
        }
    }
    Ok(emitted)
}

fn emit(means: &mut [Mean; COLUMNS], datetime: &str, sink: &mut dyn RowSink) -> AppResult<()> {
    let mut values = [0.0; COLUMNS];
    for (value, mean) in values.iter_mut().zip(means.iter_mut()) {
        *value = mean.average()?;
        mean.reset();
    }
    sink.write_row(&Row::new(truncate_to_second(datetime), values))
}

/// Emit every stored row unchanged.
pub fn pass_through(rows: &RowStore, sink: &mut dyn RowSink) -> AppResult<u64> {
    let mut emitted = 0u64;
    for row in rows.iter() {
        sink.write_row(&row)?;
        emitted += 1;
        if emitted as usize % PROGRESS_INTERVAL == 0 {
            tracing::debug!(emitted, "Passing rows through");
        }
    }
    Ok(emitted)
}
