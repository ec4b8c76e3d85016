//! Merges several series into one chart table on a shared time axis.
//!
//! Only [`AlignmentStrategy::Positional`] exists. It compares slot `j` of every
//! series with slot `j` of the reference axis and does not join on timestamps,
//! so it is only meaningful when all counters share one sampling interval.
//! Mixed-cadence counters come out NaN-padded.

use crate::models::{AlignedTable, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentStrategy {
    /// Index-by-index comparison against the longest series.
    #[default]
    Positional,
}

pub fn align(series: &[Series]) -> AlignedTable {
    align_with(AlignmentStrategy::default(), series)
}

pub fn align_with(strategy: AlignmentStrategy, series: &[Series]) -> AlignedTable {
    match strategy {
        AlignmentStrategy::Positional => align_positional(series),
    }
}

/// Longest series wins; ties go to the earliest one.
fn reference_index(series: &[Series]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, s) in series.iter().enumerate() {
        match best {
            Some((_, len)) if s.len() <= len => {}
            _ => best = Some((i, s.len())),
        }
    }
    best.map(|(i, _)| i)
}

fn align_positional(series: &[Series]) -> AlignedTable {
    let mut table = AlignedTable::default();
    let Some(reference) = reference_index(series) else {
        return table;
    };

    table.timestamps = series[reference].points.iter().map(|p| p.timestamp).collect();

    for s in series {
        let column = table
            .timestamps
            .iter()
            .enumerate()
            .map(|(j, ts)| match s.points.get(j) {
                Some(point) if point.timestamp == *ts => point.value,
                _ => f64::NAN,
            })
            .collect();
        // last write wins on duplicate counter names
        table.columns.insert(s.counter.clone(), column);
    }

    table
}
