//! Rolling-window folds for time-series cross-validation.
//!
//! A fold is an inclusive window of `training_periods` periods; rows inside
//! it are in-sample and every other row is out-of-sample. Folds before the
//! last advance by a fixed stride from the first date, the last fold is
//! anchored to the final date.

use crate::error::PipelineError;
use crate::schema::{date_from_epoch_days, Grain};
use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldSpec {
    /// 1-indexed.
    pub fold_number: usize,
    pub total_folds: usize,
    /// Window length in periods of `grain`.
    pub training_periods: usize,
    pub grain: Grain,
}

/// Inclusive in-sample date range of one fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FoldSpec {
    pub fn new(fold_number: usize, total_folds: usize, training_periods: usize, grain: Grain) -> Self {
        Self { fold_number, total_folds, training_periods, grain }
    }

    pub fn training_days(&self) -> i64 {
        self.training_periods as i64 * self.grain.days_per_period()
    }

    pub fn validate(&self, rows: usize) -> Result<(), PipelineError> {
        if self.fold_number == 0 || self.fold_number > self.total_folds {
            return Err(PipelineError::InvalidFold {
                fold_number: self.fold_number,
                total_folds: self.total_folds,
            });
        }
        if self.training_periods >= rows {
            return Err(PipelineError::InsufficientHistory {
                training_periods: self.training_periods,
                rows,
            });
        }
        Ok(())
    }

    /// Window bounds as epoch days, given the first and final dates.
    fn window_days(&self, first: i32, last: i32) -> (i64, i64) {
        let (first, last) = (first as i64, last as i64);
        let training_days = self.training_days();
        if self.fold_number < self.total_folds {
            let shift = (last - first - training_days).div_euclid(self.total_folds as i64);
            let start = first + (self.fold_number as i64 - 1) * shift;
            (start, start + training_days - 1)
        } else {
            (last - training_days + 1, last)
        }
    }
}

fn date_days(df: &DataFrame, date_column: &str) -> Result<Vec<Option<i32>>> {
    let missing = || PipelineError::MissingDateColumn(date_column.to_string());
    let column = df.column(date_column).map_err(|_| missing())?;
    let days = match column.dtype() {
        DataType::Date => column.cast(&DataType::Int32)?,
        DataType::Datetime(_, _) => column.cast(&DataType::Date)?.cast(&DataType::Int32)?,
        _ => return Err(missing().into()),
    };
    let days = days.i32()?.into_iter().collect();
    Ok(days)
}

fn date_bounds(days: &[Option<i32>]) -> Option<(i32, i32)> {
    let first = days.iter().flatten().min()?;
    let last = days.iter().flatten().max()?;
    Some((*first, *last))
}

fn resolve(df: &DataFrame, spec: &FoldSpec, date_column: &str) -> Result<(Vec<Option<i32>>, i64, i64)> {
    spec.validate(df.height())?;
    let days = date_days(df, date_column)?;
    let (first, last) = date_bounds(&days)
        .ok_or_else(|| PipelineError::MissingDateColumn(date_column.to_string()))?;
    let (start, end) = spec.window_days(first, last);
    Ok((days, start, end))
}

/// The in-sample window of one fold over the table's date range.
pub fn fold_window(df: &DataFrame, spec: &FoldSpec, date_column: &str) -> Result<FoldWindow> {
    let (_, start, end) = resolve(df, spec, date_column)?;
    Ok(FoldWindow {
        start: date_from_epoch_days(start as i32),
        end: date_from_epoch_days(end as i32),
    })
}

/// Boolean mask, aligned with `df`, that is true for in-sample rows.
pub fn in_sample_mask(df: &DataFrame, spec: &FoldSpec, date_column: &str) -> Result<BooleanChunked> {
    let (days, start, end) = resolve(df, spec, date_column)?;
    let mask: Vec<bool> = days
        .iter()
        .map(|d| d.map_or(false, |d| (start..=end).contains(&(d as i64))))
        .collect();
    Ok(BooleanChunked::from_slice(
        format!("in_sample_fold_{}", spec.fold_number).into(),
        &mask,
    ))
}

/// Masks for every fold `1..=total_folds`.
pub fn fold_masks(
    df: &DataFrame,
    total_folds: usize,
    training_periods: usize,
    grain: Grain,
    date_column: &str,
) -> Result<Vec<BooleanChunked>> {
    (1..=total_folds)
        .map(|fold| in_sample_mask(df, &FoldSpec::new(fold, total_folds, training_periods, grain), date_column))
        .collect()
}
