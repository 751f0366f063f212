use crate::assemble::RegressionTable;
use crate::schema::*;
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which running totals must turn positive before rows are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TrimMode {
    /// Cumulative spend only. Re-trimming its own output removes nothing.
    #[default]
    Spend,
    /// Cumulative spend and cumulative acquisitions.
    ///
    /// Not idempotent: when the last spend falls before the first
    /// acquisition, a second pass sees no spend in the kept rows.
    SpendAndAcquisitions,
}

// === Helper functions ====================================================

fn row_totals(df: &DataFrame, columns: &[String]) -> Result<Vec<f64>> {
    let mut totals = vec![0.0; df.height()];
    for name in columns {
        let values = df.column(name)?.cast(&DataType::Float64)?;
        for (total, v) in totals.iter_mut().zip(values.f64()?.into_iter()) {
            *total += v.unwrap_or(0.0);
        }
    }
    Ok(totals)
}

/// Per key run, true from the first row whose running sum is positive.
/// Rows must be grouped by key.
fn positive_from_first(values: &[f64], keys: &[Option<&str>]) -> Vec<bool> {
    let mut out = Vec::with_capacity(values.len());
    let mut key = keys.first().copied().flatten();
    let mut sum = 0.0;
    let mut reached = false;
    for (i, v) in values.iter().enumerate() {
        if keys[i] != key {
            key = keys[i];
            sum = 0.0;
            reached = false;
        }
        sum += v;
        reached |= sum > 0.0;
        out.push(reached);
    }
    out
}

fn fill_nulls(df: DataFrame) -> Result<DataFrame> {
    let fills: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|c| {
            let name = c.name().as_str();
            match c.dtype() {
                DataType::String => col(name).fill_null(lit("0.0")),
                DataType::Date | DataType::Datetime(_, _) => col(name),
                _ => col(name).fill_null(lit(0.0)),
            }
        })
        .collect();
    Ok(df.lazy().select(fills).collect()?)
}

// === Trimming ============================================================

/// Drop each organisation's leading periods before marketing is present.
///
/// Rows are kept from the first period where cumulative spend over the tagged
/// spend columns is positive (and, for [`TrimMode::SpendAndAcquisitions`],
/// cumulative acquisitions too). Remaining nulls are then filled with `0.0`.
pub fn trim_history(table: RegressionTable, mode: TrimMode) -> Result<RegressionTable> {
    let period = table.period_column();
    let RegressionTable { frame, grain, spend_columns } = table;
    let sorted = frame
        .lazy()
        .sort([ORG_ID, period], SortMultipleOptions::default())
        .collect()?;

    let mask = {
        let keys: Vec<Option<&str>> = sorted.column(ORG_ID)?.str()?.into_iter().collect();
        let spend = positive_from_first(&row_totals(&sorted, &spend_columns)?, &keys);
        match mode {
            TrimMode::Spend => spend,
            TrimMode::SpendAndAcquisitions => {
                let acquisitions = row_totals(&sorted, &[ACQUISITIONS.to_string()])?;
                let acquired = positive_from_first(&acquisitions, &keys);
                spend.iter().zip(acquired).map(|(s, a)| *s && a).collect()
            }
        }
    };

    let trimmed = sorted.filter(&BooleanChunked::from_slice("keep".into(), &mask))?;
    debug!(before = sorted.height(), after = trimmed.height(), ?mode, "trimmed leading history");

    Ok(RegressionTable {
        frame: fill_nulls(trimmed)?,
        grain,
        spend_columns,
    })
}
