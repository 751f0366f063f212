use crate::aggregate::{aggregate_demand, pivot_controls, pivot_marketing};
use crate::assemble::{assemble, RegressionTable};
use crate::attributes::extract_attributes;
use crate::config::PipelineOptions;
use crate::loader::MetricSource;
use crate::trim::trim_history;
use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::join;
use rayon::prelude::*;
use tracing::{info, warn};

/// Regression rows for one organisation, read from `source`.
pub fn build_regression_data(
    source: &MetricSource,
    org_id: &str,
    options: &PipelineOptions,
) -> Result<RegressionTable> {
    let metrics = source
        .load_organisation(org_id)
        .with_context(|| format!("Failed to load metrics for organisation {org_id}"))?;
    if metrics.height() == 0 {
        warn!(org_id, "no metric rows for organisation");
    }
    let table = build_from_metrics(&metrics, options)
        .with_context(|| format!("Failed to build regression data for organisation {org_id}"))?;
    info!(
        org_id,
        grain = %options.grain,
        input_rows = metrics.height(),
        output_rows = table.height(),
        "built regression data"
    );
    Ok(table)
}

/// Run every stage over already-filtered metric rows.
pub fn build_from_metrics(metrics: &DataFrame, options: &PipelineOptions) -> Result<RegressionTable> {
    let grain = options.grain;
    let ((attributes, demand), (marketing, controls)) = join(
        || join(|| extract_attributes(metrics), || aggregate_demand(metrics, grain)),
        || join(|| pivot_marketing(metrics, grain), || pivot_controls(metrics, grain)),
    );
    let table = assemble(&attributes?, &demand?, &marketing?, &controls?, grain)?;
    trim_history(table, options.trim_mode)
}

/// Build several organisations independently and in parallel.
pub fn build_many(
    source: &MetricSource,
    org_ids: &[String],
    options: &PipelineOptions,
) -> Result<Vec<RegressionTable>> {
    org_ids
        .par_iter()
        .map(|org_id| build_regression_data(source, org_id, options))
        .collect()
}

/// Stack per-organisation tables in the given order, skipping empty ones.
pub fn stack_tables(tables: &[RegressionTable]) -> Result<DataFrame> {
    let mut frames = tables.iter().map(|t| &t.frame).filter(|df| df.height() > 0);
    let Some(first) = frames.next() else {
        return Ok(DataFrame::default());
    };
    let mut out = first.clone();
    for df in frames {
        out.vstack_mut(df)?;
    }
    Ok(out)
}
