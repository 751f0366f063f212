//! Static organisation descriptors derived from all of an organisation's rows.

use crate::error::PipelineError;
use crate::schema::*;
use anyhow::Result;
use polars::prelude::*;
use std::collections::BTreeMap;

const REVENUE: &str = "revenue";

pub const GMV_BUCKET_OUT: &str = "gmv_bucket";
pub const VERTICAL_OUT: &str = "vertical";
pub const SUB_VERTICAL_OUT: &str = "sub_vertical";

/// One row per organisation: top territory, its AOV and the static tuple.
///
/// The top territory is the sub-territory with the highest summed net
/// revenue; equal revenues resolve to the lexicographically smallest name.
/// A top territory without orders has a null AOV.
pub fn extract_attributes(metrics: &DataFrame) -> Result<DataFrame> {
    let top = top_territories(metrics.clone().lazy());
    let statics = static_attributes(metrics)?;

    let attributes = top
        .join(
            statics.lazy(),
            [col(ORG_ID)],
            [col(ORG_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([ORG_ID], SortMultipleOptions::default())
        .collect()?;
    Ok(attributes)
}

fn top_territories(metrics: LazyFrame) -> LazyFrame {
    metrics
        .group_by([col(ORG_ID), col(SUB_TERRITORY)])
        .agg([
            col(ORDERS).sum().alias(ORDERS),
            col(NET_REVENUE).sum().alias(REVENUE),
        ])
        .sort(
            [ORG_ID, REVENUE, SUB_TERRITORY],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, false])
                .with_nulls_last(true),
        )
        // row order inside each group follows the sort above
        .group_by_stable([col(ORG_ID)])
        .agg([
            col(SUB_TERRITORY).first().alias(TOP_TERRITORY),
            col(ORDERS).first().alias(ORDERS),
            col(REVENUE).first().alias(REVENUE),
        ])
        .with_column(
            when(col(ORDERS).eq(lit(0.0)))
                .then(lit(NULL).cast(DataType::Float64))
                .otherwise(col(REVENUE) / col(ORDERS))
                .alias(AOV),
        )
        .select([col(ORG_ID), col(TOP_TERRITORY), col(AOV)])
}

/// Distinct (gmv bucket, vertical, sub-vertical) per organisation; more than
/// one tuple for an organisation is a data error.
fn static_attributes(metrics: &DataFrame) -> Result<DataFrame> {
    let statics = metrics
        .clone()
        .lazy()
        .group_by_stable([col(ORG_ID), col(GMV_BUCKET), col(VERTICAL), col(SUB_VERTICAL)])
        .agg([col(SESSIONS).count().alias("rows")])
        .select([
            col(ORG_ID),
            col(GMV_BUCKET).alias(GMV_BUCKET_OUT),
            col(VERTICAL).alias(VERTICAL_OUT),
            col(SUB_VERTICAL).alias(SUB_VERTICAL_OUT),
        ])
        .collect()?;

    let mut tuples: BTreeMap<String, usize> = BTreeMap::new();
    for org in statics.column(ORG_ID)?.str()?.into_iter() {
        *tuples.entry(org.unwrap_or_default().to_string()).or_default() += 1;
    }
    if let Some((organisation_id, tuples)) = tuples.into_iter().find(|(_, n)| *n > 1) {
        return Err(PipelineError::InconsistentAttributes { organisation_id, tuples }.into());
    }
    Ok(statics)
}
