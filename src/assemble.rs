use crate::aggregate::ChannelTable;
use crate::schema::*;
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Assembled per-(organisation, period) regression rows.
#[derive(Debug, Clone)]
pub struct RegressionTable {
    pub frame: DataFrame,
    pub grain: Grain,
    /// Spend measures tagged when the marketing table was built.
    pub spend_columns: Vec<String>,
}

impl RegressionTable {
    pub fn period_column(&self) -> &'static str {
        self.grain.period_column()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Join attributes, demand, marketing and controls into one wide table.
///
/// Organisations without demand rows drop out of the inner join; periods
/// without marketing or control activity keep nulls in those columns.
pub fn assemble(
    attributes: &DataFrame,
    demand: &DataFrame,
    marketing: &ChannelTable,
    controls: &ChannelTable,
    grain: Grain,
) -> Result<RegressionTable> {
    let period = grain.period_column();
    let keys = [col(ORG_ID), col(period)];

    let joined = attributes
        .clone()
        .lazy()
        .join(
            demand.clone().lazy(),
            [col(ORG_ID)],
            [col(ORG_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            marketing.frame.clone().lazy(),
            keys.clone(),
            keys.clone(),
            JoinArgs::new(JoinType::Left),
        )
        .join(
            controls.frame.clone().lazy(),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Left),
        )
        .sort([ORG_ID, period], SortMultipleOptions::default())
        .collect()?;

    let lowercase: Vec<Expr> = joined
        .get_column_names()
        .iter()
        .map(|name| col(name.as_str()).alias(name.to_lowercase()))
        .collect();
    let frame = joined.lazy().select(lowercase).collect()?;
    debug!(rows = frame.height(), columns = frame.width(), "assembled regression rows");

    let spend_columns = marketing
        .spend_columns
        .iter()
        .chain(controls.spend_columns.iter())
        .map(|c| c.to_lowercase())
        .collect();
    Ok(RegressionTable { frame, grain, spend_columns })
}
