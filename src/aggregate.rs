use crate::channels::{ChannelMeasure, ControlChannel, MarketingChannel};
use crate::schema::*;
use anyhow::Result;
use polars::prelude::*;

const MARKETING_CHANNEL: &str = "marketing_channel";
const CONTROL_CHANNEL: &str = "control_channel";

pub const NEW_SESSIONS: &str = "new_sessions";

/// Per-period wide channel table plus the spend columns it carries.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    pub frame: DataFrame,
    pub spend_columns: Vec<String>,
}

/// Sum demand measures per (organisation, period).
pub fn aggregate_demand(metrics: &DataFrame, grain: Grain) -> Result<DataFrame> {
    let period = grain.period_column();
    let demand = metrics
        .clone()
        .lazy()
        .group_by([col(ORG_ID), col(period)])
        .agg([
            col(SESSIONS).sum().alias(SESSIONS),
            col(NEW_USERS).sum().alias(NEW_SESSIONS),
            col(NEW_ORDERS).sum().alias(ACQUISITIONS),
            col(NEW_ORDERS_UNITS).sum().alias("acquisition_orders_units"),
            col(NEW_NET_REVENUE).sum().alias("acquisition_net_revenue"),
            col(NEW_ORIGINAL_PRICE).sum().alias("acquisition_original_price"),
            col(NEW_ORDERS_DISCOUNT).sum().alias("acquisition_orders_discount"),
        ])
        .sort([ORG_ID, period], SortMultipleOptions::default())
        .collect()?;
    Ok(demand)
}

/// Wide spend/imps/clicks/new-clicks columns per marketing channel.
///
/// Rows classified as [`MarketingChannel::Other`] take part in the grouping
/// but get no columns of their own.
pub fn pivot_marketing(metrics: &DataFrame, grain: Grain) -> Result<ChannelTable> {
    let platform = metrics.column(CHANNEL_PLATFORM)?.str()?;
    let grouping = metrics.column(CHANNEL_GROUPING)?.str()?;
    let labels: Vec<&str> = platform
        .into_iter()
        .zip(grouping.into_iter())
        .map(|(p, g)| MarketingChannel::classify(p.unwrap_or(""), g.unwrap_or("")).label())
        .collect();

    let mut pivots = Vec::new();
    for channel in MarketingChannel::PIVOTED {
        for measure in MarketingChannel::MEASURES {
            let source = match measure {
                ChannelMeasure::Spend => MARKETING_SPEND,
                ChannelMeasure::Imps => MARKETING_IMPRESSIONS,
                ChannelMeasure::Clicks => SESSIONS,
                ChannelMeasure::NewClicks => NEW_USERS,
            };
            pivots.push((channel.label(), source, channel.column(measure)));
        }
    }

    let frame = pivot_channels(metrics, grain, MARKETING_CHANNEL, labels, &pivots)?;
    let spend_columns = MarketingChannel::PIVOTED
        .iter()
        .map(|c| c.column(ChannelMeasure::Spend))
        .collect();
    Ok(ChannelTable { frame, spend_columns })
}

/// Wide clicks/new-clicks columns per control channel, `other` included.
pub fn pivot_controls(metrics: &DataFrame, grain: Grain) -> Result<ChannelTable> {
    let labels: Vec<&str> = metrics
        .column(CHANNEL_GROUPING)?
        .str()?
        .into_iter()
        .map(|g| ControlChannel::classify(g.unwrap_or("")).label())
        .collect();

    let mut pivots = Vec::new();
    for channel in ControlChannel::ALL {
        pivots.push((channel.label(), SESSIONS, channel.column(ChannelMeasure::Clicks)));
        pivots.push((channel.label(), NEW_USERS, channel.column(ChannelMeasure::NewClicks)));
    }

    let frame = pivot_channels(metrics, grain, CONTROL_CHANNEL, labels, &pivots)?;
    Ok(ChannelTable { frame, spend_columns: Vec::new() })
}

/// Group by (organisation, period) and spread `(label, source, output)` sums
/// into one column each. Absent label/period combinations sum to zero.
fn pivot_channels(
    metrics: &DataFrame,
    grain: Grain,
    label_column: &str,
    labels: Vec<&str>,
    pivots: &[(&str, &str, String)],
) -> Result<DataFrame> {
    let period = grain.period_column();
    let mut long = metrics.select([ORG_ID, period, SESSIONS, NEW_USERS, MARKETING_SPEND, MARKETING_IMPRESSIONS])?;
    long.with_column(Series::new(label_column.into(), labels))?;

    let aggs: Vec<Expr> = pivots
        .iter()
        .map(|(label, source, output)| {
            when(col(label_column).eq(lit(*label)))
                .then(col(*source))
                .otherwise(lit(0.0))
                .sum()
                .alias(output.as_str())
        })
        .collect();

    let wide = long
        .lazy()
        .group_by([col(ORG_ID), col(period)])
        .agg(aggs)
        .sort([ORG_ID, period], SortMultipleOptions::default())
        .collect()?;
    Ok(wide)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::records_to_dataframe;
    use chrono::NaiveDate;

    fn record(day: u32, platform: &str, grouping: &str, spend: f64, sessions: f64) -> MetricRecord {
        MetricRecord {
            benchmark_organisation_id: "o1".into(),
            channel_platform: platform.into(),
            channel_grouping: grouping.into(),
            day_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            marketing_spend: spend,
            marketing_impressions: spend * 10.0,
            sessions,
            new_users: sessions / 2.0,
            new_orders: 1.0,
            ..Default::default()
        }
    }

    fn value(df: &DataFrame, name: &str, row: usize) -> Option<f64> {
        df.column(name).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn test_demand_per_period() {
        let df = records_to_dataframe(&[
            record(13, "google", "Display", 1.0, 10.0),
            record(13, "facebook", "Paid Social", 2.0, 4.0),
            record(14, "", "Direct", 0.0, 6.0),
        ])
        .unwrap();
        let daily = aggregate_demand(&df, Grain::Daily).unwrap();
        assert_eq!(daily.height(), 2);
        assert_eq!(value(&daily, SESSIONS, 0), Some(14.0));
        assert_eq!(value(&daily, NEW_SESSIONS, 0), Some(7.0));
        assert_eq!(value(&daily, ACQUISITIONS, 0), Some(2.0));

        let weekly = aggregate_demand(&df, Grain::Weekly).unwrap();
        assert_eq!(weekly.height(), 1);
        assert_eq!(value(&weekly, SESSIONS, 0), Some(20.0));
    }

    #[test]
    fn test_marketing_pivot_columns() {
        let df = records_to_dataframe(&[
            record(13, "google", "Paid Search - Generic", 5.0, 10.0),
            record(13, "google", "Paid Search - Branded", 7.0, 3.0),
            record(13, "instagram", "Paid Social", 2.0, 4.0),
            record(14, "tiktok", "Paid Social", 9.0, 1.0),
        ])
        .unwrap();
        let table = pivot_marketing(&df, Grain::Daily).unwrap();
        let wide = &table.frame;
        assert_eq!(wide.height(), 2);
        assert_eq!(wide.width(), 2 + 6 * 4);
        assert_eq!(value(wide, "google_search_spend", 0), Some(5.0));
        assert_eq!(value(wide, "google_search_imps", 0), Some(50.0));
        assert_eq!(value(wide, "meta_clicks", 0), Some(4.0));
        assert_eq!(value(wide, "meta_new_clicks", 0), Some(2.0));
        assert_eq!(value(wide, "google_video_spend", 0), Some(0.0));
        // other-only period keeps its row with zero channel columns
        assert_eq!(value(wide, "meta_spend", 1), Some(0.0));
        assert!(wide.column("other_spend").is_err());
        assert_eq!(table.spend_columns.len(), 6);
        assert!(table.spend_columns.contains(&"google_pmax_spend".to_string()));
    }

    #[test]
    fn test_control_pivot_keeps_other() {
        let df = records_to_dataframe(&[
            record(13, "google", "Paid Search - Branded", 0.0, 3.0),
            record(13, "", "Direct", 0.0, 8.0),
            record(13, "", "Email", 0.0, 2.0),
        ])
        .unwrap();
        let table = pivot_controls(&df, Grain::Daily).unwrap();
        let wide = &table.frame;
        assert_eq!(wide.width(), 2 + 6 * 2);
        assert_eq!(value(wide, "branded_search_clicks", 0), Some(3.0));
        assert_eq!(value(wide, "direct_clicks", 0), Some(8.0));
        assert_eq!(value(wide, "direct_new_clicks", 0), Some(4.0));
        assert_eq!(value(wide, "other_clicks", 0), Some(2.0));
        assert!(table.spend_columns.is_empty());
    }
}
