use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// === Column names ========================================================

pub const ORG_ID: &str = "benchmark_organisation_id";
pub const GMV_BUCKET: &str = "organisation_gmv_bucket";
pub const VERTICAL: &str = "vertical_name";
pub const SUB_VERTICAL: &str = "vertical_category_name";
pub const TERRITORY: &str = "territory";
pub const SUB_TERRITORY: &str = "sub_territory";
pub const CHANNEL_GROUPING: &str = "channel_grouping";
pub const CHANNEL_PLATFORM: &str = "channel_platform";
pub const DAY_DATE: &str = "day_date";
pub const WEEK_DATE: &str = "week_date";

pub const SESSIONS: &str = "sessions";
pub const NEW_USERS: &str = "new_users";
pub const ORDERS: &str = "orders";
pub const NEW_ORDERS: &str = "new_orders";
pub const ORDERS_UNITS: &str = "orders_units";
pub const NEW_ORDERS_UNITS: &str = "new_orders_units";
pub const NET_REVENUE: &str = "net_revenue";
pub const NEW_NET_REVENUE: &str = "new_net_revenue";
pub const ORIGINAL_PRICE: &str = "original_price";
pub const NEW_ORIGINAL_PRICE: &str = "new_original_price";
pub const ORDERS_DISCOUNT: &str = "orders_discount";
pub const NEW_ORDERS_DISCOUNT: &str = "new_orders_discount";
pub const MARKETING_SPEND: &str = "marketing_spend";
pub const MARKETING_IMPRESSIONS: &str = "marketing_impressions";

/// Text attributes of a metric row.
pub const DIMENSION_COLUMNS: [&str; 8] = [
    ORG_ID,
    GMV_BUCKET,
    VERTICAL,
    SUB_VERTICAL,
    TERRITORY,
    SUB_TERRITORY,
    CHANNEL_GROUPING,
    CHANNEL_PLATFORM,
];

/// Numeric measures of a metric row, always normalised to `Float64`.
pub const MEASURE_COLUMNS: [&str; 14] = [
    SESSIONS,
    NEW_USERS,
    ORDERS,
    NEW_ORDERS,
    ORDERS_UNITS,
    NEW_ORDERS_UNITS,
    NET_REVENUE,
    NEW_NET_REVENUE,
    ORIGINAL_PRICE,
    NEW_ORIGINAL_PRICE,
    ORDERS_DISCOUNT,
    NEW_ORDERS_DISCOUNT,
    MARKETING_SPEND,
    MARKETING_IMPRESSIONS,
];

/// Raw benchmark column names that are shortened on load.
pub const SOURCE_RENAMES: [(&str, &str); 6] = [
    ("orders_product_net_revenue", NET_REVENUE),
    ("new_orders_product_net_revenue", NEW_NET_REVENUE),
    ("orders_product_original_price", ORIGINAL_PRICE),
    ("new_orders_product_original_price", NEW_ORIGINAL_PRICE),
    ("orders_product_gross_discount", ORDERS_DISCOUNT),
    ("new_orders_product_gross_discount", NEW_ORDERS_DISCOUNT),
];

// Output columns produced by the demand aggregation and attributes.
pub const ACQUISITIONS: &str = "acquisitions";
pub const TOP_TERRITORY: &str = "top_territory";
pub const AOV: &str = "aov";

// === Grain ===============================================================

/// Time bucketing used for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Grain {
    #[default]
    Daily,
    Weekly,
}

impl Grain {
    /// Column holding the period key at this grain.
    pub fn period_column(self) -> &'static str {
        match self {
            Grain::Daily => DAY_DATE,
            Grain::Weekly => WEEK_DATE,
        }
    }

    pub fn days_per_period(self) -> i64 {
        match self {
            Grain::Daily => 1,
            Grain::Weekly => 7,
        }
    }
}

impl fmt::Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grain::Daily => "daily",
            Grain::Weekly => "weekly",
        })
    }
}

// === Dates ===============================================================

// NaiveDate::default() is 1970-01-01
/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

pub fn date_from_epoch_days(days: i32) -> NaiveDate {
    NaiveDate::default() + Duration::days(days as i64)
}

/// Monday on or before the given day, as epoch days.
pub fn week_start(days: i32) -> i32 {
    let date = date_from_epoch_days(days);
    days - date.weekday().num_days_from_monday() as i32
}

// === Records =============================================================

/// One raw benchmark metric row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricRecord {
    pub benchmark_organisation_id: String,
    pub organisation_gmv_bucket: String,
    pub vertical_name: String,
    pub vertical_category_name: String,
    pub territory: String,
    pub sub_territory: String,
    pub channel_grouping: String,
    pub channel_platform: String,
    pub day_date: NaiveDate,
    #[serde(default)]
    pub sessions: f64,
    #[serde(default)]
    pub new_users: f64,
    #[serde(default)]
    pub orders: f64,
    #[serde(default)]
    pub new_orders: f64,
    #[serde(default)]
    pub orders_units: f64,
    #[serde(default)]
    pub new_orders_units: f64,
    #[serde(default, alias = "orders_product_net_revenue")]
    pub net_revenue: f64,
    #[serde(default, alias = "new_orders_product_net_revenue")]
    pub new_net_revenue: f64,
    #[serde(default, alias = "orders_product_original_price")]
    pub original_price: f64,
    #[serde(default, alias = "new_orders_product_original_price")]
    pub new_original_price: f64,
    #[serde(default, alias = "orders_product_gross_discount")]
    pub orders_discount: f64,
    #[serde(default, alias = "new_orders_product_gross_discount")]
    pub new_orders_discount: f64,
    #[serde(default)]
    pub marketing_spend: f64,
    #[serde(default)]
    pub marketing_impressions: f64,
}

impl MetricRecord {
    pub fn dimension(&self, column: &str) -> &str {
        match column {
            ORG_ID => &self.benchmark_organisation_id,
            GMV_BUCKET => &self.organisation_gmv_bucket,
            VERTICAL => &self.vertical_name,
            SUB_VERTICAL => &self.vertical_category_name,
            TERRITORY => &self.territory,
            SUB_TERRITORY => &self.sub_territory,
            CHANNEL_GROUPING => &self.channel_grouping,
            CHANNEL_PLATFORM => &self.channel_platform,
            _ => "",
        }
    }

    pub fn measure(&self, column: &str) -> f64 {
        match column {
            SESSIONS => self.sessions,
            NEW_USERS => self.new_users,
            ORDERS => self.orders,
            NEW_ORDERS => self.new_orders,
            ORDERS_UNITS => self.orders_units,
            NEW_ORDERS_UNITS => self.new_orders_units,
            NET_REVENUE => self.net_revenue,
            NEW_NET_REVENUE => self.new_net_revenue,
            ORIGINAL_PRICE => self.original_price,
            NEW_ORIGINAL_PRICE => self.new_original_price,
            ORDERS_DISCOUNT => self.orders_discount,
            NEW_ORDERS_DISCOUNT => self.new_orders_discount,
            MARKETING_SPEND => self.marketing_spend,
            MARKETING_IMPRESSIONS => self.marketing_impressions,
            _ => 0.0,
        }
    }
}
