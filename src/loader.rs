use crate::config::{SourceConfig, SourceFormat};
use crate::schema::*;
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Load all metric records from a newline-delimited JSON file
pub fn load_records_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<MetricRecord>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open file: {}", path.as_ref().display()))?;
    let reader = BufReader::new(file);

    let records: Vec<MetricRecord> = serde_json::Deserializer::from_reader(reader)
        .into_iter::<MetricRecord>()
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to deserialize JSON in file: {}", path.as_ref().display()))?;

    Ok(records)
}

/// Lay typed records out in the normalised metric frame layout.
pub fn records_to_dataframe(records: &[MetricRecord]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = DIMENSION_COLUMNS
        .iter()
        .map(|&name| {
            let values: Vec<&str> = records.iter().map(|r| r.dimension(name)).collect();
            Column::new(name.into(), values)
        })
        .collect();

    let days: Vec<i32> = records.iter().map(|r| epoch_days(r.day_date)).collect();
    columns.push(Series::new(DAY_DATE.into(), days).cast(&DataType::Date)?.into());

    for &name in MEASURE_COLUMNS.iter() {
        let values: Vec<f64> = records.iter().map(|r| r.measure(name)).collect();
        columns.push(Column::new(name.into(), values));
    }

    let mut df = DataFrame::new(columns)?;
    with_week_column(&mut df)?;
    Ok(df)
}

/// Rows belonging to one organisation.
pub fn filter_organisation(metrics: LazyFrame, org_id: &str) -> LazyFrame {
    metrics.filter(col(ORG_ID).eq(lit(org_id)))
}

/// Rename raw benchmark columns, cast measures to `Float64` and derive `week_date`.
///
/// Rows without a `day_date` are dropped: they belong to no period, and the
/// final null fill leaves date columns untouched.
pub fn normalise_metrics(raw: DataFrame) -> Result<DataFrame> {
    let has = |name: &str| raw.get_column_index(name).is_some();

    let mut exprs: Vec<Expr> = DIMENSION_COLUMNS
        .iter()
        .map(|&name| col(name).cast(DataType::String))
        .collect();
    exprs.push(col(DAY_DATE).cast(DataType::Date));

    for &name in MEASURE_COLUMNS.iter() {
        let source = SOURCE_RENAMES
            .iter()
            .find(|(raw_name, short)| *short == name && !has(name) && has(*raw_name))
            .map(|(raw_name, _)| *raw_name)
            .unwrap_or(name);
        exprs.push(col(source).cast(DataType::Float64).alias(name));
    }

    let mut df = raw
        .lazy()
        .select(exprs)
        .filter(col(DAY_DATE).is_not_null())
        .collect()
        .context("Metric source is missing benchmark columns")?;
    with_week_column(&mut df)?;
    Ok(df)
}

/// Append `week_date`, the Monday starting each row's week.
pub fn with_week_column(df: &mut DataFrame) -> Result<()> {
    let weeks: Vec<Option<i32>> = df
        .column(DAY_DATE)?
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .map(|day| day.map(week_start))
        .collect();
    let week = Series::new(WEEK_DATE.into(), weeks).cast(&DataType::Date)?;
    df.with_column(week)?;
    Ok(())
}

/// A source of benchmark metric rows addressable by organisation id.
///
/// Parquet is scanned lazily per organisation. NDJSON is parsed once into an
/// in-memory frame.
#[derive(Debug, Clone)]
pub enum MetricSource {
    Parquet(String),
    Frame(DataFrame),
}

impl MetricSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        match config.format {
            SourceFormat::Parquet => Ok(MetricSource::Parquet(config.path.to_string_lossy().into_owned())),
            SourceFormat::Json => {
                let records = load_records_from_file(&config.path)?;
                debug!(path = %config.path.display(), records = records.len(), "parsed NDJSON source");
                MetricSource::from_records(&records)
            }
        }
    }

    pub fn from_records(records: &[MetricRecord]) -> Result<Self> {
        Ok(MetricSource::Frame(records_to_dataframe(records)?))
    }

    /// Normalised metric rows for one organisation; empty when the id is unknown.
    pub fn load_organisation(&self, org_id: &str) -> Result<DataFrame> {
        let df = match self {
            MetricSource::Parquet(path) => {
                let raw = LazyFrame::scan_parquet(path.as_str(), ScanArgsParquet::default())
                    .with_context(|| format!("Failed to scan parquet source: {path}"))?;
                let raw = filter_organisation(raw, org_id)
                    .collect()
                    .with_context(|| format!("Failed to read organisation {org_id} from {path}"))?;
                normalise_metrics(raw)?
            }
            MetricSource::Frame(df) => filter_organisation(df.clone().lazy(), org_id).collect()?,
        };
        debug!(org_id, rows = df.height(), "loaded organisation metrics");
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::tempdir;

    fn record(org: &str, day: u32) -> MetricRecord {
        MetricRecord {
            benchmark_organisation_id: org.into(),
            channel_platform: "google".into(),
            channel_grouping: "Display".into(),
            day_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            sessions: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_records_to_dataframe() {
        let df = records_to_dataframe(&[record("a", 15), record("b", 20)]).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column(DAY_DATE).unwrap().dtype(), &DataType::Date);
        let weeks: Vec<Option<i32>> = df
            .column(WEEK_DATE)
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        let monday = epoch_days(NaiveDate::from_ymd_opt(2024, 5, 13).unwrap());
        assert_eq!(weeks, vec![Some(monday), Some(monday + 7)]);
    }

    #[test]
    fn test_filter_unknown_organisation_is_empty() {
        let source = MetricSource::from_records(&[record("a", 15)]).unwrap();
        assert_eq!(source.load_organisation("a").unwrap().height(), 1);
        assert_eq!(source.load_organisation("zzz").unwrap().height(), 0);
    }

    #[test]
    fn test_load_json_source() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("metrics.jsonl");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "{{\"benchmark_organisation_id\":\"o1\",\"organisation_gmv_bucket\":\"1m-5m\",\"vertical_name\":\"Fashion\",\"vertical_category_name\":\"Shoes\",\"territory\":\"EU\",\"sub_territory\":\"DE\",\"channel_grouping\":\"Direct\",\"channel_platform\":\"\",\"day_date\":\"2024-05-15\",\"sessions\":3,\"orders_product_net_revenue\":12.5}}"
        )
        .unwrap();
        drop(file);
        let records = load_records_from_file(&file_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].net_revenue, 12.5);

        let config = SourceConfig::from_path(&file_path).unwrap();
        let source = MetricSource::from_config(&config).unwrap();
        assert!(matches!(source, MetricSource::Frame(_)));

        // the file is not read again once parsed
        std::fs::remove_file(&file_path).unwrap();
        let df = source.load_organisation("o1").unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column(NET_REVENUE).unwrap().f64().unwrap().get(0), Some(12.5));
        assert_eq!(source.load_organisation("o2").unwrap().height(), 0);
    }

    #[test]
    fn test_normalise_renames_raw_columns() {
        let raw = df!(
            ORG_ID => ["o1"],
            GMV_BUCKET => ["small"],
            VERTICAL => ["Home"],
            SUB_VERTICAL => ["Garden"],
            TERRITORY => ["EU"],
            SUB_TERRITORY => ["FR"],
            CHANNEL_GROUPING => ["Direct"],
            CHANNEL_PLATFORM => [""],
            DAY_DATE => [19858i32],
            SESSIONS => [4i64],
            NEW_USERS => [1i64],
            ORDERS => [2i64],
            NEW_ORDERS => [1i64],
            ORDERS_UNITS => [3i64],
            NEW_ORDERS_UNITS => [1i64],
            "orders_product_net_revenue" => [40.0],
            "new_orders_product_net_revenue" => [20.0],
            "orders_product_original_price" => [50.0],
            "new_orders_product_original_price" => [25.0],
            "orders_product_gross_discount" => [10.0],
            "new_orders_product_gross_discount" => [5.0],
            MARKETING_SPEND => [0.0],
            MARKETING_IMPRESSIONS => [0i64]
        )
        .unwrap();
        let df = normalise_metrics(raw).unwrap();
        assert_eq!(df.column(NET_REVENUE).unwrap().f64().unwrap().get(0), Some(40.0));
        assert_eq!(df.column(ORDERS).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(DAY_DATE).unwrap().dtype(), &DataType::Date);
        assert!(df.column(WEEK_DATE).is_ok());
    }

    #[test]
    fn test_normalise_drops_rows_without_day() {
        let raw = df!(
            ORG_ID => ["o1", "o1"],
            GMV_BUCKET => ["small", "small"],
            VERTICAL => ["Home", "Home"],
            SUB_VERTICAL => ["Garden", "Garden"],
            TERRITORY => ["EU", "EU"],
            SUB_TERRITORY => ["FR", "FR"],
            CHANNEL_GROUPING => ["Direct", "Direct"],
            CHANNEL_PLATFORM => ["", ""],
            DAY_DATE => [Some(19858i32), None],
            SESSIONS => [4.0, 9.0],
            NEW_USERS => [1.0, 1.0],
            ORDERS => [2.0, 2.0],
            NEW_ORDERS => [1.0, 1.0],
            ORDERS_UNITS => [3.0, 3.0],
            NEW_ORDERS_UNITS => [1.0, 1.0],
            NET_REVENUE => [40.0, 40.0],
            NEW_NET_REVENUE => [20.0, 20.0],
            ORIGINAL_PRICE => [50.0, 50.0],
            NEW_ORIGINAL_PRICE => [25.0, 25.0],
            ORDERS_DISCOUNT => [10.0, 10.0],
            NEW_ORDERS_DISCOUNT => [5.0, 5.0],
            MARKETING_SPEND => [0.0, 0.0],
            MARKETING_IMPRESSIONS => [0.0, 0.0]
        )
        .unwrap();
        let df = normalise_metrics(raw).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column(SESSIONS).unwrap().f64().unwrap().get(0), Some(4.0));
        assert_eq!(df.column(DAY_DATE).unwrap().null_count(), 0);
        assert_eq!(df.column(WEEK_DATE).unwrap().null_count(), 0);
    }
}
