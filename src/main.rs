use anyhow::Result;
use benchmark_regression::config::{PipelineOptions, SourceConfig, SourceFormat};
use benchmark_regression::folds::{fold_window, in_sample_mask, FoldSpec};
use benchmark_regression::loader::MetricSource;
use benchmark_regression::pipeline::{build_many, stack_tables};
use benchmark_regression::schema::Grain;
use benchmark_regression::storage;
use benchmark_regression::trim::TrimMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "benchmark-regression")]
#[command(about = "Build marketing-mix regression datasets from benchmark metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build regression rows for one or more organisations
    Build {
        /// Benchmark metrics: parquet file, parquet glob, or NDJSON file
        #[arg(
            long,
            env = "BENCHMARK_DATA_PATH",
            default_value = "/root/data/daily_benchmark_metrics.parquet"
        )]
        data_path: PathBuf,

        /// Source format (defaults to the path's extension)
        #[arg(long, value_enum)]
        format: Option<SourceFormat>,

        /// Organisation id; repeat for several organisations
        #[arg(long = "org-id", required = true)]
        org_ids: Vec<String>,

        #[arg(long, value_enum, default_value_t = Grain::Daily)]
        grain: Grain,

        #[arg(long, value_enum, default_value_t = TrimMode::Spend)]
        trim_mode: TrimMode,

        /// Output file (.parquet or .csv)
        #[arg(long)]
        output: String,
    },
    /// Append rolling-window in-sample masks to a regression table
    Folds {
        /// Regression table written by `build` (.parquet)
        #[arg(long)]
        input: String,

        #[arg(long, default_value = "day_date")]
        date_column: String,

        #[arg(long)]
        folds: usize,

        /// Training window length in periods of `grain`
        #[arg(long)]
        training_periods: usize,

        #[arg(long, value_enum, default_value_t = Grain::Daily)]
        grain: Grain,

        /// Output file (.parquet or .csv)
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "benchmark_regression=info".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Build { data_path, format, org_ids, grain, trim_mode, output } => {
            let config = match format {
                Some(format) => SourceConfig::new(data_path, format),
                None => SourceConfig::from_path(data_path)?,
            };
            let source = MetricSource::from_config(&config)?;
            let options = PipelineOptions { grain, trim_mode };
            info!(path = %config.path.display(), organisations = org_ids.len(), %grain, "building regression data");

            let tables = build_many(&source, &org_ids, &options)?;
            let mut df = stack_tables(&tables)?;
            storage::write_table(&mut df, &output)?;
            info!(rows = df.height(), columns = df.width(), %output, "wrote regression data");
        }
        Command::Folds { input, date_column, folds, training_periods, grain, output } => {
            let mut df = storage::read_parquet(&input)?;
            for fold in 1..=folds {
                let spec = FoldSpec::new(fold, folds, training_periods, grain);
                let window = fold_window(&df, &spec, &date_column)?;
                let mask = in_sample_mask(&df, &spec, &date_column)?;
                let in_sample = (&mask).into_iter().filter(|v| *v == Some(true)).count();
                info!(fold, start = %window.start, end = %window.end, in_sample, "fold window");
                df.with_column(mask)?;
            }
            storage::write_table(&mut df, &output)?;
            info!(rows = df.height(), %output, "wrote fold masks");
        }
    }
    Ok(())
}
