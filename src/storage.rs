// Persist regression tables as Parquet or CSV, and read frames back for
// fold generation. The extension picks the format.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use anyhow::{bail, Result, Context};

/// Save a DataFrame to a Parquet file
pub fn write_parquet(df: &mut DataFrame, path: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {path}"))?;

    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .finish(df)
        .context("Failed to write Parquet data")?;

    Ok(())
}

/// Load a DataFrame from a Parquet file
pub fn read_parquet(path: &str) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Parquet file: {path}"))?;

    let df = ParquetReader::new(file)
        .finish()
        .context("Failed to read Parquet data")?;

    Ok(df)
}

/// Save a DataFrame to a CSV file with a header row
pub fn write_csv(df: &mut DataFrame, path: &str) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {path}"))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .context("Failed to write CSV data")?;

    Ok(())
}

/// Write `df` in the format named by the path's extension.
pub fn write_table(df: &mut DataFrame, path: &str) -> Result<()> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => write_parquet(df, path),
        Some("csv") => write_csv(df, path),
        _ => bail!("Unsupported output format: {path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parquet_keeps_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.parquet");
        let path = path.to_str().unwrap();
        let mut df = df!("benchmark_organisation_id" => ["a", "a"], "meta_spend" => [1.0, 0.0]).unwrap();
        write_table(&mut df, path).unwrap();
        let read = read_parquet(path).unwrap();
        assert!(read.equals(&df));
    }

    #[test]
    fn test_csv_and_unknown_extension() {
        let dir = tempdir().unwrap();
        let mut df = df!("x" => [1.0]).unwrap();
        let csv = dir.path().join("out.csv");
        write_table(&mut df, csv.to_str().unwrap()).unwrap();
        assert!(std::fs::read_to_string(&csv).unwrap().starts_with("x"));
        let xlsx = dir.path().join("out.xlsx");
        assert!(write_table(&mut df, xlsx.to_str().unwrap()).is_err());
    }
}
