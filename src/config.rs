use crate::error::PipelineError;
use crate::schema::Grain;
use crate::trim::TrimMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where benchmark metric rows are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Parquet file, glob of parquet files, or newline-delimited JSON file.
    pub path: PathBuf,
    pub format: SourceFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Parquet,
    Json,
}

impl SourceFormat {
    /// Guess the format from the file extension.
    pub fn infer(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("parquet") | Some("pq") => Ok(SourceFormat::Parquet),
            Some("json") | Some("jsonl") | Some("ndjson") => Ok(SourceFormat::Json),
            _ => Err(PipelineError::UnsupportedSource(path.display().to_string()).into()),
        }
    }
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self { path: path.into(), format }
    }

    /// Build a config whose format follows the path's extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = SourceFormat::infer(&path)?;
        Ok(Self { path, format })
    }
}

/// Knobs for one regression-data build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub grain: Grain,
    pub trim_mode: TrimMode,
}
