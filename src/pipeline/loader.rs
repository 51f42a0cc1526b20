//! Dataset I/O for CSV and Parquet files

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;

/// Supported on-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            _ => anyhow::bail!(
                "Unsupported file format: '{}'. Supported formats: csv, parquet",
                extension
            ),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Load a dataset eagerly (CSV or Parquet based on extension)
///
/// `infer_schema_length` only applies to CSV; 0 scans the whole file.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let lf = match FileFormat::from_path(path)? {
        FileFormat::Csv => {
            let schema_length = if infer_schema_length == 0 {
                None
            } else {
                Some(infer_schema_length)
            };
            LazyCsvReader::new(path)
                .with_infer_schema_length(schema_length)
                .finish()
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        }
        FileFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
    };

    lf.collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))
}

/// Write a dataset (CSV or Parquet based on extension)
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    match format {
        FileFormat::Csv => {
            let mut file = file;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        FileFormat::Parquet => {
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
    }

    Ok(())
}

/// `<stem>_train.<ext>` and `<stem>_test.<ext>` for `input`
///
/// Written next to the input unless `output_dir` is given.
pub fn output_paths(input: &Path, output_dir: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    let format = FileFormat::from_path(input)?;
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");

    Ok((
        dir.join(format!("{}_train.{}", stem, format.extension())),
        dir.join(format!("{}_test.{}", stem, format.extension())),
    ))
}

/// Binning report path, `<stem>_binning.json` beside the outputs
pub fn report_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    dir.join(format!("{}_binning.json", stem))
}
