//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

pub const LABEL: &str = "default_event_flg";

/// Synthetic loan tape with known predictor characteristics
///
/// - `default_event_flg`: exactly 50/50 (odd rows default)
/// - `loan_id`: 0..n, to trace rows through the split
/// - `separator`: perfect separator, [0, 50) for non-defaults, [50, 100) for defaults
/// - `noise`: uniform random, unrelated to the label
/// - `ltv`: informative but overlapping between classes
/// - `ltv_scaled`: `ltv` times 1.01 plus small noise (correlation > 0.95)
/// - `grade_cd`: categorical, grades A-E with rising default rate
pub fn create_loan_tape(rows: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let label: Vec<i32> = (0..rows).map(|i| (i % 2) as i32).collect();
    let loan_id: Vec<i64> = (0..rows as i64).collect();

    let separator: Vec<f64> = label
        .iter()
        .map(|&y| if y == 1 { rng.gen_range(50.0..100.0) } else { rng.gen_range(0.0..50.0) })
        .collect();
    let noise: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>()).collect();
    let ltv: Vec<f64> = label
        .iter()
        .map(|&y| if y == 1 { rng.gen_range(60.0..110.0) } else { rng.gen_range(40.0..90.0) })
        .collect();
    let ltv_scaled: Vec<f64> = ltv.iter().map(|v| v * 1.01 + rng.gen_range(-0.5..0.5)).collect();
    let grade_cd: Vec<&str> = label
        .iter()
        .map(|&y| {
            let shift = if y == 1 { 2 } else { 0 };
            ["A", "B", "C", "D", "E"][(rng.gen_range(0..3) + shift).min(4)]
        })
        .collect();

    df! {
        "loan_id" => loan_id,
        "separator" => separator,
        "noise" => noise,
        "ltv" => ltv,
        "ltv_scaled" => ltv_scaled,
        "grade_cd" => grade_cd,
        LABEL => label,
    }
    .unwrap()
}

/// Label plus one perfect separator and one constant predictor
pub fn create_constant_predictor_tape(rows: usize) -> DataFrame {
    let label: Vec<i32> = (0..rows).map(|i| (i % 2) as i32).collect();
    let separator: Vec<f64> = (0..rows).map(|i| (i % 2) as f64 * 100.0 + (i % 17) as f64).collect();
    df! {
        LABEL => label,
        "separator" => separator,
        "const_amt" => vec![7.5f64; rows],
    }
    .unwrap()
}

/// Create a DataFrame with known correlation patterns
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "target" => [0i32, 1, 0, 1, 0, 1, 0, 1, 0, 1],
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0], // b = 2a
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], // c = 11 - a
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0], // unrelated
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("loans.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("loans.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols = column_names(df);
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols = column_names(df);
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// Assert the label is the first column
pub fn assert_label_first(df: &DataFrame, label: &str) {
    assert_eq!(df.get_column_names()[0].as_str(), label, "label must be the first column");
}
