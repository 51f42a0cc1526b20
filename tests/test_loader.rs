//! Integration tests for dataset I/O

use std::io::Write;

use polars::prelude::*;
use riskprep::pipeline::{load_dataset, output_paths, save_dataset};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_load_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "default_event_flg,ltv,grade_cd").unwrap();
    writeln!(file, "0,80.5,A").unwrap();
    writeln!(file, "1,95.0,C").unwrap();
    drop(file);

    let df = load_dataset(&csv_path, 100).unwrap();

    assert_shape(&df, 2, 3);
    assert_eq!(df.column("ltv").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("grade_cd").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_load_parquet_file() {
    let mut df = create_loan_tape(50, 1);
    let (_temp_dir, path) = create_temp_parquet(&mut df);

    let loaded = load_dataset(&path, 100).unwrap();
    assert!(loaded.equals(&df));
}

#[test]
fn test_load_rejects_unknown_format() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.xlsx");
    std::fs::write(&path, b"not a dataset").unwrap();

    let err = load_dataset(&path, 100).unwrap_err();
    assert!(err.to_string().contains("Unsupported file format"));
}

#[test]
fn test_save_and_reload_both_formats() {
    let mut df = create_loan_tape(40, 2);
    let (temp_dir, input) = create_temp_csv(&mut df);

    let (train_path, _) = output_paths(&input, None).unwrap();
    assert_eq!(train_path, temp_dir.path().join("loans_train.csv"));
    save_dataset(&mut df, &train_path).unwrap();
    let reloaded = load_dataset(&train_path, 0).unwrap();
    assert_shape(&reloaded, 40, df.width());

    let parquet_path = temp_dir.path().join("loans_train.parquet");
    save_dataset(&mut df, &parquet_path).unwrap();
    assert!(load_dataset(&parquet_path, 0).unwrap().equals(&df));
}
