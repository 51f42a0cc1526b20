//! Integration tests for the binning engine and transform applier

use std::collections::BTreeSet;

use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use riskprep::pipeline::{
    split_train_test, BinOptimizer, BinningConfig, BinningProcess, BinningStrategy, EncodingMetric, FeatureType,
    InvalidPredictorPolicy, MonotonicityConstraint, PipelineError,
};

#[path = "common/mod.rs"]
mod common;

use common::*;

fn categoricals() -> BTreeSet<String> {
    ["grade_cd".to_string()].into()
}

fn fit_default(df: &DataFrame) -> BinningProcess {
    BinningProcess::fit(df, LABEL, &categoricals(), &BinningConfig::default()).unwrap()
}

#[test]
fn test_perfect_separator_retained() {
    let process = fit_default(&create_loan_tape(2000, 11));
    let fb = process.feature("separator").unwrap();

    assert!(fb.retained, "separator rejected: {:?}", fb.rejection_reasons);
    assert!(fb.iv > 1.0, "separator IV too low: {}", fb.iv);
    assert!(fb.gini.abs() > 0.95, "separator Gini too low: {}", fb.gini);
}

#[test]
fn test_noise_rejected() {
    let process = fit_default(&create_loan_tape(4000, 12));
    let fb = process.feature("noise").unwrap();

    assert!(!fb.retained, "noise retained with IV {} and Gini {}", fb.iv, fb.gini);
    assert!(!fb.rejection_reasons.is_empty());
    assert!(process.retained_names().iter().all(|n| n != "noise"));
}

#[test]
fn test_noise_rejected_across_seeds_on_small_samples() {
    let label: Vec<i32> = (0..700).map(|i| i % 2).collect();
    let mut retained = Vec::new();

    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise: Vec<f64> = (0..700).map(|_| rng.gen::<f64>()).collect();
        let df = df! {
            LABEL => label.clone(),
            "noise_amt" => noise,
        }
        .unwrap();

        let process = BinningProcess::fit(&df, LABEL, &BTreeSet::new(), &BinningConfig::default()).unwrap();
        let fb = process.feature("noise_amt").unwrap();
        if fb.retained {
            retained.push((seed, fb.iv, fb.gini, fb.bins.len()));
        }
    }

    assert!(retained.is_empty(), "noise retained for (seed, iv, gini, bins): {:?}", retained);
}

#[test]
fn test_significance_merge_can_be_disabled() {
    let mut rng = ChaCha8Rng::seed_from_u64(33);
    let df = df! {
        LABEL => (0..700).map(|i| i % 2).collect::<Vec<i32>>(),
        "noise_amt" => (0..700).map(|_| rng.gen::<f64>()).collect::<Vec<f64>>(),
    }
    .unwrap();

    let strict = BinningProcess::fit(&df, LABEL, &BTreeSet::new(), &BinningConfig::default()).unwrap();
    let loose = BinningConfig {
        max_pvalue: 1.0,
        ..Default::default()
    };
    let loose = BinningProcess::fit(&df, LABEL, &BTreeSet::new(), &loose).unwrap();

    let strict_bins = strict.feature("noise_amt").unwrap().bins.len();
    let loose_bins = loose.feature("noise_amt").unwrap().bins.len();
    assert!(strict_bins < loose_bins, "strict {} vs loose {}", strict_bins, loose_bins);
}

#[test]
fn test_categorical_predictor_binned_by_category() {
    let process = fit_default(&create_loan_tape(2000, 13));
    let fb = process.feature("grade_cd").unwrap();

    assert_eq!(fb.feature_type, FeatureType::Categorical);
    assert!(fb.retained);
    // every grade lands in exactly one group
    let grades: Vec<&String> = fb.categories.iter().flat_map(|c| c.categories.iter()).collect();
    assert_eq!(grades.len(), 5);
    for grade in ["A", "B", "C", "D", "E"] {
        assert!(fb.category_index(Some(grade)).is_some(), "grade {} unmapped", grade);
    }
}

#[test]
fn test_zero_variance_raises_under_error_policy() {
    let df = create_constant_predictor_tape(200);
    let err = BinningProcess::fit(&df, LABEL, &BTreeSet::new(), &BinningConfig::default()).unwrap_err();

    match err {
        PipelineError::DataQuality { column, .. } => assert_eq!(column, "const_amt"),
        other => panic!("expected DataQuality, got {:?}", other),
    }
}

#[test]
fn test_zero_variance_dropped_under_drop_policy() {
    let df = create_constant_predictor_tape(200);
    let config = BinningConfig {
        invalid_predictor_policy: InvalidPredictorPolicy::Drop,
        ..Default::default()
    };
    let process = BinningProcess::fit(&df, LABEL, &BTreeSet::new(), &config).unwrap();

    assert_eq!(process.rejected().len(), 1);
    assert_eq!(process.rejected()[0].name, "const_amt");
    assert!(process.feature("const_amt").is_none());
    assert!(process.is_retained("separator"));

    let out = process.transform(&df, EncodingMetric::Woe).unwrap();
    assert_missing_columns(&out, &["const_amt"]);
}

#[test]
fn test_bin_index_reconstructs_partition() {
    let process = fit_default(&create_loan_tape(2000, 14));
    let fb = process.feature("ltv").unwrap();
    let splits = fb.splits();

    assert_eq!(splits.len() + 1, fb.n_bins());
    assert_eq!(fb.bins[0].lower_bound, f64::NEG_INFINITY);
    assert_eq!(fb.bins[fb.n_bins() - 1].upper_bound, f64::INFINITY);

    for (i, bin) in fb.bins.iter().enumerate() {
        if i + 1 < fb.n_bins() {
            assert_eq!(bin.upper_bound, fb.bins[i + 1].lower_bound, "bins must be contiguous");
        }
        // lower bound is inclusive, upper bound exclusive
        if bin.lower_bound.is_finite() {
            assert_eq!(fb.bin_index(Some(bin.lower_bound)), Some(i));
        }
        if bin.upper_bound.is_finite() {
            assert_eq!(fb.bin_index(Some(bin.upper_bound - 1e-9)), Some(i));
        }
    }

    assert_eq!(fb.bin_index(Some(-1e12)), Some(0));
    assert_eq!(fb.bin_index(Some(1e12)), Some(fb.n_bins() - 1));
}

#[test]
fn test_train_and_test_share_boundaries() {
    let df = create_loan_tape(1500, 15);
    let split = split_train_test(&df, LABEL, 130816, 0.3).unwrap();
    let process = fit_default(&split.train);
    let fb = process.feature("ltv").unwrap();

    let train_enc = process.transform(&split.train, EncodingMetric::Woe).unwrap();
    let test_enc = process.transform(&split.test, EncodingMetric::Woe).unwrap();
    assert_eq!(column_names(&train_enc), column_names(&test_enc));

    // every encoded test value is the WoE of the train-fitted bin holding the raw value
    let raw = split.test.column("ltv").unwrap().f64().unwrap().clone();
    let encoded = test_enc.column("ltv").unwrap().f64().unwrap().clone();
    for (value, woe) in raw.iter().zip(encoded.iter()) {
        let bin = fb.bin_index(value).unwrap();
        assert_eq!(woe, Some(fb.bins[bin].woe));
    }
}

#[test]
fn test_transform_bin_index_metric() {
    let df = create_loan_tape(1000, 16);
    let process = fit_default(&df);
    let out = process.transform(&df, EncodingMetric::BinIndex).unwrap();

    assert_label_first(&out, LABEL);
    assert_eq!(out.height(), df.height());
    let fb = process.feature("separator").unwrap();
    let indices = out.column("separator").unwrap().f64().unwrap();
    assert!(indices.into_no_null_iter().all(|i| i >= 0.0 && (i as usize) < fb.total_bins()));
}

#[test]
fn test_missing_values_get_their_own_bin() {
    let mut rows: Vec<Option<f64>> = Vec::new();
    let mut label: Vec<i32> = Vec::new();
    for i in 0..600 {
        let y = (i % 2) as i32;
        label.push(y);
        rows.push(if i % 5 == 0 { None } else { Some(y as f64 * 40.0 + (i % 23) as f64) });
    }
    let df = df! { LABEL => label, "income" => rows }.unwrap();
    let process = BinningProcess::fit(&df, LABEL, &BTreeSet::new(), &BinningConfig::default()).unwrap();
    let fb = process.feature("income").unwrap();

    let missing = fb.missing_bin.as_ref().expect("missing bin");
    assert_eq!(missing.count, 120.0);
    assert_eq!(fb.bin_index(None), Some(fb.n_bins()));
    assert_eq!(fb.bin_index(Some(f64::NAN)), Some(fb.n_bins()));
}

#[test]
fn test_solver_optimizer_respects_bin_limits() {
    let df = create_loan_tape(1500, 17);
    let config = BinningConfig {
        optimizer: BinOptimizer::Solver,
        strategy: BinningStrategy::Quantile,
        max_bins: 4,
        monotonicity: MonotonicityConstraint::Ascending,
        ..Default::default()
    };
    let process = BinningProcess::fit(&df, LABEL, &categoricals(), &config).unwrap();
    let fb = process.feature("ltv").unwrap();

    assert!(fb.n_bins() >= 2 && fb.n_bins() <= 4, "got {} bins", fb.n_bins());
    for pair in fb.bins.windows(2) {
        assert!(pair[1].woe >= pair[0].woe - 1e-9, "WoE must ascend");
    }
}

#[test]
fn test_fit_rejects_invalid_config() {
    let df = create_loan_tape(200, 18);
    let config = BinningConfig {
        min_bins: 6,
        max_bins: 3,
        ..Default::default()
    };
    assert!(matches!(
        BinningProcess::fit(&df, LABEL, &categoricals(), &config),
        Err(PipelineError::Configuration(_))
    ));
}
