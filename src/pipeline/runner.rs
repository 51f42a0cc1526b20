//! End-to-end preprocessing: split, bin, encode, prune
//!
//! Every artifact is fitted on the train partition and applied unchanged to
//! train and test.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::binning::{BinningProcess, FeatureType};
use super::config::{PipelineConfig, PreprocessingStrategy};
use super::correlation::CorrelationFilter;
use super::dummy::expand_indicators;
use super::error::{PipelineError, Result};
use super::roles::{identify_categoricals, ColumnClassifier};
use super::split::split_train_test;

/// Wall-clock time spent in each stage
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    pub split: Duration,
    pub binning: Duration,
    pub transform: Duration,
    pub pruning: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.split + self.binning + self.transform + self.pruning
    }
}

/// Model-ready partitions and the artifacts that produced them
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub strategy: PreprocessingStrategy,
    /// Partition sizes straight after the split, before any row filtering
    pub train_rows: usize,
    pub test_rows: usize,
    pub train: DataFrame,
    pub test: DataFrame,
    pub binning: BinningProcess,
    /// `None` only when the raw strategy keeps no numeric predictor to prune
    pub filter: Option<CorrelationFilter>,
    pub timings: StageTimings,
}

/// Run the whole pipeline on `df`
pub fn run_pipeline(
    df: &DataFrame,
    config: &PipelineConfig,
    classifier: &dyn ColumnClassifier,
) -> Result<PreparedData> {
    config.validate()?;
    let label = config.target_label_column.as_str();
    let mut timings = StageTimings::default();

    let start = Instant::now();
    let split = split_train_test(df, label, config.seed, config.test_fraction)?;
    timings.split = start.elapsed();
    let (train_rows, test_rows) = (split.train.height(), split.test.height());

    let start = Instant::now();
    let categoricals = identify_categoricals(&split.train, label, classifier);
    let binning = BinningProcess::fit(&split.train, label, &categoricals, &config.binning)?;
    timings.binning = start.elapsed();

    if binning.retained().next().is_none() {
        return Err(PipelineError::DegenerateResult(
            "no predictor passed the selection thresholds".to_string(),
        ));
    }

    let start = Instant::now();
    let (train_enc, test_enc) = match config.strategy {
        PreprocessingStrategy::Woe => (
            binning.transform(&split.train, config.encoding_metric)?,
            binning.transform(&split.test, config.encoding_metric)?,
        ),
        PreprocessingStrategy::Dummy => (
            expand_indicators(&binning, &split.train)?,
            expand_indicators(&binning, &split.test)?,
        ),
        PreprocessingStrategy::Raw => {
            let columns = raw_columns(&binning);
            (
                drop_incomplete_rows(&split.train.select(columns.clone())?, "train")?,
                drop_incomplete_rows(&split.test.select(columns)?, "test")?,
            )
        }
    };
    timings.transform = start.elapsed();

    let start = Instant::now();
    let (train, test, filter) = match config.strategy {
        PreprocessingStrategy::Raw => prune_raw(&binning, &train_enc, &test_enc, config)?,
        PreprocessingStrategy::Woe | PreprocessingStrategy::Dummy => {
            let (train, filter) = CorrelationFilter::fit(&train_enc, label, &config.pruning)?;
            let test = filter.apply(&test_enc)?;
            (train, test, Some(filter))
        }
    };
    timings.pruning = start.elapsed();

    info!(
        strategy = %config.strategy,
        train_rows = train.height(),
        test_rows = test.height(),
        columns = train.width(),
        elapsed_ms = timings.total().as_millis() as u64,
        "pipeline finished"
    );

    Ok(PreparedData {
        strategy: config.strategy,
        train_rows,
        test_rows,
        train,
        test,
        binning,
        filter,
        timings,
    })
}

fn raw_columns(binning: &BinningProcess) -> Vec<PlSmallStr> {
    std::iter::once(binning.label().to_string())
        .chain(binning.retained_names())
        .map(PlSmallStr::from)
        .collect()
}

/// Prune correlated raw numeric predictors
///
/// Categorical predictors have no meaningful Pearson correlation in raw form,
/// so they are kept as they are and left out of the fit.
fn prune_raw(
    binning: &BinningProcess,
    train: &DataFrame,
    test: &DataFrame,
    config: &PipelineConfig,
) -> Result<(DataFrame, DataFrame, Option<CorrelationFilter>)> {
    let label = binning.label();
    let numeric: Vec<PlSmallStr> = std::iter::once(label)
        .chain(
            binning
                .retained()
                .filter(|f| f.feature_type == FeatureType::Numeric)
                .map(|f| f.feature_name.as_str()),
        )
        .map(PlSmallStr::from)
        .collect();
    if numeric.len() < 2 {
        return Ok((train.clone(), test.clone(), None));
    }

    let (_, filter) = CorrelationFilter::fit(&train.select(numeric)?, label, &config.pruning)?;
    let dropped: HashSet<String> = filter.dropped().iter().map(|d| d.name.clone()).collect();
    let keep = |df: &DataFrame| -> Result<DataFrame> {
        let names: Vec<PlSmallStr> = df
            .get_column_names()
            .into_iter()
            .filter(|n| !dropped.contains(n.as_str()))
            .cloned()
            .collect();
        Ok(df.select(names)?)
    };
    Ok((keep(train)?, keep(test)?, Some(filter)))
}

/// Drop every row holding a null, or a non-finite float, in any column
pub fn drop_incomplete_rows(df: &DataFrame, partition: &str) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for col in df.get_columns() {
        if matches!(col.dtype(), DataType::Float32 | DataType::Float64) {
            let float_col = col.cast(&DataType::Float64)?;
            for (k, v) in keep.iter_mut().zip(float_col.f64()?.iter()) {
                *k &= v.is_some_and(f64::is_finite);
            }
        } else {
            let nulls = col.as_materialized_series().is_null();
            for (k, is_null) in keep.iter_mut().zip(nulls.iter()) {
                *k &= !is_null.unwrap_or(true);
            }
        }
    }

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok(df.clone());
    }
    if dropped == df.height() {
        return Err(PipelineError::DegenerateResult(format!(
            "every {} row has a missing value in a retained predictor",
            partition
        )));
    }
    warn!(partition, rows = dropped, "dropped incomplete rows");

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}
