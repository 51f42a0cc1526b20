//! Seeded train/test partitioning

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::error::{PipelineError, Result};
use super::target::label_values;

/// Disjoint train/test partitions of one dataset, label first in both
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: DataFrame,
    pub test: DataFrame,
    pub seed: u64,
    pub test_fraction: f64,
}

/// Partition `df` into train and test
///
/// Rows are shuffled with a ChaCha8 stream seeded from `seed`, so the split
/// is identical on every platform and every run. Test receives
/// `round(test_fraction * n)` rows.
pub fn split_train_test(df: &DataFrame, label: &str, seed: u64, test_fraction: f64) -> Result<TrainTestSplit> {
    if df.column(label).is_err() {
        return Err(PipelineError::config(format!("Label column '{}' not found", label)));
    }
    let n = df.height();
    if n < 2 {
        return Err(PipelineError::config(format!(
            "dataset has {} row(s), at least 2 are needed to split",
            n
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::config(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    label_values(df, label)?;

    let n_test = (test_fraction * n as f64).round() as usize;
    if n_test == 0 || n_test == n {
        return Err(PipelineError::config(format!(
            "test_fraction {} leaves an empty partition for {} rows",
            test_fraction, n
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_idx = IdxCa::from_vec("idx".into(), indices[..n_test].to_vec());
    let train_idx = IdxCa::from_vec("idx".into(), indices[n_test..].to_vec());

    let ordered = label_first(df, label)?;
    let train = ordered.take(&train_idx)?;
    let test = ordered.take(&test_idx)?;

    info!(seed, train_rows = train.height(), test_rows = test.height(), "split dataset");

    Ok(TrainTestSplit {
        train,
        test,
        seed,
        test_fraction,
    })
}

/// Reorder columns so the label comes first
pub fn label_first(df: &DataFrame, label: &str) -> Result<DataFrame> {
    let mut names: Vec<PlSmallStr> = Vec::with_capacity(df.width());
    names.push(label.into());
    names.extend(
        df.get_column_names()
            .into_iter()
            .filter(|n| n.as_str() != label)
            .cloned(),
    );
    Ok(df.select(names)?)
}
