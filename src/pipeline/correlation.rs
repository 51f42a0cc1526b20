//! Multicollinearity pruning
//!
//! Pearson correlation between every pair of predictors (label excluded),
//! F-score of every predictor against the label. Pairs above the threshold
//! are resolved from the strongest correlation down: the member with the
//! lower F-score is dropped (on a tie, the later column).

use std::collections::HashSet;

use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::config::PruningConfig;
use super::error::{PipelineError, Result};
use super::fingerprint::FrameFingerprint;
use super::missing::prepare_matrix;
use super::stats::f_classif;
use super::target::label_values;

/// Column count from which the faer matrix product beats pairwise Welford
const MATRIX_METHOD_COLUMN_THRESHOLD: usize = 15;

/// A pair of predictors correlated above the threshold, by column index
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Audit record of one pruning decision
#[derive(Debug, Clone, Serialize)]
pub struct DroppedPredictor {
    pub name: String,
    /// Survivor whose correlation caused the drop
    pub kept: String,
    pub correlation: f64,
    pub f_score: f64,
    pub kept_f_score: f64,
}

/// Pearson correlation via single-pass Welford; `None` for a constant input
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let mut count = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (&x, &y) in x.iter().zip(y.iter()) {
        count += 1.0;
        let dx = x - mean_x;
        let dy = y - mean_y;
        mean_x += dx / count;
        mean_y += dy / count;
        var_x += dx * (x - mean_x);
        var_y += dy * (y - mean_y);
        cov_xy += dx * (y - mean_y);
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov_xy / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Full correlation matrix as `Z^T Z` over standardized columns
///
/// Constant columns standardize to zero and therefore correlate with nothing.
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Mat<f64> {
    let n_cols = columns.len();
    let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);

    let standardized: Vec<Vec<f64>> = columns
        .par_iter()
        .map(|col| {
            let n = col.len() as f64;
            let mean = col.iter().sum::<f64>() / n;
            let std = (col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
            if std == 0.0 || !std.is_finite() {
                return vec![0.0; col.len()];
            }
            let scale = 1.0 / (n.sqrt() * std);
            col.iter().map(|x| (x - mean) * scale).collect()
        })
        .collect();

    let mut z = Mat::<f64>::zeros(n_rows, n_cols);
    for (col_idx, col_data) in standardized.iter().enumerate() {
        for (row_idx, &val) in col_data.iter().enumerate() {
            z[(row_idx, col_idx)] = val;
        }
    }

    z.transpose() * &z
}

/// Every pair with |r| above `threshold`, strongest first
///
/// Equal |r| keeps the column order of the pair, so results are stable.
pub fn find_correlated_pairs(names: &[String], columns: &[Vec<f64>], threshold: f64) -> Vec<CorrelatedPair> {
    let n = columns.len();
    if n < 2 {
        return Vec::new();
    }

    let mut indexed: Vec<(usize, usize, f64)> = if n >= MATRIX_METHOD_COLUMN_THRESHOLD {
        let corr = correlation_matrix(columns);
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, corr[(i, j)]))
            .collect()
    } else {
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(i, j)| (i, j, pearson_correlation(&columns[i], &columns[j]).unwrap_or(0.0)))
            .collect()
    };

    indexed.retain(|(_, _, r)| r.is_finite() && r.abs() > threshold);
    indexed.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

    indexed
        .into_iter()
        .map(|(i, j, r)| CorrelatedPair {
            feature1: names[i].clone(),
            feature2: names[j].clone(),
            correlation: r,
        })
        .collect()
}

/// Resolve correlated pairs, strongest first, by dropping the member with
/// the lower F-score; `names` gives column order for ties
pub fn select_features_to_drop(
    pairs: &[CorrelatedPair],
    names: &[String],
    f_scores: &[f64],
) -> Vec<DroppedPredictor> {
    let position = |name: &str| names.iter().position(|n| n == name).unwrap_or(usize::MAX);
    let score = |name: &str| names.iter().position(|n| n == name).map(|i| f_scores[i]).unwrap_or(0.0);

    let mut dropped: Vec<DroppedPredictor> = Vec::new();
    let mut gone: HashSet<&str> = HashSet::new();

    for pair in pairs {
        let (a, b) = (pair.feature1.as_str(), pair.feature2.as_str());
        if gone.contains(a) || gone.contains(b) {
            continue;
        }
        let (fa, fb) = (score(a), score(b));
        let drop_a = fa < fb || (fa == fb && position(a) > position(b));
        let (drop, keep, f_drop, f_keep) = if drop_a { (a, b, fa, fb) } else { (b, a, fb, fa) };

        gone.insert(drop);
        dropped.push(DroppedPredictor {
            name: drop.to_string(),
            kept: keep.to_string(),
            correlation: pair.correlation,
            f_score: f_drop,
            kept_f_score: f_keep,
        });
    }

    dropped
}

/// Retained predictor set, decided on train only
///
/// Applying it is a pure projection onto the label plus `retained`.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationFilter {
    label: String,
    retained: Vec<String>,
    dropped: Vec<DroppedPredictor>,
    f_scores: Vec<(String, f64)>,
    rows_dropped: usize,
    fitted_on: FrameFingerprint,
}

impl CorrelationFilter {
    /// Fit on `train` and return the pruned train frame alongside the filter
    pub fn fit(train: &DataFrame, label: &str, config: &PruningConfig) -> Result<(DataFrame, Self)> {
        config.validate()?;
        let labels = label_values(train, label)?;

        let predictors: Vec<String> = train
            .get_column_names()
            .into_iter()
            .filter(|n| n.as_str() != label)
            .map(|n| n.to_string())
            .collect();
        if predictors.is_empty() {
            return Err(PipelineError::DegenerateResult(
                "no predictors left to prune, only the label column remains".to_string(),
            ));
        }

        let matrix = prepare_matrix(train, &predictors, &labels, config.missing_policy)?;
        if matrix.labels.len() < 2 {
            return Err(PipelineError::DegenerateResult(format!(
                "{} complete row(s) left for correlation",
                matrix.labels.len()
            )));
        }

        let f_scores: Vec<f64> = matrix
            .columns
            .par_iter()
            .map(|col| f_classif(col, &matrix.labels))
            .collect();

        let pairs = find_correlated_pairs(&predictors, &matrix.columns, config.correlation_threshold);
        let dropped = select_features_to_drop(&pairs, &predictors, &f_scores);

        let gone: HashSet<&str> = dropped.iter().map(|d| d.name.as_str()).collect();
        let retained: Vec<String> = predictors
            .iter()
            .filter(|p| !gone.contains(p.as_str()))
            .cloned()
            .collect();
        if retained.is_empty() {
            return Err(PipelineError::DegenerateResult(
                "correlation pruning removed every predictor".to_string(),
            ));
        }

        for d in &dropped {
            info!(
                feature = %d.name,
                kept = %d.kept,
                correlation = d.correlation,
                f_score = d.f_score,
                kept_f_score = d.kept_f_score,
                "pruned correlated predictor"
            );
        }
        if matrix.rows_dropped > 0 {
            warn!(rows = matrix.rows_dropped, "correlation fitted on complete rows only");
        }
        info!(
            predictors = predictors.len(),
            retained = retained.len(),
            pairs = pairs.len(),
            threshold = config.correlation_threshold,
            "correlation pruning fitted"
        );

        let filter = Self {
            label: label.to_string(),
            retained,
            dropped,
            f_scores: predictors.into_iter().zip(f_scores).collect(),
            rows_dropped: matrix.rows_dropped,
            fitted_on: FrameFingerprint::of(train, label)?,
        };
        let pruned = filter.apply(train)?;
        Ok((pruned, filter))
    }

    /// Project `df` onto the label and the retained predictors
    ///
    /// Never recomputes correlations.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        label_values(df, &self.label)?;
        let mut names: Vec<PlSmallStr> = Vec::with_capacity(1 + self.retained.len());
        names.push(self.label.as_str().into());
        for name in &self.retained {
            if df.column(name).is_err() {
                return Err(PipelineError::config(format!(
                    "retained predictor '{}' is missing from the frame",
                    name
                )));
            }
            names.push(name.as_str().into());
        }
        Ok(df.select(names)?)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn retained(&self) -> &[String] {
        &self.retained
    }

    pub fn dropped(&self) -> &[DroppedPredictor] {
        &self.dropped
    }

    pub fn f_score(&self, name: &str) -> Option<f64> {
        self.f_scores.iter().find(|(n, _)| n == name).map(|(_, f)| *f)
    }

    /// Rows left out of the correlation under `MissingPolicy::DropRow`
    pub fn rows_dropped(&self) -> usize {
        self.rows_dropped
    }

    /// Fail with `LeakageGuard` unless `train` is the frame this filter was fitted on
    pub fn ensure_fitted_on(&self, train: &DataFrame) -> Result<()> {
        self.fitted_on.ensure_matches(train, &self.label, "correlation filter")
    }
}
