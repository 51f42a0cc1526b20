//! Fit-on-train / apply-everywhere binning process

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::super::config::{BinningConfig, EncodingMetric, InvalidPredictorPolicy};
use super::super::error::{PipelineError, Result};
use super::super::fingerprint::FrameFingerprint;
use super::super::target::{ensure_both_classes, label_values};
use super::{fit_categorical, fit_numeric, FeatureBinning, FeatureType, FitOutcome};
use crate::utils::create_progress_bar;

/// A predictor dropped under `InvalidPredictorPolicy::Drop`
#[derive(Debug, Clone, Serialize)]
pub struct RejectedPredictor {
    pub name: String,
    pub reason: String,
}

/// Fitted binning of every predictor of a training frame
///
/// Built once by [`BinningProcess::fit`] and immutable afterwards; the same
/// instance transforms train and test.
#[derive(Debug, Clone, Serialize)]
pub struct BinningProcess {
    label: String,
    /// Every successfully binned predictor, retained or not, in column order
    features: Vec<FeatureBinning>,
    rejected: Vec<RejectedPredictor>,
    fitted_on: FrameFingerprint,
}

impl BinningProcess {
    /// Fit bins for every predictor of `train`
    ///
    /// Columns in `categoricals` (and string-typed columns) are binned as
    /// categories, everything else as numeric values.
    pub fn fit(
        train: &DataFrame,
        label: &str,
        categoricals: &BTreeSet<String>,
        config: &BinningConfig,
    ) -> Result<Self> {
        config.validate()?;
        let labels = label_values(train, label)?;
        ensure_both_classes(&labels, label)?;

        let predictors: Vec<(String, FeatureType)> = train
            .get_columns()
            .iter()
            .filter(|col| col.name().as_str() != label)
            .map(|col| {
                let name = col.name().to_string();
                let is_text = matches!(col.dtype(), DataType::String | DataType::Categorical(_, _));
                if categoricals.contains(&name) {
                    (name, FeatureType::Categorical)
                } else if is_text {
                    debug!(feature = %name, "string column treated as categorical");
                    (name, FeatureType::Categorical)
                } else {
                    (name, FeatureType::Numeric)
                }
            })
            .collect();

        if predictors.is_empty() {
            return Err(PipelineError::config("dataset has no predictor columns besides the label"));
        }

        let total = predictors.len() as u64;
        let pb = create_progress_bar(total, "   Binning features");
        let progress_counter = AtomicU64::new(0);

        let outcomes: Vec<Result<FitOutcome>> = predictors
            .par_iter()
            .map(|(name, kind)| {
                let result = match kind {
                    FeatureType::Numeric => fit_numeric(train, name, &labels, config),
                    FeatureType::Categorical => fit_categorical(train, name, &labels, config),
                };
                let count = progress_counter.fetch_add(1, Ordering::Relaxed);
                if count % 10 == 0 || count + 1 == total {
                    pb.set_position(count + 1);
                }
                result
            })
            .collect();
        pb.finish_and_clear();

        let mut features = Vec::with_capacity(outcomes.len());
        let mut rejected = Vec::new();
        for outcome in outcomes {
            match outcome? {
                FitOutcome::Fitted(fb) => features.push(fb),
                FitOutcome::Invalid { column, reason } => match config.invalid_predictor_policy {
                    InvalidPredictorPolicy::Error => {
                        return Err(PipelineError::DataQuality { column, reason });
                    }
                    InvalidPredictorPolicy::Drop => {
                        warn!(feature = %column, %reason, "dropping predictor that cannot be binned");
                        rejected.push(RejectedPredictor { name: column, reason });
                    }
                },
            }
        }

        let process = Self {
            label: label.to_string(),
            features,
            rejected,
            fitted_on: FrameFingerprint::of(train, label)?,
        };
        process.log_report();
        Ok(process)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a predictor cleared every selection threshold
    pub fn is_retained(&self, name: &str) -> bool {
        self.feature(name).is_some_and(|f| f.retained)
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureBinning> {
        self.features.iter().find(|f| f.feature_name == name)
    }

    /// All binned predictors, retained or not
    pub fn features(&self) -> &[FeatureBinning] {
        &self.features
    }

    /// Retained predictors in column order
    pub fn retained(&self) -> impl Iterator<Item = &FeatureBinning> {
        self.features.iter().filter(|f| f.retained)
    }

    pub fn retained_names(&self) -> Vec<String> {
        self.retained().map(|f| f.feature_name.clone()).collect()
    }

    /// Predictors dropped because they could not be binned
    pub fn rejected(&self) -> &[RejectedPredictor] {
        &self.rejected
    }

    /// Retained predictors sorted by IV descending
    pub fn report(&self) -> Vec<&FeatureBinning> {
        let mut report: Vec<&FeatureBinning> = self.retained().collect();
        report.sort_by(|a, b| b.iv.total_cmp(&a.iv));
        report
    }

    /// Fail with `LeakageGuard` unless `train` is the frame this process was fitted on
    pub fn ensure_fitted_on(&self, train: &DataFrame) -> Result<()> {
        self.fitted_on.ensure_matches(train, &self.label, "binning")
    }

    /// Encode every retained predictor of `df`
    ///
    /// Output: the label first, then one Float64 column per retained
    /// predictor, rows untouched. Values that fall in no fitted bin (unseen
    /// categories, missing values without a missing bin) take the catch-all
    /// bin.
    pub fn transform(&self, df: &DataFrame, metric: EncodingMetric) -> Result<DataFrame> {
        label_values(df, &self.label)?;

        let mut columns: Vec<Column> = Vec::with_capacity(1 + self.features.len());
        columns.push(df.column(&self.label)?.clone());

        for fb in self.retained() {
            let indices = self.bin_indices(df, fb)?;
            let encoded: Vec<f64> = indices.iter().map(|&i| fb.encode(i, metric)).collect();
            columns.push(Column::new(fb.feature_name.as_str().into(), encoded));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Bin index of every row of `df` for one fitted predictor
    pub fn bin_indices(&self, df: &DataFrame, fb: &FeatureBinning) -> Result<Vec<usize>> {
        let name = fb.feature_name.as_str();
        let col = df.column(name).map_err(|_| {
            PipelineError::config(format!("column '{}' seen during fit is missing from the frame", name))
        })?;

        let catch_all = fb.catch_all_index();
        let mut unmapped = 0usize;
        let indices: Vec<usize> = match fb.feature_type {
            FeatureType::Numeric => {
                let float_col = col.cast(&DataType::Float64)?;
                float_col
                    .f64()?
                    .iter()
                    .map(|v| {
                        fb.bin_index(v).unwrap_or_else(|| {
                            unmapped += 1;
                            catch_all
                        })
                    })
                    .collect()
            }
            FeatureType::Categorical => {
                let string_col = col.cast(&DataType::String)?;
                string_col
                    .str()?
                    .iter()
                    .map(|v| {
                        fb.category_index(v).unwrap_or_else(|| {
                            unmapped += 1;
                            catch_all
                        })
                    })
                    .collect()
            }
        };

        if unmapped > 0 {
            warn!(
                feature = name,
                rows = unmapped,
                bin = %fb.bin_label(catch_all),
                "values outside every fitted bin mapped to the catch-all bin"
            );
        }
        Ok(indices)
    }

    fn log_report(&self) {
        let retained = self.report();
        info!(
            predictors = self.features.len() + self.rejected.len(),
            retained = retained.len(),
            rejected = self.rejected.len(),
            "binning fitted"
        );
        for fb in &retained {
            info!(
                feature = %fb.feature_name,
                iv = fb.iv,
                gini = fb.gini,
                quality = fb.quality_score,
                bins = fb.n_bins(),
                "retained"
            );
        }
        for fb in self.features.iter().filter(|f| !f.retained) {
            debug!(feature = %fb.feature_name, reasons = ?fb.rejection_reasons, "below selection thresholds");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        let n = 400;
        let y: Vec<i32> = (0..n).map(|i| i32::from(i % 2 == 0)).collect();
        let x: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 10.0 + (i % 7) as f64 } else { (i % 7) as f64 }).collect();
        let cat: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "R" } else { "S" }).collect();
        df! {
            "x" => x,
            "default_event_flg" => y,
            "state_cd" => cat,
        }
        .unwrap()
    }

    #[test]
    fn test_fit_and_transform_layout() {
        let df = frame();
        let categoricals: BTreeSet<String> = ["state_cd".to_string()].into();
        let process =
            BinningProcess::fit(&df, "default_event_flg", &categoricals, &BinningConfig::default()).unwrap();

        assert!(process.is_retained("x"));
        assert!(process.is_retained("state_cd"));
        assert!(!process.is_retained("missing_column"));

        let out = process.transform(&df, EncodingMetric::Woe).unwrap();
        let names: Vec<&str> = out.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["default_event_flg", "x", "state_cd"]);
        assert_eq!(out.height(), df.height());
    }

    #[test]
    fn test_unseen_category_takes_catch_all() {
        let df = frame();
        let categoricals: BTreeSet<String> = ["state_cd".to_string()].into();
        let process =
            BinningProcess::fit(&df, "default_event_flg", &categoricals, &BinningConfig::default()).unwrap();

        let test = df! {
            "default_event_flg" => [0i32, 1],
            "x" => [1.0f64, 12.0],
            "state_cd" => ["S", "NEW"],
        }
        .unwrap();
        let out = process.transform(&test, EncodingMetric::Woe).unwrap();
        let woe = out.column("state_cd").unwrap().f64().unwrap().get(1).unwrap();

        let fb = process.feature("state_cd").unwrap();
        assert_eq!(woe, fb.encode(fb.catch_all_index(), EncodingMetric::Woe));
        assert!(woe > 0.0, "catch-all must be the riskiest bin");
    }

    #[test]
    fn test_ensure_fitted_on() {
        let df = frame();
        let process =
            BinningProcess::fit(&df, "default_event_flg", &BTreeSet::new(), &BinningConfig::default()).unwrap();
        assert!(process.ensure_fitted_on(&df).is_ok());

        let other = df.slice(0, 100);
        assert!(matches!(
            process.ensure_fitted_on(&other),
            Err(PipelineError::LeakageGuard(_))
        ));
    }
}
