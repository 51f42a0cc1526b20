//! Pipeline configuration
//!
//! Every threshold the pipeline uses lives here and is threaded explicitly
//! through each stage. Defaults reproduce the historical thesis setup
//! (seed 130816, 70/30 split, IV ≥ 0.05, Gini ≥ 0.10, quality ≥ 0.01,
//! 2..=10 bins, correlation threshold 0.7).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::binning::BinningStrategy;
use super::error::{PipelineError, Result};
use super::solver::MonotonicityConstraint;

/// Output encoding of a fitted bin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMetric {
    /// Weight of evidence of the bin
    #[default]
    Woe,
    /// Ordinal bin index (missing bin last)
    BinIndex,
    /// Training event rate of the bin
    EventRate,
}

impl std::fmt::Display for EncodingMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingMetric::Woe => write!(f, "woe"),
            EncodingMetric::BinIndex => write!(f, "bin_index"),
            EncodingMetric::EventRate => write!(f, "event_rate"),
        }
    }
}

impl std::str::FromStr for EncodingMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "woe" => Ok(EncodingMetric::Woe),
            "bin_index" | "bins" | "indices" => Ok(EncodingMetric::BinIndex),
            "event_rate" => Ok(EncodingMetric::EventRate),
            _ => Err(format!(
                "Unknown encoding metric: '{}'. Use 'woe', 'bin_index' or 'event_rate'.",
                s
            )),
        }
    }
}

/// How the pruner treats missing or non-finite predictor values before
/// computing correlations and F-scores
///
/// `ZeroFill` reproduces the historical behaviour but biases correlations
/// toward zero-valued rows; prefer `DropRow` or `Error` when missingness is
/// not negligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    #[default]
    ZeroFill,
    DropRow,
    Error,
}

impl std::fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingPolicy::ZeroFill => write!(f, "zero_fill"),
            MissingPolicy::DropRow => write!(f, "drop_row"),
            MissingPolicy::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for MissingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "zero_fill" | "zero" => Ok(MissingPolicy::ZeroFill),
            "drop_row" | "drop" => Ok(MissingPolicy::DropRow),
            "error" => Ok(MissingPolicy::Error),
            _ => Err(format!(
                "Unknown missing policy: '{}'. Use 'zero_fill', 'drop_row' or 'error'.",
                s
            )),
        }
    }
}

/// What the binning engine does with a predictor it cannot bin
/// (zero variance or all values missing)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPredictorPolicy {
    /// Fail the fit with a `DataQuality` error naming the column
    #[default]
    Error,
    /// Drop the predictor, log it and record it in the rejected list
    Drop,
}

impl std::fmt::Display for InvalidPredictorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPredictorPolicy::Error => write!(f, "error"),
            InvalidPredictorPolicy::Drop => write!(f, "drop"),
        }
    }
}

impl std::str::FromStr for InvalidPredictorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(InvalidPredictorPolicy::Error),
            "drop" => Ok(InvalidPredictorPolicy::Drop),
            _ => Err(format!("Unknown invalid-predictor policy: '{}'. Use 'error' or 'drop'.", s)),
        }
    }
}

/// How prebins are merged down to the final bins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOptimizer {
    /// Merge the adjacent pair with the smallest IV loss until `max_bins` remain
    #[default]
    Greedy,
    /// Globally IV-optimal merge via the MIP solver
    Solver,
}

impl std::fmt::Display for BinOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOptimizer::Greedy => write!(f, "greedy"),
            BinOptimizer::Solver => write!(f, "solver"),
        }
    }
}

impl std::str::FromStr for BinOptimizer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(BinOptimizer::Greedy),
            "solver" | "mip" => Ok(BinOptimizer::Solver),
            _ => Err(format!("Unknown bin optimizer: '{}'. Use 'greedy' or 'solver'.", s)),
        }
    }
}

/// Preprocessing variant feeding the downstream model families
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStrategy {
    /// Binning, encoded with the configured metric, then pruning
    #[default]
    Woe,
    /// Binning, one indicator column per fitted bin, then pruning
    Dummy,
    /// IV shortlist on raw values, incomplete rows removed, no pruning
    Raw,
}

impl std::fmt::Display for PreprocessingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingStrategy::Woe => write!(f, "woe"),
            PreprocessingStrategy::Dummy => write!(f, "dummy"),
            PreprocessingStrategy::Raw => write!(f, "raw"),
        }
    }
}

impl std::str::FromStr for PreprocessingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "woe" => Ok(PreprocessingStrategy::Woe),
            "dummy" | "dummies" => Ok(PreprocessingStrategy::Dummy),
            "raw" => Ok(PreprocessingStrategy::Raw),
            _ => Err(format!(
                "Unknown preprocessing strategy: '{}'. Use 'woe', 'dummy' or 'raw'.",
                s
            )),
        }
    }
}

/// Minimum scores a predictor must reach on every metric to be retained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionThresholds {
    pub iv_min: f64,
    pub gini_min: f64,
    pub quality_min: f64,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            iv_min: 0.05,
            gini_min: 0.10,
            quality_min: 0.01,
        }
    }
}

impl SelectionThresholds {
    /// Names of the metrics that fall short of their threshold
    pub fn failures(&self, iv: f64, gini: f64, quality: f64) -> Vec<String> {
        let mut failed = Vec::new();
        if !(iv >= self.iv_min) {
            failed.push(format!("iv {:.4} < {}", iv, self.iv_min));
        }
        if !(gini.abs() >= self.gini_min) {
            failed.push(format!("gini {:.4} < {}", gini.abs(), self.gini_min));
        }
        if !(quality >= self.quality_min) {
            failed.push(format!("quality {:.4} < {}", quality, self.quality_min));
        }
        failed
    }
}

/// Binning engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    pub thresholds: SelectionThresholds,
    pub min_bins: usize,
    pub max_bins: usize,
    /// Upper bound on prebins created before merging
    pub prebins: usize,
    pub strategy: BinningStrategy,
    /// Minimum CART prebin size as a fraction of non-missing rows
    pub min_prebin_size: f64,
    /// Categories with fewer rows are pooled into one group
    pub min_category_samples: usize,
    /// Neighbouring bins are merged while their Bonferroni-adjusted
    /// chi-square p-value exceeds this level (1.0 disables the merge)
    pub max_pvalue: f64,
    pub monotonicity: MonotonicityConstraint,
    pub optimizer: BinOptimizer,
    pub invalid_predictor_policy: InvalidPredictorPolicy,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            thresholds: SelectionThresholds::default(),
            min_bins: 2,
            max_bins: 10,
            prebins: 20,
            strategy: BinningStrategy::Cart,
            min_prebin_size: 0.05,
            min_category_samples: 5,
            max_pvalue: 0.05,
            monotonicity: MonotonicityConstraint::Auto,
            optimizer: BinOptimizer::Greedy,
            invalid_predictor_policy: InvalidPredictorPolicy::Error,
        }
    }
}

impl BinningConfig {
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        for (name, value) in [("iv_min", t.iv_min), ("gini_min", t.gini_min), ("quality_min", t.quality_min)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::config(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if t.gini_min > 1.0 || t.quality_min > 1.0 {
            return Err(PipelineError::config("gini_min and quality_min must not exceed 1.0"));
        }
        if self.min_bins < 2 {
            return Err(PipelineError::config(format!("min_bins must be at least 2, got {}", self.min_bins)));
        }
        if self.max_bins < self.min_bins {
            return Err(PipelineError::config(format!(
                "max_bins ({}) must be >= min_bins ({})",
                self.max_bins, self.min_bins
            )));
        }
        if self.prebins < self.max_bins {
            return Err(PipelineError::config(format!(
                "prebins ({}) must be >= max_bins ({})",
                self.prebins, self.max_bins
            )));
        }
        if !(0.0..0.5).contains(&self.min_prebin_size) {
            return Err(PipelineError::config(format!(
                "min_prebin_size must be in [0, 0.5), got {}",
                self.min_prebin_size
            )));
        }
        if !(self.max_pvalue > 0.0 && self.max_pvalue <= 1.0) {
            return Err(PipelineError::config(format!(
                "max_pvalue must be in (0, 1], got {}",
                self.max_pvalue
            )));
        }
        Ok(())
    }
}

/// Multicollinearity pruner settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruningConfig {
    pub correlation_threshold: f64,
    pub missing_policy: MissingPolicy,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.7,
            missing_policy: MissingPolicy::ZeroFill,
        }
    }
}

impl PruningConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.correlation_threshold > 0.0 && self.correlation_threshold <= 1.0) {
            return Err(PipelineError::config(format!(
                "correlation_threshold must be in (0, 1], got {}",
                self.correlation_threshold
            )));
        }
        Ok(())
    }
}

/// Complete configuration surface of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_label_column: String,
    pub seed: u64,
    pub test_fraction: f64,
    pub strategy: PreprocessingStrategy,
    pub encoding_metric: EncodingMetric,
    pub binning: BinningConfig,
    pub pruning: PruningConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_label_column: "default_event_flg".to_string(),
            seed: 130816,
            test_fraction: 0.3,
            strategy: PreprocessingStrategy::Woe,
            encoding_metric: EncodingMetric::Woe,
            binning: BinningConfig::default(),
            pruning: PruningConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration for the given label column
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target_label_column: target.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Fail fast on any invalid setting, before anything is fitted
    pub fn validate(&self) -> Result<()> {
        if self.target_label_column.trim().is_empty() {
            return Err(PipelineError::config("target_label_column must not be empty"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        self.binning.validate()?;
        self.pruning.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_surface() {
        let config = PipelineConfig::default();
        assert_eq!(config.seed, 130816);
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.binning.thresholds.iv_min, 0.05);
        assert_eq!(config.binning.thresholds.gini_min, 0.10);
        assert_eq!(config.binning.thresholds.quality_min, 0.01);
        assert_eq!(config.binning.min_bins, 2);
        assert_eq!(config.binning.max_bins, 10);
        assert_eq!(config.binning.max_pvalue, 0.05);
        assert_eq!(config.pruning.correlation_threshold, 0.7);
        assert_eq!(config.pruning.missing_policy, MissingPolicy::ZeroFill);
        assert_eq!(config.encoding_metric, EncodingMetric::Woe);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_test_fraction() {
        let mut config = PipelineConfig::default();
        config.test_fraction = 1.0;
        assert!(matches!(config.validate(), Err(PipelineError::Configuration(_))));

        config.test_fraction = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_bin_range() {
        let mut config = PipelineConfig::default();
        config.binning.min_bins = 1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.binning.max_bins = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut config = PipelineConfig::default();
        config.binning.thresholds.iv_min = -0.1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.pruning.correlation_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.binning.thresholds.gini_min = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.binning.max_pvalue = 0.0;
        assert!(config.validate().is_err());
        config.binning.max_pvalue = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_failures() {
        let thresholds = SelectionThresholds::default();
        assert!(thresholds.failures(0.5, 0.6, 0.4).is_empty());

        let failed = thresholds.failures(0.01, 0.6, 0.4);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].starts_with("iv"));

        assert_eq!(thresholds.failures(0.0, 0.0, 0.0).len(), 3);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("woe".parse::<EncodingMetric>().unwrap(), EncodingMetric::Woe);
        assert_eq!("bins".parse::<EncodingMetric>().unwrap(), EncodingMetric::BinIndex);
        assert_eq!("drop-row".parse::<MissingPolicy>().unwrap(), MissingPolicy::DropRow);
        assert_eq!("DUMMY".parse::<PreprocessingStrategy>().unwrap(), PreprocessingStrategy::Dummy);
        assert_eq!("mip".parse::<BinOptimizer>().unwrap(), BinOptimizer::Solver);
        assert_eq!("drop".parse::<InvalidPredictorPolicy>().unwrap(), InvalidPredictorPolicy::Drop);
        assert!("nonsense".parse::<EncodingMetric>().is_err());
    }

    #[test]
    fn test_json_round_trip_with_partial_fields() {
        let json = r#"{ "target_label_column": "DefaultEvent", "pruning": { "missing_policy": "drop_row" } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.target_label_column, "DefaultEvent");
        assert_eq!(config.pruning.missing_policy, MissingPolicy::DropRow);
        assert_eq!(config.pruning.correlation_threshold, 0.7);
        assert_eq!(config.seed, 130816);
    }
}
