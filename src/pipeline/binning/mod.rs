//! Supervised WoE binning with IV, Gini and quality-score selection
//!
//! Numeric predictors are prebinned (CART or quantile), merged down to the
//! configured bin count and made WoE-monotonic. Categorical predictors are
//! grouped by event rate. Missing values always get a dedicated bin.

mod categorical;
mod merge;
mod numeric;
mod process;

use serde::{Deserialize, Serialize, Serializer};

use super::config::EncodingMetric;
use super::solver::MonotonicityConstraint;
use super::stats::{chi2_pvalue_2x2, gini_from_bins, normalized_hhi};

pub use process::{BinningProcess, RejectedPredictor};

pub(crate) use categorical::fit_categorical;
pub(crate) use numeric::fit_numeric;

/// IV scale of the separation factor in the quality score
const QUALITY_IV_SCALE: f64 = 0.1;

/// Absolute floor on the number of samples in a prebin or category
pub const MIN_BIN_SAMPLES: usize = 5;

/// Binning strategy for pre-bin creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningStrategy {
    /// Equal-frequency binning - bins have approximately equal sample counts
    Quantile,
    /// CART-style decision tree binning - splits maximize information gain
    #[default]
    Cart,
}

impl std::fmt::Display for BinningStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinningStrategy::Quantile => write!(f, "quantile"),
            BinningStrategy::Cart => write!(f, "cart"),
        }
    }
}

impl std::str::FromStr for BinningStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quantile" => Ok(BinningStrategy::Quantile),
            "cart" => Ok(BinningStrategy::Cart),
            _ => Err(format!("Unknown binning strategy: '{}'. Use 'quantile' or 'cart'.", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureType {
    Numeric,
    Categorical,
}

/// Infinite bounds serialize as the strings `"-inf"` / `"inf"`, which JSON
/// would otherwise turn into `null`
fn serialize_bound<S: Serializer>(bound: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if bound.is_infinite() {
        serializer.serialize_str(if *bound > 0.0 { "inf" } else { "-inf" })
    } else {
        serializer.serialize_f64(*bound)
    }
}

/// A numeric bin covering `[lower_bound, upper_bound)`
#[derive(Debug, Clone, Serialize)]
pub struct WoeBin {
    /// Lower bound (inclusive); `-inf` for the first bin
    #[serde(serialize_with = "serialize_bound")]
    pub lower_bound: f64,
    /// Upper bound (exclusive); `+inf` for the last bin
    #[serde(serialize_with = "serialize_bound")]
    pub upper_bound: f64,
    pub events: f64,
    pub non_events: f64,
    pub woe: f64,
    pub iv_contribution: f64,
    pub count: f64,
    pub population_pct: f64,
    pub event_rate: f64,
}

/// A group of categories sharing one WoE
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalWoeBin {
    pub categories: Vec<String>,
    pub events: f64,
    pub non_events: f64,
    pub woe: f64,
    pub iv_contribution: f64,
    pub count: f64,
    pub population_pct: f64,
    pub event_rate: f64,
}

/// Bin for null (and NaN) predictor values
#[derive(Debug, Clone, Serialize)]
pub struct MissingBin {
    pub events: f64,
    pub non_events: f64,
    pub woe: f64,
    pub iv_contribution: f64,
    pub count: f64,
    pub population_pct: f64,
    pub event_rate: f64,
}

/// Fitted binning of a single predictor
///
/// Immutable after fit. Regular bins are indexed `0..n_bins()`; the missing
/// bin, when present, has index `n_bins()`.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureBinning {
    pub feature_name: String,
    pub feature_type: FeatureType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bins: Vec<WoeBin>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoricalWoeBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_bin: Option<MissingBin>,
    pub iv: f64,
    pub gini: f64,
    pub quality_score: f64,
    /// Monotonicity pattern the final WoE sequence satisfies
    pub monotonicity: MonotonicityConstraint,
    pub retained: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejection_reasons: Vec<String>,
}

impl FeatureBinning {
    /// Number of regular (non-missing) bins
    pub fn n_bins(&self) -> usize {
        match self.feature_type {
            FeatureType::Numeric => self.bins.len(),
            FeatureType::Categorical => self.categories.len(),
        }
    }

    /// Number of bins including the missing bin
    pub fn total_bins(&self) -> usize {
        self.n_bins() + usize::from(self.missing_bin.is_some())
    }

    /// Interior split points of a numeric binning, ascending
    pub fn splits(&self) -> Vec<f64> {
        self.bins.iter().skip(1).map(|b| b.lower_bound).collect()
    }

    /// Index of the bin unseen or unmappable values fall into: the bin with
    /// the highest WoE, i.e. the most conservative risk estimate
    pub fn catch_all_index(&self) -> usize {
        let mut best = (0, f64::NEG_INFINITY);
        for (idx, woe) in self.woes().into_iter().enumerate() {
            if woe > best.1 {
                best = (idx, woe);
            }
        }
        best.0
    }

    /// Bin index of a numeric value (`None` and NaN are missing)
    ///
    /// Returns `None` when the value is missing and no missing bin was fitted.
    pub fn bin_index(&self, value: Option<f64>) -> Option<usize> {
        match value {
            Some(v) if !v.is_nan() => {
                let splits = self.splits();
                Some(splits.partition_point(|&s| s <= v))
            }
            _ => self.missing_bin.as_ref().map(|_| self.n_bins()),
        }
    }

    /// Bin index of a category (`None` is missing)
    ///
    /// Returns `None` for unseen categories and for missing values without
    /// a fitted missing bin.
    pub fn category_index(&self, value: Option<&str>) -> Option<usize> {
        match value {
            Some(v) => self
                .categories
                .iter()
                .position(|group| group.categories.iter().any(|c| c == v)),
            None => self.missing_bin.as_ref().map(|_| self.n_bins()),
        }
    }

    /// Encoded output value of a bin
    pub fn encode(&self, index: usize, metric: EncodingMetric) -> f64 {
        match metric {
            EncodingMetric::BinIndex => index as f64,
            EncodingMetric::Woe => self.bin_stats(index).map(|(woe, _)| woe).unwrap_or(0.0),
            EncodingMetric::EventRate => self.bin_stats(index).map(|(_, rate)| rate).unwrap_or(0.0),
        }
    }

    /// Human-readable label of a bin, used for reports and dummy columns
    pub fn bin_label(&self, index: usize) -> String {
        if index == self.n_bins() && self.missing_bin.is_some() {
            return "MISSING".to_string();
        }
        match self.feature_type {
            FeatureType::Numeric => self
                .bins
                .get(index)
                .map(|b| format!("[{}, {})", b.lower_bound, b.upper_bound))
                .unwrap_or_default(),
            FeatureType::Categorical => self
                .categories
                .get(index)
                .map(|c| c.categories.join(","))
                .unwrap_or_default(),
        }
    }

    /// WoE of every bin in index order, missing bin last
    fn woes(&self) -> Vec<f64> {
        (0..self.total_bins())
            .filter_map(|i| self.bin_stats(i).map(|(woe, _)| woe))
            .collect()
    }

    fn bin_stats(&self, index: usize) -> Option<(f64, f64)> {
        let n = self.n_bins();
        if index < n {
            return Some(match self.feature_type {
                FeatureType::Numeric => (self.bins[index].woe, self.bins[index].event_rate),
                FeatureType::Categorical => (self.categories[index].woe, self.categories[index].event_rate),
            });
        }
        if index == n {
            return self.missing_bin.as_ref().map(|m| (m.woe, m.event_rate));
        }
        None
    }
}

/// Quality score in [0, 1]
///
/// Product of a separation factor `1 - exp(-IV / 0.1)`, the mean of
/// `1 - p` over chi-square tests between adjacent regular bins, and
/// `1 - HHI` of the bin populations (missing bin included).
pub(crate) fn quality_score(iv: f64, regular: &[(f64, f64)], missing: Option<(f64, f64)>) -> f64 {
    if regular.len() < 2 {
        return 0.0;
    }

    let separation = 1.0 - (-iv / QUALITY_IV_SCALE).exp();

    let significance = regular
        .windows(2)
        .map(|w| 1.0 - chi2_pvalue_2x2(w[0].0, w[0].1, w[1].0, w[1].1))
        .sum::<f64>()
        / (regular.len() - 1) as f64;

    let populations: Vec<f64> = regular
        .iter()
        .chain(missing.iter())
        .map(|(e, ne)| e + ne)
        .collect();
    let evenness = 1.0 - normalized_hhi(&populations);

    (separation * significance * evenness).clamp(0.0, 1.0)
}

/// Gini of a fitted binning over its own training counts
pub(crate) fn binning_gini(regular: &[(f64, f64, f64)], missing: Option<&MissingBin>) -> f64 {
    let mut scored: Vec<(f64, f64, f64)> = regular.to_vec();
    if let Some(m) = missing {
        scored.push((m.woe, m.events, m.non_events));
    }
    gini_from_bins(&scored)
}

pub(crate) fn missing_bin(events: f64, non_events: f64, total_events: f64, total_non_events: f64) -> Option<MissingBin> {
    let count = events + non_events;
    if count <= 0.0 {
        return None;
    }
    let (woe, iv_contribution) =
        super::stats::calculate_woe_iv(events, non_events, total_events, total_non_events);
    Some(MissingBin {
        events,
        non_events,
        woe,
        iv_contribution,
        count,
        population_pct: count / (total_events + total_non_events) * 100.0,
        event_rate: events / count,
    })
}

/// Result of fitting one predictor
#[derive(Debug, Clone)]
pub(crate) enum FitOutcome {
    Fitted(FeatureBinning),
    /// Zero variance or all missing
    Invalid { column: String, reason: String },
}
