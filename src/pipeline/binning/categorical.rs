//! Categorical predictor binning
//!
//! Rare categories are pooled, the remaining groups are ordered by WoE and
//! adjacent groups are merged until at most `max_bins` remain. Ordering by
//! WoE first keeps the merged sequence ascending.

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::{debug, warn};

use super::super::config::{BinOptimizer, BinningConfig};
use super::super::error::Result;
use super::super::solver::{solve_optimal_binning, MonotonicityConstraint, SolverConfig};
use super::super::stats::calculate_woe_iv;
use super::merge::{greedy_merge, merge_insignificant, Segment};
use super::{binning_gini, missing_bin, quality_score, CategoricalWoeBin, FeatureBinning, FeatureType, FitOutcome, MIN_BIN_SAMPLES};

/// Fit the binning of one categorical predictor on the training frame
///
/// Numeric-typed columns are read through their string representation.
pub(crate) fn fit_categorical(
    df: &DataFrame,
    name: &str,
    labels: &[i32],
    config: &BinningConfig,
) -> Result<FitOutcome> {
    let col = df.column(name)?;
    let string_col = col.cast(&DataType::String)?;
    let values = string_col.str()?;

    // (events, non_events) per category
    let mut category_stats: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    let mut missing_events = 0.0f64;
    let mut missing_non_events = 0.0f64;

    for (val, &y) in values.iter().zip(labels.iter()) {
        match val {
            Some(cat) => {
                let entry = category_stats.entry(cat.to_string()).or_insert((0.0, 0.0));
                if y == 1 {
                    entry.0 += 1.0;
                } else {
                    entry.1 += 1.0;
                }
            }
            None if y == 1 => missing_events += 1.0,
            None => missing_non_events += 1.0,
        }
    }

    match category_stats.len() {
        0 => {
            return Ok(FitOutcome::Invalid {
                column: name.to_string(),
                reason: "all values are missing".to_string(),
            })
        }
        1 => {
            return Ok(FitOutcome::Invalid {
                column: name.to_string(),
                reason: "zero variance (single category)".to_string(),
            })
        }
        _ => {}
    }

    let total_events = category_stats.values().map(|(e, _)| e).sum::<f64>() + missing_events;
    let total_non_events = category_stats.values().map(|(_, ne)| ne).sum::<f64>() + missing_non_events;

    // Pool rare categories into one group
    let mut groups: Vec<(Vec<String>, f64, f64)> = Vec::new();
    let mut other: (Vec<String>, f64, f64) = (Vec::new(), 0.0, 0.0);
    for (cat, (events, non_events)) in category_stats {
        if ((events + non_events) as usize) < config.min_category_samples {
            other.0.push(cat);
            other.1 += events;
            other.2 += non_events;
        } else {
            groups.push((vec![cat], events, non_events));
        }
    }
    if !other.0.is_empty() {
        debug!(feature = name, pooled = other.0.len(), "pooled rare categories");
        groups.push(other);
    }

    groups.sort_by(|a, b| {
        let woe_a = calculate_woe_iv(a.1, a.2, total_events, total_non_events).0;
        let woe_b = calculate_woe_iv(b.1, b.2, total_events, total_non_events).0;
        woe_a.total_cmp(&woe_b).then_with(|| a.0.cmp(&b.0))
    });

    let prebins: Vec<Segment> = groups
        .iter()
        .enumerate()
        .map(|(i, (_, e, ne))| Segment::single(i, *e, *ne))
        .collect();
    let segments = merge_groups(name, prebins, config, total_events, total_non_events);
    // The order of groups comes from the data, so any two of them may end up adjacent
    let comparisons = groups.len() * groups.len().saturating_sub(1) / 2;
    let segments = merge_insignificant(segments, config.max_pvalue, comparisons);

    let total_samples = total_events + total_non_events;
    let categories: Vec<CategoricalWoeBin> = segments
        .iter()
        .map(|seg| {
            let (woe, iv_contribution) =
                calculate_woe_iv(seg.events, seg.non_events, total_events, total_non_events);
            let count = seg.events + seg.non_events;
            CategoricalWoeBin {
                categories: groups[seg.start..=seg.end]
                    .iter()
                    .flat_map(|(cats, _, _)| cats.iter().cloned())
                    .collect(),
                events: seg.events,
                non_events: seg.non_events,
                woe,
                iv_contribution,
                count,
                population_pct: count / total_samples * 100.0,
                event_rate: if count > 0.0 { seg.events / count } else { 0.0 },
            }
        })
        .collect();

    let missing = missing_bin(missing_events, missing_non_events, total_events, total_non_events);

    let iv = categories.iter().map(|c| c.iv_contribution).sum::<f64>()
        + missing.as_ref().map(|m| m.iv_contribution).unwrap_or(0.0);
    let scored: Vec<(f64, f64, f64)> = categories.iter().map(|c| (c.woe, c.events, c.non_events)).collect();
    let gini = binning_gini(&scored, missing.as_ref());
    let counts: Vec<(f64, f64)> = categories.iter().map(|c| (c.events, c.non_events)).collect();
    let quality = quality_score(iv, &counts, missing.as_ref().map(|m| (m.events, m.non_events)));

    let mut rejection_reasons = config.thresholds.failures(iv, gini, quality);
    if categories.len() < config.min_bins {
        rejection_reasons.push(format!("{} group(s) < min_bins {}", categories.len(), config.min_bins));
    }

    Ok(FitOutcome::Fitted(FeatureBinning {
        feature_name: name.to_string(),
        feature_type: FeatureType::Categorical,
        bins: Vec::new(),
        categories,
        missing_bin: missing,
        iv,
        gini,
        quality_score: quality,
        monotonicity: MonotonicityConstraint::Ascending,
        retained: rejection_reasons.is_empty(),
        rejection_reasons,
    }))
}

fn merge_groups(
    name: &str,
    prebins: Vec<Segment>,
    config: &BinningConfig,
    total_events: f64,
    total_non_events: f64,
) -> Vec<Segment> {
    if config.optimizer == BinOptimizer::Solver && prebins.len() > config.max_bins {
        let counts: Vec<(f64, f64)> = prebins.iter().map(|s| (s.events, s.non_events)).collect();
        // Groups are already WoE-ordered, adjacency merges cannot break monotonicity
        let solver_config = SolverConfig {
            monotonicity: MonotonicityConstraint::None,
            min_bin_samples: MIN_BIN_SAMPLES,
            min_bins: config.min_bins,
        };
        match solve_optimal_binning(&counts, config.max_bins, &solver_config, total_events, total_non_events) {
            Ok(result) => {
                return result
                    .bin_boundaries
                    .iter()
                    .map(|&(start, end)| {
                        prebins[start..=end]
                            .iter()
                            .skip(1)
                            .fold(prebins[start], |acc, s| acc.merged(s))
                    })
                    .collect();
            }
            Err(e) => warn!(feature = name, error = %e, "solver failed, falling back to greedy merge"),
        }
    }
    greedy_merge(prebins, config.max_bins, total_events, total_non_events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(outcome: FitOutcome) -> FeatureBinning {
        match outcome {
            FitOutcome::Fitted(fb) => fb,
            FitOutcome::Invalid { reason, .. } => panic!("unexpected invalid predictor: {}", reason),
        }
    }

    #[test]
    fn test_fit_categorical_orders_by_woe() {
        // "A": 10% events, "B": 50%, "C": 90%
        let mut cats = Vec::new();
        let mut labels = Vec::new();
        for (cat, events) in [("C", 90), ("A", 10), ("B", 50)] {
            for i in 0..100 {
                cats.push(cat);
                labels.push(i32::from(i < events));
            }
        }
        let df = df! { "region_cd" => cats }.unwrap();

        let fb = fitted(fit_categorical(&df, "region_cd", &labels, &BinningConfig::default()).unwrap());

        assert_eq!(fb.feature_type, FeatureType::Categorical);
        let order: Vec<&str> = fb.categories.iter().map(|c| c.categories[0].as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert!(fb.categories.windows(2).all(|w| w[0].woe <= w[1].woe));
        assert!(fb.retained);
        assert_eq!(fb.category_index(Some("B")), Some(1));
        assert_eq!(fb.category_index(Some("Z")), None);
    }

    #[test]
    fn test_rare_categories_are_pooled() {
        let mut cats: Vec<String> = Vec::new();
        let mut labels = Vec::new();
        for i in 0..100 {
            cats.push(if i % 2 == 0 { "big".into() } else { "large".into() });
            labels.push(i32::from(i % 2 == 0));
        }
        for (i, rare) in ["r1", "r2", "r3"].iter().enumerate() {
            cats.push(rare.to_string());
            labels.push(i32::from(i == 0));
        }
        let df = df! { "type_cd" => cats }.unwrap();

        let fb = fitted(fit_categorical(&df, "type_cd", &labels, &BinningConfig::default()).unwrap());

        let pooled = fb
            .categories
            .iter()
            .find(|c| c.categories.contains(&"r1".to_string()))
            .unwrap();
        assert_eq!(pooled.categories, vec!["r1", "r2", "r3"]);
        assert_eq!(pooled.count, 3.0);
    }

    #[test]
    fn test_numeric_categorical_column() {
        let codes: Vec<i64> = (0..200).map(|i| i % 4).collect();
        let labels: Vec<i32> = (0..200).map(|i| i32::from(i % 4 >= 2)).collect();
        let df = df! { "product_code" => codes }.unwrap();

        let fb = fitted(fit_categorical(&df, "product_code", &labels, &BinningConfig::default()).unwrap());
        assert!(fb.category_index(Some("3")).is_some());
    }

    #[test]
    fn test_single_category_is_invalid() {
        let df = df! { "flag" => ["Y", "Y", "Y"] }.unwrap();
        let outcome = fit_categorical(&df, "flag", &[0, 1, 0], &BinningConfig::default()).unwrap();
        assert!(matches!(outcome, FitOutcome::Invalid { .. }));
    }
}
