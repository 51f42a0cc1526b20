//! Numeric predictor binning
//!
//! 1. Sort non-missing values, route null/NaN to the missing bin
//! 2. Prebin (CART splits or tie-aware quantiles)
//! 3. Merge to at most `max_bins` (greedy IV loss or MIP solver)
//! 4. Merge neighbours until the WoE sequence is monotonic

use polars::prelude::*;
use tracing::warn;

use super::super::config::{BinOptimizer, BinningConfig};
use super::super::error::Result;
use super::super::solver::{solve_optimal_binning, SolverConfig};
use super::super::stats::{calculate_woe_iv, gini_impurity};
use super::merge::{enforce_monotonicity, greedy_merge, merge_insignificant, Segment};
use super::{
    binning_gini, missing_bin, quality_score, BinningStrategy, FeatureBinning, FeatureType, FitOutcome, WoeBin,
    MIN_BIN_SAMPLES,
};

/// Find the best split point that maximizes information gain (Gini reduction)
///
/// `sorted_pairs` holds (value, label) sorted by value. Returns the index
/// where the right side starts, never inside a run of tied values.
fn find_best_split(sorted_pairs: &[(f64, i32)], min_samples: usize) -> Option<(usize, f64)> {
    let n = sorted_pairs.len();
    if n < 2 * min_samples {
        return None;
    }

    let total_events = sorted_pairs.iter().filter(|(_, t)| *t == 1).count() as f64;
    let total_non_events = n as f64 - total_events;
    let parent_gini = gini_impurity(total_events, total_non_events);

    let mut best_gain = 0.0;
    let mut best_split_idx = None;
    let mut left_events = 0.0f64;

    for i in 0..n - 1 {
        if sorted_pairs[i].1 == 1 {
            left_events += 1.0;
        }

        let left_count = i + 1;
        let right_count = n - left_count;
        if left_count < min_samples || right_count < min_samples {
            continue;
        }
        if sorted_pairs[i].0 == sorted_pairs[i + 1].0 {
            continue;
        }

        let left_non_events = left_count as f64 - left_events;
        let right_events = total_events - left_events;
        let right_non_events = total_non_events - left_non_events;

        let weighted_child_gini = (left_count as f64 * gini_impurity(left_events, left_non_events)
            + right_count as f64 * gini_impurity(right_events, right_non_events))
            / n as f64;
        let gain = parent_gini - weighted_child_gini;

        if gain > best_gain {
            best_gain = gain;
            best_split_idx = Some(i + 1);
        }
    }

    best_split_idx.map(|idx| (idx, best_gain))
}

/// Recursively collect CART split indices, sharing the split budget between halves
fn find_cart_splits_recursive(
    sorted_pairs: &[(f64, i32)],
    offset: usize,
    max_splits: usize,
    min_samples: usize,
    split_indices: &mut Vec<usize>,
) {
    if max_splits == 0 || sorted_pairs.len() < 2 * min_samples {
        return;
    }

    if let Some((local_split_idx, _gain)) = find_best_split(sorted_pairs, min_samples) {
        let global_split_idx = offset + local_split_idx;
        split_indices.push(global_split_idx);

        let (left, right) = sorted_pairs.split_at(local_split_idx);
        let remaining_splits = max_splits - 1;
        let left_splits = remaining_splits / 2;
        let right_splits = remaining_splits - left_splits;

        find_cart_splits_recursive(left, offset, left_splits, min_samples, split_indices);
        find_cart_splits_recursive(right, global_split_idx, right_splits, min_samples, split_indices);
    }
}

/// Start indices of CART prebins
fn cart_prebin_starts(sorted_pairs: &[(f64, i32)], max_prebins: usize, min_samples: usize) -> Vec<usize> {
    let mut split_indices = vec![0];
    find_cart_splits_recursive(
        sorted_pairs,
        0,
        max_prebins.saturating_sub(1),
        min_samples,
        &mut split_indices,
    );
    split_indices.sort_unstable();
    split_indices.dedup();
    split_indices
}

/// Start indices of equal-frequency prebins; a run of tied values is never split
fn quantile_prebin_starts(sorted_pairs: &[(f64, i32)], num_prebins: usize) -> Vec<usize> {
    let n = sorted_pairs.len();
    let bin_size = n.div_ceil(num_prebins.max(1));

    let mut starts = Vec::new();
    let mut start = 0;
    while start < n {
        starts.push(start);
        let mut end = (start + bin_size).min(n);
        while end < n && sorted_pairs[end].0 == sorted_pairs[end - 1].0 {
            end += 1;
        }
        start = end;
    }
    starts
}

/// Merge prebins down to `max_bins`, using the solver when configured
fn merge_prebins(
    name: &str,
    prebins: Vec<Segment>,
    config: &BinningConfig,
    total_events: f64,
    total_non_events: f64,
) -> Vec<Segment> {
    if config.optimizer == BinOptimizer::Solver && prebins.len() > config.max_bins {
        let counts: Vec<(f64, f64)> = prebins.iter().map(|s| (s.events, s.non_events)).collect();
        let solver_config = SolverConfig {
            monotonicity: config.monotonicity,
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
            Err(e) => {
                warn!(feature = name, error = %e, "solver failed, falling back to greedy merge");
            }
        }
    }
    greedy_merge(prebins, config.max_bins, total_events, total_non_events)
}

/// Fit the binning of one numeric predictor on the training frame
pub(crate) fn fit_numeric(
    df: &DataFrame,
    name: &str,
    labels: &[i32],
    config: &BinningConfig,
) -> Result<FitOutcome> {
    let col = df.column(name)?;
    let float_col = col.cast(&DataType::Float64)?;
    let values = float_col.f64()?;

    let mut pairs: Vec<(f64, i32)> = Vec::with_capacity(values.len());
    let mut missing_events = 0.0f64;
    let mut missing_non_events = 0.0f64;

    for (v, &y) in values.iter().zip(labels.iter()) {
        match v {
            Some(x) if !x.is_nan() => pairs.push((x, y)),
            _ if y == 1 => missing_events += 1.0,
            _ => missing_non_events += 1.0,
        }
    }

    if pairs.is_empty() {
        return Ok(FitOutcome::Invalid {
            column: name.to_string(),
            reason: "all values are missing".to_string(),
        });
    }

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    if pairs[0].0 == pairs[pairs.len() - 1].0 {
        return Ok(FitOutcome::Invalid {
            column: name.to_string(),
            reason: format!("zero variance (every non-missing value is {})", pairs[0].0),
        });
    }

    let pair_events = pairs.iter().filter(|(_, y)| *y == 1).count() as f64;
    let total_events = pair_events + missing_events;
    let total_non_events = (pairs.len() as f64 - pair_events) + missing_non_events;

    // Phase 1: prebins
    let min_samples = ((config.min_prebin_size * pairs.len() as f64).ceil() as usize).max(MIN_BIN_SAMPLES);
    let starts = match config.strategy {
        BinningStrategy::Cart => cart_prebin_starts(&pairs, config.prebins, min_samples),
        BinningStrategy::Quantile => quantile_prebin_starts(&pairs, config.prebins),
    };

    let prebins: Vec<Segment> = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(pairs.len());
            let events = pairs[start..end].iter().filter(|(_, y)| *y == 1).count() as f64;
            Segment::single(i, events, (end - start) as f64 - events)
        })
        .collect();

    // Phase 2: merge to max_bins, drop insignificant cuts, then enforce monotonicity
    let cut_points = pairs.windows(2).filter(|w| w[0].0 != w[1].0).count();
    let merged = merge_prebins(name, prebins, config, total_events, total_non_events);
    let merged = merge_insignificant(merged, config.max_pvalue, cut_points);
    let (segments, applied) = enforce_monotonicity(merged, config.monotonicity, total_events, total_non_events);

    let total_samples = total_events + total_non_events;
    let last = segments.len() - 1;
    let bins: Vec<WoeBin> = segments
        .iter()
        .enumerate()
        .map(|(k, seg)| {
            let (woe, iv_contribution) =
                calculate_woe_iv(seg.events, seg.non_events, total_events, total_non_events);
            let count = seg.events + seg.non_events;
            WoeBin {
                lower_bound: if k == 0 { f64::NEG_INFINITY } else { pairs[starts[seg.start]].0 },
                upper_bound: if k == last { f64::INFINITY } else { pairs[starts[seg.end + 1]].0 },
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

    let iv = bins.iter().map(|b| b.iv_contribution).sum::<f64>()
        + missing.as_ref().map(|m| m.iv_contribution).unwrap_or(0.0);
    let scored: Vec<(f64, f64, f64)> = bins.iter().map(|b| (b.woe, b.events, b.non_events)).collect();
    let gini = binning_gini(&scored, missing.as_ref());
    let counts: Vec<(f64, f64)> = bins.iter().map(|b| (b.events, b.non_events)).collect();
    let quality = quality_score(iv, &counts, missing.as_ref().map(|m| (m.events, m.non_events)));

    let mut rejection_reasons = config.thresholds.failures(iv, gini, quality);
    if bins.len() < config.min_bins {
        rejection_reasons.push(format!("{} bin(s) < min_bins {}", bins.len(), config.min_bins));
    }

    Ok(FitOutcome::Fitted(FeatureBinning {
        feature_name: name.to_string(),
        feature_type: FeatureType::Numeric,
        bins,
        categories: Vec::new(),
        missing_bin: missing,
        iv,
        gini,
        quality_score: quality,
        monotonicity: applied,
        retained: rejection_reasons.is_empty(),
        rejection_reasons,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_best_split() {
        let pairs = vec![(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)];

        let (split_idx, gain) = find_best_split(&pairs, 1).unwrap();
        assert_eq!(split_idx, 2, "Should split between 2.0 and 3.0");
        assert!(gain > 0.0);
    }

    #[test]
    fn test_find_best_split_respects_min_samples() {
        let pairs = vec![(1.0, 0), (2.0, 1), (3.0, 1)];
        assert!(find_best_split(&pairs, 2).is_none());
    }

    #[test]
    fn test_find_best_split_never_splits_ties() {
        let pairs = vec![(1.0, 0), (1.0, 1), (1.0, 0), (1.0, 1)];
        assert!(find_best_split(&pairs, 1).is_none());
    }

    #[test]
    fn test_quantile_prebins_keep_ties_together() {
        let pairs: Vec<(f64, i32)> = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .map(|&v| (v, 0))
            .collect();
        let starts = quantile_prebin_starts(&pairs, 4);

        // First prebin absorbs every 1.0
        assert_eq!(starts[0], 0);
        assert_eq!(starts[1], 4);
        for &s in &starts[1..] {
            assert_ne!(pairs[s].0, pairs[s - 1].0);
        }
    }

    #[test]
    fn test_cart_prebins_respect_budget() {
        let pairs: Vec<(f64, i32)> = (0..200).map(|i| (i as f64, i32::from(i % 3 == 0))).collect();
        let starts = cart_prebin_starts(&pairs, 4, 10);

        assert!(starts.len() <= 4);
        assert_eq!(starts[0], 0);
        for w in starts.windows(2) {
            assert!(w[1] - w[0] >= 10);
        }
    }

    #[test]
    fn test_fit_numeric_separator() {
        let n = 200;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<i32> = (0..n).map(|i| i32::from(i >= 100)).collect();
        let df = df! { "x" => x }.unwrap();

        let outcome = fit_numeric(&df, "x", &y, &BinningConfig::default()).unwrap();
        let FitOutcome::Fitted(fb) = outcome else {
            panic!("expected a fitted binning");
        };

        assert!(fb.retained, "reasons: {:?}", fb.rejection_reasons);
        assert_eq!(fb.bins[0].lower_bound, f64::NEG_INFINITY);
        assert_eq!(fb.bins.last().unwrap().upper_bound, f64::INFINITY);
        assert!(fb.splits().contains(&100.0));
        assert!(fb.gini > 0.99);
        assert!(fb.missing_bin.is_none());
    }

    #[test]
    fn test_fit_numeric_nan_goes_to_missing_bin() {
        let x: Vec<Option<f64>> = (0..100)
            .map(|i| if i % 10 == 0 { Some(f64::NAN) } else if i % 10 == 1 { None } else { Some(i as f64) })
            .collect();
        let y: Vec<i32> = (0..100).map(|i| i32::from(i >= 50)).collect();
        let df = df! { "x" => x }.unwrap();

        let FitOutcome::Fitted(fb) = fit_numeric(&df, "x", &y, &BinningConfig::default()).unwrap() else {
            panic!("expected a fitted binning");
        };
        assert_eq!(fb.missing_bin.as_ref().unwrap().count, 20.0);
    }

    #[test]
    fn test_fit_numeric_constant_is_invalid() {
        let df = df! { "x" => [Some(3.0f64), Some(3.0), None, Some(3.0)] }.unwrap();
        let outcome = fit_numeric(&df, "x", &[0, 1, 0, 1], &BinningConfig::default()).unwrap();
        assert!(matches!(outcome, FitOutcome::Invalid { ref reason, .. } if reason.contains("zero variance")));
    }

    #[test]
    fn test_fit_numeric_all_missing_is_invalid() {
        let df = df! { "x" => [None::<f64>, None, None] }.unwrap();
        let outcome = fit_numeric(&df, "x", &[0, 1, 0], &BinningConfig::default()).unwrap();
        assert!(matches!(outcome, FitOutcome::Invalid { ref reason, .. } if reason.contains("missing")));
    }
}
