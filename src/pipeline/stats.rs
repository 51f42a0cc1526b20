//! Statistical helpers shared by binning, pruning and diagnostics

/// Smoothing constant to avoid log(0) in WoE calculation (Laplace smoothing)
pub const SMOOTHING: f64 = 0.5;

/// Calculate WoE and IV contribution for a bin
///
/// Uses the ln(%bad/%good) convention where:
/// - WoE > 0 indicates higher risk (more defaults)
/// - WoE < 0 indicates lower risk (fewer defaults)
pub fn calculate_woe_iv(
    events: f64,
    non_events: f64,
    total_events: f64,
    total_non_events: f64,
) -> (f64, f64) {
    let dist_events = (events + SMOOTHING) / (total_events + SMOOTHING);
    let dist_non_events = (non_events + SMOOTHING) / (total_non_events + SMOOTHING);

    let woe = (dist_events / dist_non_events).ln();
    let iv_contrib = (dist_events - dist_non_events) * woe;

    (woe, iv_contrib)
}

/// Gini impurity of a node: 2 * p * (1 - p) with p the event share
pub fn gini_impurity(events: f64, non_events: f64) -> f64 {
    let total = events + non_events;
    if total == 0.0 {
        return 0.0;
    }
    let p = events / total;
    2.0 * p * (1.0 - p)
}

/// Calculate weighted AUC using the weighted Mann-Whitney U statistic
///
/// `sorted_pairs` holds (score, label, weight) tuples sorted by score ascending.
/// Tied scores receive the weighted midpoint rank.
pub fn calculate_weighted_auc(sorted_pairs: &[(f64, i32, f64)]) -> f64 {
    if sorted_pairs.is_empty() {
        return 0.5;
    }

    let total_pos: f64 = sorted_pairs
        .iter()
        .filter(|(_, t, _)| *t == 1)
        .map(|(_, _, w)| w)
        .sum();
    let total_neg: f64 = sorted_pairs
        .iter()
        .filter(|(_, t, _)| *t == 0)
        .map(|(_, _, w)| w)
        .sum();

    if total_pos <= 0.0 || total_neg <= 0.0 {
        return 0.5;
    }

    let n = sorted_pairs.len();
    let mut weighted_rank_sum_pos = 0.0;
    let mut cumulative_weight = 0.0;
    let mut i = 0;

    while i < n {
        let current_value = sorted_pairs[i].0;
        let mut j = i;

        while j < n && (sorted_pairs[j].0 - current_value).abs() < 1e-10 {
            j += 1;
        }

        let group_weight: f64 = sorted_pairs[i..j].iter().map(|(_, _, w)| w).sum();
        let avg_rank = cumulative_weight + group_weight / 2.0;

        for pair in &sorted_pairs[i..j] {
            if pair.1 == 1 {
                weighted_rank_sum_pos += avg_rank * pair.2;
            }
        }

        cumulative_weight += group_weight;
        i = j;
    }

    let u = weighted_rank_sum_pos - total_pos * total_pos / 2.0;
    (u / (total_pos * total_neg)).clamp(0.0, 1.0)
}

/// Gini coefficient (2 * AUC - 1) of bin-level scores
///
/// Each entry is (score, events, non_events); every sample in a bin shares
/// the bin's score, so the aggregated counts act as weights.
pub fn gini_from_bins(bins: &[(f64, f64, f64)]) -> f64 {
    let mut pairs: Vec<(f64, i32, f64)> = Vec::with_capacity(bins.len() * 2);
    for &(score, events, non_events) in bins {
        if events > 0.0 {
            pairs.push((score, 1, events));
        }
        if non_events > 0.0 {
            pairs.push((score, 0, non_events));
        }
    }
    if pairs.is_empty() {
        return 0.0;
    }
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    2.0 * calculate_weighted_auc(&pairs) - 1.0
}

/// Complementary error function (Chebyshev fit, fractional error < 1.2e-7)
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// p-value of a 2x2 chi-square test comparing the event rates of two bins
pub fn chi2_pvalue_2x2(events_a: f64, non_events_a: f64, events_b: f64, non_events_b: f64) -> f64 {
    let row_a = events_a + non_events_a;
    let row_b = events_b + non_events_b;
    let col_events = events_a + events_b;
    let col_non_events = non_events_a + non_events_b;
    let n = row_a + row_b;

    let denom = row_a * row_b * col_events * col_non_events;
    if denom <= 0.0 {
        return 1.0;
    }

    let diff = events_a * non_events_b - non_events_a * events_b;
    let chi2 = n * diff * diff / denom;
    // Chi-square with 1 degree of freedom: P(X > x) = erfc(sqrt(x / 2))
    erfc((chi2 / 2.0).sqrt()).clamp(0.0, 1.0)
}

/// Normalised Herfindahl-Hirschman index of bin populations, in [0, 1]
///
/// 0 means perfectly even populations, 1 means everything sits in one bin.
pub fn normalized_hhi(counts: &[f64]) -> f64 {
    let k = counts.len();
    let total: f64 = counts.iter().sum();
    if k <= 1 || total <= 0.0 {
        return 1.0;
    }
    let hhi: f64 = counts.iter().map(|c| (c / total).powi(2)).sum();
    let floor = 1.0 / k as f64;
    ((hhi - floor) / (1.0 - floor)).clamp(0.0, 1.0)
}

/// One-way ANOVA F-statistic between a predictor and a binary label
///
/// Perfect separation (zero within-group variance with distinct group means)
/// yields `f64::INFINITY`; a constant predictor yields 0.
pub fn f_classif(values: &[f64], labels: &[i32]) -> f64 {
    let mut sum = [0.0f64; 2];
    let mut count = [0usize; 2];
    for (&x, &y) in values.iter().zip(labels.iter()) {
        let g = usize::from(y == 1);
        sum[g] += x;
        count[g] += 1;
    }
    if count[0] == 0 || count[1] == 0 {
        return 0.0;
    }

    let n = (count[0] + count[1]) as f64;
    let grand_mean = (sum[0] + sum[1]) / n;
    let means = [sum[0] / count[0] as f64, sum[1] / count[1] as f64];

    let ss_between: f64 = (0..2)
        .map(|g| count[g] as f64 * (means[g] - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = values
        .iter()
        .zip(labels.iter())
        .map(|(&x, &y)| (x - means[usize::from(y == 1)]).powi(2))
        .sum();

    let df_within = n - 2.0;
    if df_within <= 0.0 {
        return 0.0;
    }
    if ss_within <= f64::EPSILON * n {
        return if ss_between > 0.0 { f64::INFINITY } else { 0.0 };
    }

    ss_between / (ss_within / df_within)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woe_iv_calculation() {
        let (woe, iv) = calculate_woe_iv(10.0, 90.0, 100.0, 900.0);

        // With smoothing, dist_events ≈ 10.5/100.5, dist_non_events ≈ 90.5/900.5
        assert!(woe.abs() < 0.1, "WoE should be close to 0 for equal distributions");
        assert!(iv >= 0.0, "IV should be non-negative");
    }

    #[test]
    fn test_woe_sign_follows_risk() {
        let (woe_risky, _) = calculate_woe_iv(80.0, 20.0, 100.0, 100.0);
        let (woe_safe, _) = calculate_woe_iv(20.0, 80.0, 100.0, 100.0);
        assert!(woe_risky > 0.0);
        assert!(woe_safe < 0.0);
    }

    #[test]
    fn test_weighted_auc_calculation() {
        let perfect = vec![(1.0, 0, 1.0), (2.0, 0, 1.0), (3.0, 1, 1.0), (4.0, 1, 1.0)];
        let auc = calculate_weighted_auc(&perfect);
        assert!((auc - 1.0).abs() < 0.01, "Perfect separation should give AUC ≈ 1.0, got {}", auc);

        let no_disc = vec![(1.0, 0, 1.0), (1.0, 1, 1.0), (2.0, 0, 1.0), (2.0, 1, 1.0)];
        let auc = calculate_weighted_auc(&no_disc);
        assert!((auc - 0.5).abs() < 0.1, "No discrimination should give AUC ≈ 0.5, got {}", auc);

        let partial = vec![(1.0, 0, 1.0), (2.0, 1, 1.0), (3.0, 0, 1.0), (4.0, 1, 1.0)];
        let auc = calculate_weighted_auc(&partial);
        assert!(auc > 0.5 && auc < 1.0, "Partial discrimination should give AUC in (0.5, 1), got {}", auc);
    }

    #[test]
    fn test_gini_from_bins() {
        // Two pure bins: perfect separation
        let gini = gini_from_bins(&[(-2.0, 0.0, 50.0), (2.0, 50.0, 0.0)]);
        assert!((gini - 1.0).abs() < 1e-9);

        // Single bin: no discrimination
        let gini = gini_from_bins(&[(0.0, 50.0, 50.0)]);
        assert!(gini.abs() < 1e-9);
    }

    #[test]
    fn test_gini_impurity() {
        assert!((gini_impurity(0.0, 10.0) - 0.0).abs() < 0.01);
        assert!((gini_impurity(10.0, 0.0) - 0.0).abs() < 0.01);
        assert!((gini_impurity(5.0, 5.0) - 0.5).abs() < 0.01);

        let skewed = gini_impurity(9.0, 1.0);
        assert!(skewed < 0.5 && skewed > 0.0);
    }

    #[test]
    fn test_erfc_known_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!((erfc(1.0) - 0.157_299_2).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842_700_8).abs() < 1e-6);
        assert!(erfc(6.0) < 1e-12);
    }

    #[test]
    fn test_chi2_pvalue() {
        // Identical event rates: no evidence of difference
        let p = chi2_pvalue_2x2(10.0, 10.0, 20.0, 20.0);
        assert!((p - 1.0).abs() < 1e-6);

        // Strongly different event rates
        let p = chi2_pvalue_2x2(90.0, 10.0, 10.0, 90.0);
        assert!(p < 1e-6);

        // Empty bin
        assert_eq!(chi2_pvalue_2x2(0.0, 0.0, 5.0, 5.0), 1.0);
    }

    #[test]
    fn test_normalized_hhi() {
        assert!(normalized_hhi(&[25.0, 25.0, 25.0, 25.0]).abs() < 1e-12);
        assert!((normalized_hhi(&[100.0, 0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(normalized_hhi(&[10.0]), 1.0);
    }

    #[test]
    fn test_f_classif() {
        let labels = [0, 0, 0, 1, 1, 1];

        let separated = [1.0, 1.1, 0.9, 5.0, 5.1, 4.9];
        let noisy = [1.0, 5.0, 3.0, 2.0, 4.0, 3.0];
        assert!(f_classif(&separated, &labels) > f_classif(&noisy, &labels));

        let constant = [2.0; 6];
        assert_eq!(f_classif(&constant, &labels), 0.0);

        let perfect = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        assert!(f_classif(&perfect, &labels).is_infinite());
    }
}
