//! Merging of adjacent prebins
//!
//! Prebins (numeric intervals or event-rate-ordered category groups) are
//! tracked as inclusive index ranges so numeric and categorical binning share
//! the same greedy merge and monotonicity enforcement.

use super::super::solver::MonotonicityConstraint;
use super::super::stats::{calculate_woe_iv, chi2_pvalue_2x2};

/// A run of consecutive prebins `start..=end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Segment {
    pub start: usize,
    pub end: usize,
    pub events: f64,
    pub non_events: f64,
}

impl Segment {
    pub fn single(index: usize, events: f64, non_events: f64) -> Self {
        Self {
            start: index,
            end: index,
            events,
            non_events,
        }
    }

    pub fn merged(&self, next: &Segment) -> Segment {
        Segment {
            start: self.start,
            end: next.end,
            events: self.events + next.events,
            non_events: self.non_events + next.non_events,
        }
    }

    pub fn woe_iv(&self, total_events: f64, total_non_events: f64) -> (f64, f64) {
        calculate_woe_iv(self.events, self.non_events, total_events, total_non_events)
    }
}

/// Total IV of a segmentation
pub(crate) fn total_iv(segments: &[Segment], total_events: f64, total_non_events: f64) -> f64 {
    segments
        .iter()
        .map(|s| s.woe_iv(total_events, total_non_events).1)
        .sum()
}

/// IV lost by merging segment `i` with segment `i + 1`
fn merge_loss(segments: &[Segment], i: usize, total_events: f64, total_non_events: f64) -> f64 {
    let before = segments[i].woe_iv(total_events, total_non_events).1
        + segments[i + 1].woe_iv(total_events, total_non_events).1;
    let after = segments[i].merged(&segments[i + 1]).woe_iv(total_events, total_non_events).1;
    before - after
}

/// Merge the candidate pair with the smallest IV loss
fn merge_cheapest(segments: &mut Vec<Segment>, candidates: &[usize], total_events: f64, total_non_events: f64) {
    let mut min_loss = f64::MAX;
    let mut merge_idx = candidates[0];
    for &i in candidates {
        let loss = merge_loss(segments, i, total_events, total_non_events);
        if loss < min_loss {
            min_loss = loss;
            merge_idx = i;
        }
    }
    let merged = segments[merge_idx].merged(&segments[merge_idx + 1]);
    segments.remove(merge_idx + 1);
    segments[merge_idx] = merged;
}

/// Greedy merge bins to minimize IV loss until target bin count is reached
pub(crate) fn greedy_merge(
    mut segments: Vec<Segment>,
    target_bins: usize,
    total_events: f64,
    total_non_events: f64,
) -> Vec<Segment> {
    while segments.len() > target_bins.max(1) {
        let candidates: Vec<usize> = (0..segments.len() - 1).collect();
        merge_cheapest(&mut segments, &candidates, total_events, total_non_events);
    }
    segments
}

/// Merge the least distinguishable neighbours until every adjacent pair
/// differs at `max_pvalue`
///
/// The chi-square p-value of each pair is multiplied by `comparisons`, the
/// number of cut points the boundaries were chosen from, since those
/// boundaries were picked to maximise the same contrast.
pub(crate) fn merge_insignificant(mut segments: Vec<Segment>, max_pvalue: f64, comparisons: usize) -> Vec<Segment> {
    let scale = comparisons.max(1) as f64;
    while segments.len() > 1 {
        let (idx, pvalue) = (0..segments.len() - 1)
            .map(|i| {
                let (a, b) = (&segments[i], &segments[i + 1]);
                (i, chi2_pvalue_2x2(a.events, a.non_events, b.events, b.non_events))
            })
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if (pvalue * scale).min(1.0) <= max_pvalue {
            break;
        }
        let merged = segments[idx].merged(&segments[idx + 1]);
        segments.remove(idx + 1);
        segments[idx] = merged;
    }
    segments
}

/// Adjacent pairs `(i, i + 1)` whose WoE order violates the constraint
fn violations(woes: &[f64], constraint: MonotonicityConstraint) -> Vec<usize> {
    let n = woes.len();
    if n < 2 {
        return Vec::new();
    }
    let argmax = |better: fn(f64, f64) -> bool| {
        (0..n).fold(0, |best, i| if better(woes[i], woes[best]) { i } else { best })
    };

    match constraint {
        MonotonicityConstraint::None | MonotonicityConstraint::Auto => Vec::new(),
        MonotonicityConstraint::Ascending => (0..n - 1).filter(|&i| woes[i] > woes[i + 1]).collect(),
        MonotonicityConstraint::Descending => (0..n - 1).filter(|&i| woes[i] < woes[i + 1]).collect(),
        MonotonicityConstraint::Peak => {
            let peak = argmax(|a, b| a > b);
            (0..n - 1)
                .filter(|&i| {
                    if i < peak {
                        woes[i] > woes[i + 1]
                    } else {
                        woes[i] < woes[i + 1]
                    }
                })
                .collect()
        }
        MonotonicityConstraint::Valley => {
            let valley = argmax(|a, b| a < b);
            (0..n - 1)
                .filter(|&i| {
                    if i < valley {
                        woes[i] < woes[i + 1]
                    } else {
                        woes[i] > woes[i + 1]
                    }
                })
                .collect()
        }
    }
}

/// Whether the WoE sequence satisfies the constraint
#[cfg(test)]
fn is_monotonic(woes: &[f64], constraint: MonotonicityConstraint) -> bool {
    violations(woes, constraint).is_empty()
}

/// Merge violating neighbours (cheapest IV loss first) until the WoE
/// sequence satisfies `constraint`
///
/// `Auto` enforces both ascending and descending order and keeps whichever
/// preserves more IV; the applied direction is returned.
pub(crate) fn enforce_monotonicity(
    segments: Vec<Segment>,
    constraint: MonotonicityConstraint,
    total_events: f64,
    total_non_events: f64,
) -> (Vec<Segment>, MonotonicityConstraint) {
    if constraint == MonotonicityConstraint::Auto {
        let ascending = enforce(segments.clone(), MonotonicityConstraint::Ascending, total_events, total_non_events);
        let descending = enforce(segments, MonotonicityConstraint::Descending, total_events, total_non_events);
        let asc_iv = total_iv(&ascending, total_events, total_non_events);
        let desc_iv = total_iv(&descending, total_events, total_non_events);
        return if desc_iv > asc_iv {
            (descending, MonotonicityConstraint::Descending)
        } else {
            (ascending, MonotonicityConstraint::Ascending)
        };
    }
    (enforce(segments, constraint, total_events, total_non_events), constraint)
}

fn enforce(
    mut segments: Vec<Segment>,
    constraint: MonotonicityConstraint,
    total_events: f64,
    total_non_events: f64,
) -> Vec<Segment> {
    loop {
        let woes: Vec<f64> = segments
            .iter()
            .map(|s| s.woe_iv(total_events, total_non_events).0)
            .collect();
        let candidates = violations(&woes, constraint);
        if candidates.is_empty() || segments.len() < 2 {
            return segments;
        }
        merge_cheapest(&mut segments, &candidates, total_events, total_non_events);
    }
}
