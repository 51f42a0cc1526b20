//! Discrimination diagnostics for model scores
//!
//! Scores are read as risk: a higher score should mean a higher chance of
//! default (label 1). Tied scores are handled as one group throughout, so the
//! curves do not depend on row order.

use serde::Serialize;

use crate::pipeline::error::{PipelineError, Result};
use crate::pipeline::stats::calculate_weighted_auc;

fn validate(labels: &[i32], scores: &[f64]) -> Result<(usize, usize)> {
    if labels.len() != scores.len() {
        return Err(PipelineError::config(format!(
            "{} labels but {} scores",
            labels.len(),
            scores.len()
        )));
    }
    if let Some(bad) = labels.iter().find(|&&y| y != 0 && y != 1) {
        return Err(PipelineError::config(format!("labels must be 0/1, found {}", bad)));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(PipelineError::config("scores must be finite"));
    }
    let events = labels.iter().filter(|&&y| y == 1).count();
    let non_events = labels.len() - events;
    if events == 0 || non_events == 0 {
        return Err(PipelineError::config(
            "diagnostics need both classes in the labels",
        ));
    }
    Ok((events, non_events))
}

/// (score, events, non_events) per distinct score, highest score first
fn score_groups(labels: &[i32], scores: &[f64]) -> Vec<(f64, f64, f64)> {
    let mut pairs: Vec<(f64, i32)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut groups: Vec<(f64, f64, f64)> = Vec::new();
    for (score, y) in pairs {
        match groups.last_mut() {
            Some(last) if last.0 == score => {
                if y == 1 {
                    last.1 += 1.0;
                } else {
                    last.2 += 1.0;
                }
            }
            _ => groups.push((score, f64::from(y), f64::from(1 - y))),
        }
    }
    groups
}

/// Area under the ROC curve
pub fn auc(labels: &[i32], scores: &[f64]) -> Result<f64> {
    validate(labels, scores)?;
    let mut pairs: Vec<(f64, i32, f64)> = scores
        .iter()
        .zip(labels.iter())
        .map(|(&s, &y)| (s, y, 1.0))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(calculate_weighted_auc(&pairs))
}

/// Gini coefficient, `2 * AUC - 1`
pub fn gini(labels: &[i32], scores: &[f64]) -> Result<f64> {
    Ok(2.0 * auc(labels, scores)? - 1.0)
}

/// Kolmogorov-Smirnov statistic: largest gap between the cumulative score
/// distributions of defaults and non-defaults
pub fn ks_statistic(labels: &[i32], scores: &[f64]) -> Result<f64> {
    let (events, non_events) = validate(labels, scores)?;
    let (events, non_events) = (events as f64, non_events as f64);

    let mut cum_events = 0.0;
    let mut cum_non_events = 0.0;
    let mut ks: f64 = 0.0;
    for (_, e, ne) in score_groups(labels, scores) {
        cum_events += e;
        cum_non_events += ne;
        ks = ks.max((cum_events / events - cum_non_events / non_events).abs());
    }
    Ok(ks)
}

/// Accuracy ratio from the cumulative accuracy profile
///
/// Area between the model's CAP and the random line, divided by the same
/// area for a perfect model. Equals the Gini up to tie handling.
pub fn accuracy_ratio(labels: &[i32], scores: &[f64]) -> Result<f64> {
    let (events, _) = validate(labels, scores)?;
    let n = labels.len() as f64;
    let events = events as f64;

    // trapezoids over (population share, captured default share)
    let mut area = 0.0;
    let mut x_prev = 0.0;
    let mut y_prev = 0.0;
    for (_, e, ne) in score_groups(labels, scores) {
        let x = x_prev + (e + ne) / n;
        let y = y_prev + e / events;
        area += (x - x_prev) * (y + y_prev) / 2.0;
        x_prev = x;
        y_prev = y;
    }

    let random = 0.5;
    let perfect = 1.0 - events / (2.0 * n);
    Ok((area - random) / (perfect - random))
}

/// All discrimination measures for one set of scores
#[derive(Debug, Clone, Serialize)]
pub struct DiscriminationReport {
    pub observations: usize,
    pub events: usize,
    pub auc: f64,
    pub gini: f64,
    pub ks: f64,
    pub accuracy_ratio: f64,
}

impl DiscriminationReport {
    pub fn compute(labels: &[i32], scores: &[f64]) -> Result<Self> {
        let (events, _) = validate(labels, scores)?;
        let auc = auc(labels, scores)?;
        Ok(Self {
            observations: labels.len(),
            events,
            auc,
            gini: 2.0 * auc - 1.0,
            ks: ks_statistic(labels, scores)?,
            accuracy_ratio: accuracy_ratio(labels, scores)?,
        })
    }
}
