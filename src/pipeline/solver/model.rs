//! MIP model over candidate intervals
//!
//! One binary per selectable interval of prebins. Every prebin must be
//! covered by exactly one selected interval, the number of selected
//! intervals lies in `min_bins..=max_bins`, and for a directional
//! constraint two neighbouring intervals whose WoE order breaks the
//! direction cannot both be selected.

use std::time::Instant;

use good_lp::{constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};

use super::super::error::{PipelineError, Result};
use super::intervals::{Interval, IntervalTable};
use super::monotonicity::MonotonicityConstraint;
use super::{SolverConfig, SolverResult};

/// Solve for one fixed direction (`None`, `Ascending` or `Descending`;
/// other patterns are left to the post-merge pass)
pub(super) fn solve_directed(
    table: &IntervalTable,
    max_bins: usize,
    config: &SolverConfig,
    direction: MonotonicityConstraint,
    started: Instant,
) -> Result<SolverResult> {
    let n = table.prebins();
    let mut vars = ProblemVariables::new();

    // The single all-covering interval stays selectable so the model is never infeasible
    let candidates: Vec<(&Interval, Variable)> = table
        .iter()
        .filter(|iv| iv.count >= config.min_bin_samples as f64 || (iv.start == 0 && iv.end + 1 == n))
        .map(|iv| (iv, vars.add(variable().binary())))
        .collect();

    let objective: Expression = candidates.iter().map(|(iv, v)| iv.iv * *v).sum();
    let selected: Expression = candidates.iter().map(|(_, v)| *v).sum();
    let min_bins = config.min_bins.clamp(1, n) as f64;

    let mut problem = vars
        .maximise(objective)
        .using(default_solver)
        .with(constraint!(selected.clone() <= max_bins as f64))
        .with(constraint!(selected >= min_bins));

    for prebin in 0..n {
        let cover: Expression = candidates
            .iter()
            .filter(|(iv, _)| iv.contains(prebin))
            .map(|(_, v)| *v)
            .sum();
        problem = problem.with(constraint!(cover == 1.0));
    }

    if matches!(
        direction,
        MonotonicityConstraint::Ascending | MonotonicityConstraint::Descending
    ) {
        for (left, lv) in &candidates {
            for (right, rv) in candidates.iter().filter(|(right, _)| right.start == left.end + 1) {
                let breaks = match direction {
                    MonotonicityConstraint::Ascending => left.woe > right.woe,
                    _ => left.woe < right.woe,
                };
                if breaks {
                    let pair: Expression = *lv + *rv;
                    problem = problem.with(constraint!(pair <= 1.0));
                }
            }
        }
    }

    let solution = problem
        .solve()
        .map_err(|e| PipelineError::Solver(format!("failed to solve MIP model: {}", e)))?;

    let mut chosen: Vec<&Interval> = candidates
        .iter()
        .filter(|(_, v)| solution.value(*v) > 0.5)
        .map(|(iv, _)| *iv)
        .collect();
    chosen.sort_by_key(|iv| iv.start);

    Ok(SolverResult {
        bin_boundaries: chosen.iter().map(|iv| (iv.start, iv.end)).collect(),
        total_iv: chosen.iter().map(|iv| iv.iv).sum(),
        solve_time_ms: started.elapsed().as_millis() as u64,
        monotonicity_applied: direction,
    })
}
