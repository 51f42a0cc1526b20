//! Solver-based optimal binning using Mixed Integer Programming (MIP)
//!
//! Finds the globally IV-optimal way to merge consecutive prebins into at
//! most `max_bins` final bins using the HiGHS solver via good_lp. Prebins are
//! given as (events, non_events) counts, so numeric intervals and
//! event-rate-ordered category groups use the same model.

mod intervals;
mod model;
mod monotonicity;

use std::time::Instant;

use tracing::debug;

use super::error::{PipelineError, Result};
use super::stats::calculate_woe_iv;
use intervals::IntervalTable;

pub use monotonicity::MonotonicityConstraint;

/// Configuration for the solver-based optimal binning
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Monotonicity constraint for the WoE pattern
    pub monotonicity: MonotonicityConstraint,
    /// Minimum samples per final bin
    pub min_bin_samples: usize,
    /// Lower bound on the number of final bins
    pub min_bins: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            monotonicity: MonotonicityConstraint::None,
            min_bin_samples: 5,
            min_bins: 1,
        }
    }
}

/// Result from the optimal binning solver
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Each (start, end) pair lists the prebins merged into one final bin
    pub bin_boundaries: Vec<(usize, usize)>,
    /// Total IV achieved by this solution
    pub total_iv: f64,
    pub solve_time_ms: u64,
    /// The monotonicity constraint that was applied
    pub monotonicity_applied: MonotonicityConstraint,
}

/// Solve optimal merging of `prebins` (events, non_events) into at most
/// `max_bins` bins maximizing total IV
///
/// `Auto` solves both directions and keeps the higher IV; ties go to
/// ascending. When there are no more prebins than `max_bins` each prebin
/// becomes its own bin.
pub fn solve_optimal_binning(
    prebins: &[(f64, f64)],
    max_bins: usize,
    config: &SolverConfig,
    total_events: f64,
    total_non_events: f64,
) -> Result<SolverResult> {
    let started = Instant::now();
    if prebins.is_empty() {
        return Err(PipelineError::Solver("no prebins to merge".to_string()));
    }

    if prebins.len() <= max_bins {
        return Ok(SolverResult {
            bin_boundaries: (0..prebins.len()).map(|i| (i, i)).collect(),
            total_iv: prebins
                .iter()
                .map(|&(e, ne)| calculate_woe_iv(e, ne, total_events, total_non_events).1)
                .sum(),
            solve_time_ms: started.elapsed().as_millis() as u64,
            monotonicity_applied: MonotonicityConstraint::None,
        });
    }

    let table = IntervalTable::build(prebins, total_events, total_non_events);
    let result = if config.monotonicity == MonotonicityConstraint::Auto {
        [MonotonicityConstraint::Ascending, MonotonicityConstraint::Descending]
            .into_iter()
            .filter_map(|direction| model::solve_directed(&table, max_bins, config, direction, started).ok())
            .reduce(|best, candidate| if candidate.total_iv > best.total_iv { candidate } else { best })
            .ok_or_else(|| PipelineError::Solver("no feasible solution for either monotonic direction".to_string()))?
    } else {
        model::solve_directed(&table, max_bins, config, config.monotonicity, started)?
    };

    debug!(
        prebins = prebins.len(),
        bins = result.bin_boundaries.len(),
        iv = result.total_iv,
        elapsed_ms = result.solve_time_ms,
        "MIP binning solved"
    );
    Ok(result)
}
