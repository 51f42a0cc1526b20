//! Monotonicity constraints for optimal binning
//!
//! WoE monotonicity patterns enforced on the final bins, both by the greedy
//! merge and by the MIP solver.

use serde::{Deserialize, Serialize};

/// Monotonicity constraint for WoE pattern in binning
///
/// Scorecard bins are expected to carry a WoE that moves in one direction
/// (or turns once) as the predictor grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonotonicityConstraint {
    /// No monotonicity constraint - WoE can vary freely
    #[default]
    None,
    /// WoE must increase with feature value (higher values = higher risk)
    Ascending,
    /// WoE must decrease with feature value (higher values = lower risk)
    Descending,
    /// WoE increases then decreases (single peak pattern)
    Peak,
    /// WoE decreases then increases (single valley pattern)
    Valley,
    /// Ascending or descending, whichever keeps more IV
    Auto,
}

impl std::fmt::Display for MonotonicityConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonotonicityConstraint::None => write!(f, "none"),
            MonotonicityConstraint::Ascending => write!(f, "ascending"),
            MonotonicityConstraint::Descending => write!(f, "descending"),
            MonotonicityConstraint::Peak => write!(f, "peak"),
            MonotonicityConstraint::Valley => write!(f, "valley"),
            MonotonicityConstraint::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for MonotonicityConstraint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(MonotonicityConstraint::None),
            "ascending" | "asc" => Ok(MonotonicityConstraint::Ascending),
            "descending" | "desc" => Ok(MonotonicityConstraint::Descending),
            "peak" => Ok(MonotonicityConstraint::Peak),
            "valley" => Ok(MonotonicityConstraint::Valley),
            "auto" => Ok(MonotonicityConstraint::Auto),
            _ => Err(format!(
                "Unknown monotonicity constraint: '{}'. Use 'none', 'ascending', 'descending', 'peak', 'valley', or 'auto'.",
                s
            )),
        }
    }
}
