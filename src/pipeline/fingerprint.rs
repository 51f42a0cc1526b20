//! Identity of the frame a fitted artifact was learned from
//!
//! Fitted binning and pruning state records the fingerprint of its training
//! frame so the orchestrator can prove it was never refitted on test data.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, Result};
use super::target::label_values;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameFingerprint {
    pub height: usize,
    pub width: usize,
    /// Hash over the column names and the label sequence
    pub digest: u64,
}

impl FrameFingerprint {
    pub fn of(df: &DataFrame, label: &str) -> Result<Self> {
        let labels = label_values(df, label)?;

        let mut hasher = DefaultHasher::new();
        for name in df.get_column_names() {
            name.as_str().hash(&mut hasher);
        }
        labels.hash(&mut hasher);

        Ok(Self {
            height: df.height(),
            width: df.width(),
            digest: hasher.finish(),
        })
    }

    /// Fail with `LeakageGuard` unless `df` is the frame this fingerprint was taken from
    pub fn ensure_matches(&self, df: &DataFrame, label: &str, artifact: &str) -> Result<()> {
        let other = Self::of(df, label)?;
        if &other != self {
            return Err(PipelineError::LeakageGuard(format!(
                "{} was fitted on a {}x{} frame, not on the expected training partition ({}x{})",
                artifact, self.height, self.width, other.height, other.width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let df = df! {
            "target" => [0i32, 1, 1, 0],
            "x" => [1.0f64, 2.0, 3.0, 4.0],
        }
        .unwrap();

        let a = FrameFingerprint::of(&df, "target").unwrap();
        let b = FrameFingerprint::of(&df.clone(), "target").unwrap();
        assert_eq!(a, b);
        assert!(a.ensure_matches(&df, "target", "binning").is_ok());
    }

    #[test]
    fn test_fingerprint_detects_other_frame() {
        let train = df! {
            "target" => [0i32, 1, 1, 0],
            "x" => [1.0f64, 2.0, 3.0, 4.0],
        }
        .unwrap();
        let test = df! {
            "target" => [1i32, 0],
            "x" => [5.0f64, 6.0],
        }
        .unwrap();

        let fp = FrameFingerprint::of(&train, "target").unwrap();
        let err = fp.ensure_matches(&test, "target", "binning").unwrap_err();
        assert!(matches!(err, PipelineError::LeakageGuard(_)));
    }
}
