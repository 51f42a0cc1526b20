//! Label column validation
//!
//! The label must be present, non-null and binary (0 = no default, 1 = default)
//! in every dataset the pipeline touches.

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Extract the label column as 0/1 integers
///
/// Fails with `Configuration` when the column is absent or empty and with
/// `DataQuality` when it holds nulls or values other than 0 and 1.
pub fn label_values(df: &DataFrame, label: &str) -> Result<Vec<i32>> {
    let label_col = df
        .column(label)
        .map_err(|_| PipelineError::config(format!("Label column '{}' not found", label)))?;

    if label_col.len() == 0 {
        return Err(PipelineError::config(format!("Label column '{}' is empty", label)));
    }

    let nulls = label_col.null_count();
    if nulls > 0 {
        return Err(PipelineError::data_quality(
            label,
            format!("label contains {} null value(s)", nulls),
        ));
    }

    if !label_col.dtype().is_primitive_numeric() && label_col.dtype() != &DataType::Boolean {
        return Err(PipelineError::data_quality(
            label,
            format!("label must be numeric 0/1, found dtype {}", label_col.dtype()),
        ));
    }

    let float_col = label_col.cast(&DataType::Float64)?;
    let values = float_col.f64()?;

    let mut out = Vec::with_capacity(values.len());
    for v in values.iter().flatten() {
        if v.abs() < TOLERANCE {
            out.push(0);
        } else if (v - 1.0).abs() < TOLERANCE {
            out.push(1);
        } else {
            return Err(PipelineError::data_quality(
                label,
                format!("label must be binary (0/1), found value {}", v),
            ));
        }
    }

    Ok(out)
}

/// Count (events, non_events) in a label vector
pub fn class_counts(labels: &[i32]) -> (usize, usize) {
    let events = labels.iter().filter(|&&y| y == 1).count();
    (events, labels.len() - events)
}

/// Fail unless both classes are present
pub fn ensure_both_classes(labels: &[i32], label: &str) -> Result<()> {
    let (events, non_events) = class_counts(labels);
    if events == 0 || non_events == 0 {
        return Err(PipelineError::data_quality(
            label,
            format!(
                "label has no variation ({} events, {} non-events)",
                events, non_events
            ),
        ));
    }
    Ok(())
}
