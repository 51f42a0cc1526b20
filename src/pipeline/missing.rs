//! Missing and non-finite predictor values ahead of correlation pruning

use polars::prelude::*;
use tracing::warn;

use super::config::MissingPolicy;
use super::error::{PipelineError, Result};

/// Dense predictor matrix (one Vec per column) with its aligned labels
#[derive(Debug, Clone)]
pub struct PreparedMatrix {
    pub columns: Vec<Vec<f64>>,
    pub labels: Vec<i32>,
    pub rows_dropped: usize,
}

/// Read `columns` of `df` as Float64 and resolve missing values per `policy`
///
/// `ZeroFill` replaces null/NaN/inf with 0, which pulls correlations toward
/// rows that happen to be zero; a warning names every filled column.
/// `DropRow` removes incomplete rows from this computation only. `Error`
/// fails on the first incomplete column.
pub fn prepare_matrix(
    df: &DataFrame,
    columns: &[String],
    labels: &[i32],
    policy: MissingPolicy,
) -> Result<PreparedMatrix> {
    let mut raw: Vec<Vec<Option<f64>>> = Vec::with_capacity(columns.len());
    for name in columns {
        let col = df.column(name)?;
        if !col.dtype().is_primitive_numeric() && col.dtype() != &DataType::Boolean {
            return Err(PipelineError::data_quality(
                name.as_str(),
                format!("pruning needs numeric predictors, found dtype {}", col.dtype()),
            ));
        }
        let float_col = col.cast(&DataType::Float64)?;
        raw.push(
            float_col
                .f64()?
                .iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        );
    }

    match policy {
        MissingPolicy::ZeroFill => {
            let mut out = Vec::with_capacity(raw.len());
            for (name, values) in columns.iter().zip(raw) {
                let filled = values.iter().filter(|v| v.is_none()).count();
                if filled > 0 {
                    warn!(feature = %name, rows = filled, "zero-filling missing values before correlation");
                }
                out.push(values.into_iter().map(|v| v.unwrap_or(0.0)).collect());
            }
            Ok(PreparedMatrix {
                columns: out,
                labels: labels.to_vec(),
                rows_dropped: 0,
            })
        }
        MissingPolicy::Error => {
            for (name, values) in columns.iter().zip(raw.iter()) {
                let missing = values.iter().filter(|v| v.is_none()).count();
                if missing > 0 {
                    return Err(PipelineError::data_quality(
                        name.as_str(),
                        format!("{} missing or non-finite value(s) under missing_policy=error", missing),
                    ));
                }
            }
            Ok(PreparedMatrix {
                columns: raw.into_iter().map(|c| c.into_iter().flatten().collect()).collect(),
                labels: labels.to_vec(),
                rows_dropped: 0,
            })
        }
        MissingPolicy::DropRow => {
            let keep: Vec<bool> = (0..labels.len())
                .map(|row| raw.iter().all(|c| c[row].is_some()))
                .collect();
            let rows_dropped = keep.iter().filter(|k| !**k).count();
            if rows_dropped > 0 {
                warn!(rows = rows_dropped, "dropping incomplete rows from the correlation computation");
            }
            let columns = raw
                .into_iter()
                .map(|c| {
                    c.into_iter()
                        .zip(keep.iter())
                        .filter_map(|(v, &k)| if k { v } else { None })
                        .collect()
                })
                .collect();
            let labels = labels
                .iter()
                .zip(keep.iter())
                .filter_map(|(&y, &k)| k.then_some(y))
                .collect();
            Ok(PreparedMatrix {
                columns,
                labels,
                rows_dropped,
            })
        }
    }
}
