//! One-hot bin indicators for the dummy preprocessing strategy

use polars::prelude::*;

use super::binning::BinningProcess;
use super::error::Result;
use super::target::label_values;

/// Name of the indicator column for bin `k` of `feature`
pub fn indicator_name(feature: &str, k: usize) -> String {
    format!("{}_bin{}", feature, k)
}

/// Expand every retained predictor of `df` into 0/1 bin indicators
///
/// One Int32 column `<name>_bin<k>` per fitted bin, missing bin included,
/// so train and test always get the same columns even when a partition
/// never reaches some bin. Label first.
pub fn expand_indicators(process: &BinningProcess, df: &DataFrame) -> Result<DataFrame> {
    label_values(df, process.label())?;

    let mut columns: Vec<Column> = vec![df.column(process.label())?.clone()];
    for fb in process.retained() {
        let indices = process.bin_indices(df, fb)?;
        for k in 0..fb.total_bins() {
            let indicator: Vec<i32> = indices.iter().map(|&i| i32::from(i == k)).collect();
            columns.push(Column::new(indicator_name(&fb.feature_name, k).into(), indicator));
        }
    }

    Ok(DataFrame::new(columns)?)
}
