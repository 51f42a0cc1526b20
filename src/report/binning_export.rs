//! JSON binning report

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    BinningProcess, CorrelationFilter, DroppedPredictor, FeatureBinning, FeatureType, PipelineConfig,
    RejectedPredictor,
};

/// Metadata about the run
#[derive(Serialize)]
pub struct ReportMetadata {
    /// ISO 8601
    pub timestamp: String,
    pub riskprep_version: String,
    pub input_file: String,
    pub config: PipelineConfig,
}

#[derive(Serialize)]
pub struct ReportSummary {
    pub predictors_binned: usize,
    pub numeric_predictors: usize,
    pub categorical_predictors: usize,
    pub predictors_rejected: usize,
    pub predictors_retained: usize,
    pub predictors_pruned: usize,
    pub predictors_final: usize,
    pub avg_retained_iv: f64,
}

/// One predictor's fitted bins plus its fate in the pipeline
#[derive(Serialize)]
pub struct FeatureEntry<'a> {
    #[serde(flatten)]
    pub binning: &'a FeatureBinning,
    /// Dropped by correlation pruning after passing selection
    pub pruned: bool,
}

#[derive(Serialize)]
pub struct BinningReport<'a> {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub features: Vec<FeatureEntry<'a>>,
    pub rejected: &'a [RejectedPredictor],
    pub pruning: &'a [DroppedPredictor],
}

impl<'a> BinningReport<'a> {
    /// Features ordered by IV descending; `filter` is `None` when nothing was pruned
    pub fn build(
        input_file: &str,
        config: &PipelineConfig,
        binning: &'a BinningProcess,
        filter: Option<&'a CorrelationFilter>,
    ) -> Self {
        let pruning: &[DroppedPredictor] = filter.map(|f| f.dropped()).unwrap_or(&[]);
        // Pruned only if pruning dropped a column of the feature and kept none
        let is_pruned = |name: &str| {
            filter.is_some_and(|f| {
                f.dropped().iter().any(|d| derives_from(&d.name, name))
                    && !f.retained().iter().any(|column| derives_from(column, name))
            })
        };

        let mut features: Vec<FeatureEntry<'a>> = binning
            .features()
            .iter()
            .map(|fb| FeatureEntry {
                binning: fb,
                pruned: fb.retained && is_pruned(&fb.feature_name),
            })
            .collect();
        features.sort_by(|a, b| b.binning.iv.total_cmp(&a.binning.iv));

        let retained: Vec<&FeatureBinning> = binning.retained().collect();
        let predictors_pruned = features.iter().filter(|f| f.pruned).count();
        let avg_retained_iv = if retained.is_empty() {
            0.0
        } else {
            retained.iter().map(|f| f.iv).sum::<f64>() / retained.len() as f64
        };

        Self {
            metadata: ReportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                riskprep_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.to_string(),
                config: config.clone(),
            },
            summary: ReportSummary {
                predictors_binned: binning.features().len(),
                numeric_predictors: binning
                    .features()
                    .iter()
                    .filter(|f| f.feature_type == FeatureType::Numeric)
                    .count(),
                categorical_predictors: binning
                    .features()
                    .iter()
                    .filter(|f| f.feature_type == FeatureType::Categorical)
                    .count(),
                predictors_rejected: binning.rejected().len(),
                predictors_retained: retained.len(),
                predictors_pruned,
                predictors_final: retained.len() - predictors_pruned,
                avg_retained_iv,
            },
            features,
            rejected: binning.rejected(),
            pruning,
        }
    }

    pub fn write(&self, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize binning report to JSON")?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write binning report to {}", output_path.display()))?;
        Ok(())
    }
}

/// Whether an output column carries `feature`, directly or as a `<feature>_bin<k>` indicator
fn derives_from(column: &str, feature: &str) -> bool {
    column == feature
        || column
            .strip_prefix(feature)
            .and_then(|rest| rest.strip_prefix("_bin"))
            .is_some_and(|k| !k.is_empty() && k.chars().all(|c| c.is_ascii_digit()))
}
