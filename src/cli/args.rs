//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::pipeline::{
    BinOptimizer, BinningStrategy, ColumnClassifier, DtypeClassifier, EncodingMetric,
    ExplicitSchemaClassifier, InvalidPredictorPolicy, MissingPolicy, MonotonicityConstraint,
    NamingConventionClassifier, PipelineConfig, PreprocessingStrategy,
};

/// riskprep - split, bin and prune a credit-risk dataset for model training
///
/// Settings are layered: defaults, then `--config`, then individual flags.
#[derive(Parser, Debug)]
#[command(name = "riskprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Binary 0/1 label column [default: default_event_flg]
    #[arg(short, long)]
    pub target: Option<String>,

    /// Directory for <stem>_train / <stem>_test outputs.
    /// Defaults to the input file's directory; the input format is kept.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON file with a full or partial pipeline configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Preprocessing strategy
    #[arg(long)]
    pub strategy: Option<PreprocessingStrategy>,

    /// Seed of the train/test shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Share of rows assigned to the test partition (0-1, exclusive)
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Value written for every binned predictor: woe, bin_index or event_rate
    #[arg(long)]
    pub encoding_metric: Option<EncodingMetric>,

    /// Minimum information value for a predictor to be retained
    #[arg(long)]
    pub iv_min: Option<f64>,

    /// Minimum |Gini| for a predictor to be retained
    #[arg(long)]
    pub gini_min: Option<f64>,

    /// Minimum binning quality score for a predictor to be retained
    #[arg(long)]
    pub quality_min: Option<f64>,

    /// Minimum number of final bins per predictor
    #[arg(long)]
    pub min_bins: Option<usize>,

    /// Maximum number of final bins per predictor
    #[arg(long)]
    pub max_bins: Option<usize>,

    /// Number of prebins created before merging
    #[arg(long)]
    pub prebins: Option<usize>,

    /// Prebinning strategy: "cart" (decision tree splits) or "quantile" (equal-frequency)
    #[arg(long)]
    pub binning_strategy: Option<BinningStrategy>,

    /// Minimum CART prebin size as a fraction of rows (0-0.5)
    #[arg(long)]
    pub min_prebin_size: Option<f64>,

    /// Categories with fewer rows are pooled into one group
    #[arg(long)]
    pub min_category_samples: Option<usize>,

    /// Merge neighbouring bins whose adjusted chi-square p-value exceeds this (0-1]
    #[arg(long)]
    pub max_pvalue: Option<f64>,

    /// WoE pattern: none, ascending, descending, peak, valley or auto
    #[arg(long)]
    pub monotonicity: Option<MonotonicityConstraint>,

    /// Bin merging: "greedy" or "solver" (MIP via HiGHS)
    #[arg(long)]
    pub optimizer: Option<BinOptimizer>,

    /// What to do with constant or all-missing predictors: "error" or "drop"
    #[arg(long)]
    pub invalid_predictors: Option<InvalidPredictorPolicy>,

    /// Drop one predictor from every pair with |correlation| above this value
    #[arg(long)]
    pub correlation_threshold: Option<f64>,

    /// Missing values before correlation: zero_fill, drop_row or error
    #[arg(long)]
    pub missing_policy: Option<MissingPolicy>,

    /// How categorical predictors are identified
    #[arg(long, value_enum, default_value_t = ClassifierKind::Naming)]
    pub classifier: ClassifierKind,

    /// Name markers for the naming classifier (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub markers: Vec<String>,

    /// Categorical columns for the explicit classifier (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub categorical_columns: Vec<String>,

    /// Columns to drop before processing (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    /// Write a JSON binning report next to the outputs
    #[arg(long, default_value = "false")]
    pub report: bool,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Log pipeline decisions to stderr (overridden by RUST_LOG)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for a full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

/// Categorical identification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassifierKind {
    /// Column name contains a code/flag marker
    Naming,
    /// Column holds text, categorical or boolean values
    Dtype,
    /// Exactly the columns listed in --categorical-columns
    Explicit,
}

impl Cli {
    /// Build the pipeline configuration: defaults, then `--config`, then flags
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(target) = &self.target {
            config.target_label_column = target.clone();
        }
        set(&mut config.strategy, self.strategy);
        set(&mut config.seed, self.seed);
        set(&mut config.test_fraction, self.test_fraction);
        set(&mut config.encoding_metric, self.encoding_metric);

        let binning = &mut config.binning;
        set(&mut binning.thresholds.iv_min, self.iv_min);
        set(&mut binning.thresholds.gini_min, self.gini_min);
        set(&mut binning.thresholds.quality_min, self.quality_min);
        set(&mut binning.min_bins, self.min_bins);
        set(&mut binning.max_bins, self.max_bins);
        set(&mut binning.prebins, self.prebins);
        set(&mut binning.strategy, self.binning_strategy);
        set(&mut binning.min_prebin_size, self.min_prebin_size);
        set(&mut binning.min_category_samples, self.min_category_samples);
        set(&mut binning.max_pvalue, self.max_pvalue);
        set(&mut binning.monotonicity, self.monotonicity);
        set(&mut binning.optimizer, self.optimizer);
        set(&mut binning.invalid_predictor_policy, self.invalid_predictors);

        set(&mut config.pruning.correlation_threshold, self.correlation_threshold);
        set(&mut config.pruning.missing_policy, self.missing_policy);

        config.validate()?;
        Ok(config)
    }

    pub fn column_classifier(&self) -> Result<Box<dyn ColumnClassifier>> {
        Ok(match self.classifier {
            ClassifierKind::Naming if self.markers.is_empty() => Box::new(NamingConventionClassifier::default()),
            ClassifierKind::Naming => Box::new(NamingConventionClassifier::new(&self.markers)),
            ClassifierKind::Dtype => Box::new(DtypeClassifier),
            ClassifierKind::Explicit => {
                if self.categorical_columns.is_empty() {
                    anyhow::bail!("--classifier explicit needs --categorical-columns");
                }
                Box::new(ExplicitSchemaClassifier::new(self.categorical_columns.iter().cloned()))
            }
        })
    }

    /// Directory the outputs are written to
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            self.input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf()
        })
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
