//! Pipeline module - split, bin, encode and prune a credit-risk dataset

pub mod binning;
pub mod config;
pub mod correlation;
pub mod dummy;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod missing;
pub mod roles;
pub mod runner;
pub mod solver;
pub mod split;
pub mod stats;
pub mod target;

pub use binning::{BinningProcess, BinningStrategy, FeatureBinning, FeatureType, RejectedPredictor};
pub use config::*;
pub use correlation::{CorrelatedPair, CorrelationFilter, DroppedPredictor};
pub use dummy::expand_indicators;
pub use error::{PipelineError, Result};
pub use fingerprint::FrameFingerprint;
pub use loader::*;
pub use missing::*;
pub use roles::*;
pub use runner::{run_pipeline, PreparedData, StageTimings};
pub use solver::{MonotonicityConstraint, SolverConfig};
pub use split::{split_train_test, TrainTestSplit};
pub use target::*;
