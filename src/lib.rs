//! riskprep: credit-risk preprocessing
//!
//! Splits a loan-level dataset into train and test, fits optimal WoE binning
//! on train, encodes both partitions with the fitted bins and prunes
//! correlated predictors, without letting test data reach any fitted
//! artifact.

pub mod cli;
pub mod diagnostics;
pub mod pipeline;
pub mod report;
pub mod utils;
