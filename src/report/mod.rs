//! Report module - run summary and binning export

pub mod binning_export;
pub mod summary;

pub use binning_export::*;
pub use summary::*;
