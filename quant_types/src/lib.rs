//! Shared data model for the quantification concordance pipeline: the
//! tool/level enumerations, the dense feature-by-sample matrices produced by
//! the loaders, the transcript-to-gene map used for gene-level aggregation,
//! and the error taxonomy every stage reports through.

mod errors;
mod matrix;
mod tx_to_gene;
mod types;

pub use errors::QuantError;
pub use matrix::{QuantMatrix, RawQuantMatrix, SampleColumn};
pub use tx_to_gene::TxToGene;
pub use types::{CorrelationRecord, FeatureLevel, Tool};
