//! Analytical core of the quantification comparison: TPM normalization for
//! tools that do not emit it, per-sample Spearman comparison across tools,
//! and the end-to-end batch runner the binary wraps.

pub mod compare;
pub mod normalize;
pub mod run;
