//! rank_stats
#![deny(missing_docs)]

mod ranks;
mod spearman;
pub use ranks::average_ranks;
pub use spearman::spearman;
