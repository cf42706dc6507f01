//! Loaders for the quantification outputs of RSEM, StringTie and Kallisto:
//! recursive file discovery with injectable sample-id extraction, TSV parsing
//! into dense feature-by-sample tables, and transcript-to-gene aggregation.

pub mod aggregate;
pub mod discover;
pub mod kallisto;
pub mod rsem;
pub mod stringtie;
