use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The external quantifier that produced a table. Each tool has its own
/// on-disk format and its own feature-identifier namespace.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tool {
    Rsem,
    StringTie,
    Kallisto,
}

/// Aggregation level of the feature axis of a quantification table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeatureLevel {
    Gene,
    Transcript,
}

/// One Spearman coefficient: a single sample, a single unordered pair of
/// quantification sources, restricted to their shared features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub sample: String,
    pub source_a: String,
    pub source_b: String,
    pub rho: f64,
}

impl CorrelationRecord {
    /// Stable label for the unordered source pair, e.g. `kallisto_vs_rsem`.
    pub fn pair_label(&self) -> String {
        if self.source_a <= self.source_b {
            format!("{}_vs_{}", self.source_a, self.source_b)
        } else {
            format!("{}_vs_{}", self.source_b, self.source_a)
        }
    }
}
