use crate::errors::QuantError;
use crate::types::{FeatureLevel, Tool};
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;
use std::path::PathBuf;

/// One sample's worth of rows, parsed from a single quantification file.
/// Loaders produce these; the matrix constructors verify that every sample
/// reports the identical feature sequence before assembling the dense table.
#[derive(Debug, Clone)]
pub struct SampleColumn {
    pub sample_id: String,
    pub path: PathBuf,
    pub feature_ids: Vec<String>,
    pub counts: Vec<f64>,
    /// Native per-feature TPM, for tools that emit it. StringTie does not;
    /// its columns stay `None` until the normalizer has run.
    pub abundance: Option<Vec<f64>>,
    pub lengths: Vec<f64>,
}

struct Axes {
    feature_ids: Vec<String>,
    feature_index: HashMap<String, usize>,
    sample_ids: Vec<String>,
    sample_index: HashMap<String, usize>,
}

impl std::fmt::Debug for Axes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Axes")
            .field("features", &self.feature_ids.len())
            .field("samples", &self.sample_ids.len())
            .finish()
    }
}

fn index_of(ids: &[String]) -> HashMap<String, usize> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i))
        .collect()
}

/// Verify cross-sample consistency and build the shared axes plus the dense
/// counts/lengths (and abundance, when every column carries it) layers.
fn assemble(
    columns: &[SampleColumn],
) -> Result<(Axes, Array2<f64>, Array2<f64>, Option<Array2<f64>>), QuantError> {
    assert!(!columns.is_empty(), "assemble called with no sample columns");

    let first = &columns[0];
    let n_features = first.feature_ids.len();

    let mut seen_features: HashMap<&str, usize> = HashMap::with_capacity(n_features);
    for (i, id) in first.feature_ids.iter().enumerate() {
        if seen_features.insert(id.as_str(), i).is_some() {
            return Err(QuantError::DuplicateFeatureId {
                feature: id.clone(),
                path: first.path.clone(),
            });
        }
    }
    let feature_index = index_of(&first.feature_ids);

    let mut seen_samples: HashMap<&str, &PathBuf> = HashMap::new();
    for col in columns {
        assert_eq!(col.counts.len(), col.feature_ids.len());
        assert_eq!(col.lengths.len(), col.feature_ids.len());
        if let Some(abundance) = &col.abundance {
            assert_eq!(abundance.len(), col.feature_ids.len());
        }
        if let Some(first_path) = seen_samples.insert(col.sample_id.as_str(), &col.path) {
            return Err(QuantError::DuplicateSampleId {
                sample: col.sample_id.clone(),
                first: first_path.clone(),
                second: col.path.clone(),
            });
        }
    }

    for col in &columns[1..] {
        if col.feature_ids.len() != n_features {
            return Err(QuantError::InconsistentFeatureSet {
                sample: col.sample_id.clone(),
                path: col.path.clone(),
                first_sample: first.sample_id.clone(),
                detail: format!(
                    "expected {n_features} features, found {}",
                    col.feature_ids.len()
                ),
            });
        }
        if let Some(row) = (0..n_features).find(|&i| col.feature_ids[i] != first.feature_ids[i]) {
            return Err(QuantError::InconsistentFeatureSet {
                sample: col.sample_id.clone(),
                path: col.path.clone(),
                first_sample: first.sample_id.clone(),
                detail: format!(
                    "first difference at row {row}: expected '{}', found '{}'",
                    first.feature_ids[row], col.feature_ids[row]
                ),
            });
        }
    }

    let n_samples = columns.len();
    let mut counts = Array2::zeros((n_features, n_samples));
    let mut lengths = Array2::zeros((n_features, n_samples));
    let all_abundance = columns.iter().all(|c| c.abundance.is_some());
    let mut abundance = all_abundance.then(|| Array2::zeros((n_features, n_samples)));
    for (j, col) in columns.iter().enumerate() {
        counts
            .column_mut(j)
            .assign(&ArrayView1::from(&col.counts[..]));
        lengths
            .column_mut(j)
            .assign(&ArrayView1::from(&col.lengths[..]));
        if let (Some(dst), Some(src)) = (abundance.as_mut(), col.abundance.as_ref()) {
            dst.column_mut(j).assign(&ArrayView1::from(&src[..]));
        }
    }

    let sample_ids: Vec<String> = columns.iter().map(|c| c.sample_id.clone()).collect();
    let sample_index = index_of(&sample_ids);
    Ok((
        Axes {
            feature_ids: first.feature_ids.clone(),
            feature_index,
            sample_ids,
            sample_index,
        },
        counts,
        lengths,
        abundance,
    ))
}

/// A dense feature-by-sample table without abundance values: counts and
/// feature lengths only. This is what the StringTie loader produces; the
/// normalizer consumes it and returns a finished [`QuantMatrix`].
#[derive(Debug)]
pub struct RawQuantMatrix {
    tool: Tool,
    level: FeatureLevel,
    axes: Axes,
    counts: Array2<f64>,
    lengths: Array2<f64>,
}

impl RawQuantMatrix {
    pub fn from_samples(
        tool: Tool,
        level: FeatureLevel,
        columns: &[SampleColumn],
    ) -> Result<RawQuantMatrix, QuantError> {
        let (axes, counts, lengths, _) = assemble(columns)?;
        Ok(RawQuantMatrix {
            tool,
            level,
            axes,
            counts,
            lengths,
        })
    }

    pub fn from_dense(
        tool: Tool,
        level: FeatureLevel,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        counts: Array2<f64>,
        lengths: Array2<f64>,
    ) -> RawQuantMatrix {
        assert_eq!(counts.dim(), lengths.dim());
        RawQuantMatrix {
            tool,
            level,
            axes: dense_axes(feature_ids, sample_ids, counts.dim()),
            counts,
            lengths,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn level(&self) -> FeatureLevel {
        self.level
    }

    pub fn n_features(&self) -> usize {
        self.axes.feature_ids.len()
    }

    pub fn n_samples(&self) -> usize {
        self.axes.sample_ids.len()
    }

    pub fn feature_ids(&self) -> &[String] {
        &self.axes.feature_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.axes.sample_ids
    }

    pub fn counts(&self) -> &Array2<f64> {
        &self.counts
    }

    pub fn lengths(&self) -> &Array2<f64> {
        &self.lengths
    }
}

fn dense_axes(feature_ids: Vec<String>, sample_ids: Vec<String>, dim: (usize, usize)) -> Axes {
    assert_eq!(dim, (feature_ids.len(), sample_ids.len()));
    let feature_index = index_of(&feature_ids);
    let sample_index = index_of(&sample_ids);
    debug_assert_eq!(feature_index.len(), feature_ids.len());
    debug_assert_eq!(sample_index.len(), sample_ids.len());
    Axes {
        feature_ids,
        feature_index,
        sample_ids,
        sample_index,
    }
}

/// A finished quantification table: dense feature-by-sample layers for
/// counts, abundance (TPM) and feature length, with identifier indexes on
/// both axes. Immutable once constructed; downstream stages only read it.
#[derive(Debug)]
pub struct QuantMatrix {
    tool: Tool,
    level: FeatureLevel,
    axes: Axes,
    counts: Array2<f64>,
    abundance: Array2<f64>,
    lengths: Array2<f64>,
}

impl QuantMatrix {
    /// Assemble a table from per-sample columns of a tool that reports TPM
    /// natively. Every column must carry abundance values.
    pub fn from_samples(
        tool: Tool,
        level: FeatureLevel,
        columns: &[SampleColumn],
    ) -> Result<QuantMatrix, QuantError> {
        let (axes, counts, lengths, abundance) = assemble(columns)?;
        let abundance = abundance.expect("native-TPM loader produced a column without abundance");
        Ok(QuantMatrix {
            tool,
            level,
            axes,
            counts,
            abundance,
            lengths,
        })
    }

    /// Finish a raw table with the abundance layer the normalizer computed.
    pub fn from_raw(raw: RawQuantMatrix, abundance: Array2<f64>) -> QuantMatrix {
        assert_eq!(raw.counts.dim(), abundance.dim());
        QuantMatrix {
            tool: raw.tool,
            level: raw.level,
            axes: raw.axes,
            counts: raw.counts,
            abundance,
            lengths: raw.lengths,
        }
    }

    pub fn from_dense(
        tool: Tool,
        level: FeatureLevel,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        counts: Array2<f64>,
        abundance: Array2<f64>,
        lengths: Array2<f64>,
    ) -> QuantMatrix {
        assert_eq!(counts.dim(), abundance.dim());
        assert_eq!(counts.dim(), lengths.dim());
        QuantMatrix {
            tool,
            level,
            axes: dense_axes(feature_ids, sample_ids, counts.dim()),
            counts,
            abundance,
            lengths,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn level(&self) -> FeatureLevel {
        self.level
    }

    pub fn n_features(&self) -> usize {
        self.axes.feature_ids.len()
    }

    pub fn n_samples(&self) -> usize {
        self.axes.sample_ids.len()
    }

    pub fn feature_ids(&self) -> &[String] {
        &self.axes.feature_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.axes.sample_ids
    }

    pub fn feature_row(&self, feature_id: &str) -> Option<usize> {
        self.axes.feature_index.get(feature_id).copied()
    }

    pub fn sample_col(&self, sample_id: &str) -> Option<usize> {
        self.axes.sample_index.get(sample_id).copied()
    }

    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.axes.sample_index.contains_key(sample_id)
    }

    pub fn counts(&self) -> &Array2<f64> {
        &self.counts
    }

    pub fn abundance(&self) -> &Array2<f64> {
        &self.abundance
    }

    pub fn lengths(&self) -> &Array2<f64> {
        &self.lengths
    }

    /// Abundance (TPM) values of one sample, in feature-row order.
    pub fn abundance_column(&self, sample_id: &str) -> Option<ArrayView1<'_, f64>> {
        self.sample_col(sample_id).map(|j| self.abundance.column(j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(sample: &str, features: &[&str], counts: &[f64]) -> SampleColumn {
        SampleColumn {
            sample_id: sample.to_string(),
            path: PathBuf::from(format!("{sample}.results")),
            feature_ids: features.iter().map(ToString::to_string).collect(),
            counts: counts.to_vec(),
            abundance: Some(counts.to_vec()),
            lengths: vec![1000.0; features.len()],
        }
    }

    #[test]
    fn assembles_dense_matrix_in_column_order() {
        let m = QuantMatrix::from_samples(
            Tool::Kallisto,
            FeatureLevel::Transcript,
            &[
                column("s1", &["t1", "t2"], &[1.0, 2.0]),
                column("s2", &["t1", "t2"], &[3.0, 4.0]),
            ],
        )
        .unwrap();
        assert_eq!(m.n_features(), 2);
        assert_eq!(m.n_samples(), 2);
        assert_eq!(m.counts()[[1, 0]], 2.0);
        assert_eq!(m.counts()[[0, 1]], 3.0);
        assert_eq!(m.sample_col("s2"), Some(1));
        assert_eq!(m.feature_row("t2"), Some(1));
        assert_eq!(
            m.abundance_column("s1").unwrap().to_vec(),
            vec![1.0, 2.0]
        );
    }

    #[test]
    fn rejects_mismatched_feature_sets() {
        let err = QuantMatrix::from_samples(
            Tool::Kallisto,
            FeatureLevel::Transcript,
            &[
                column("s1", &["t1", "t2"], &[1.0, 2.0]),
                column("s2", &["t1", "t3"], &[3.0, 4.0]),
            ],
        )
        .unwrap_err();
        match err {
            QuantError::InconsistentFeatureSet { sample, detail, .. } => {
                assert_eq!(sample, "s2");
                assert!(detail.contains("t3"), "{detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_sample_ids() {
        let err = QuantMatrix::from_samples(
            Tool::Kallisto,
            FeatureLevel::Transcript,
            &[
                column("s1", &["t1"], &[1.0]),
                column("s1", &["t1"], &[2.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, QuantError::DuplicateSampleId { .. }));
    }

    #[test]
    fn rejects_duplicate_feature_ids() {
        let err = QuantMatrix::from_samples(
            Tool::StringTie,
            FeatureLevel::Transcript,
            &[column("s1", &["t1", "t1"], &[1.0, 2.0])],
        )
        .unwrap_err();
        assert!(matches!(err, QuantError::DuplicateFeatureId { .. }));
    }
}
