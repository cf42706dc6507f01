use itertools::Itertools;
use log::info;
use quant_types::{CorrelationRecord, QuantError, QuantMatrix};
use rank_stats::spearman;
use rayon::prelude::*;

/// A labelled quantification table entering a comparison.
pub struct Source<'a> {
    pub label: String,
    pub matrix: &'a QuantMatrix,
}

impl<'a> Source<'a> {
    pub fn new(label: impl Into<String>, matrix: &'a QuantMatrix) -> Source<'a> {
        Source {
            label: label.into(),
            matrix,
        }
    }
}

/// Compute the Spearman coefficient for every (sample, unordered source
/// pair) combination over the features shared by all sources.
///
/// Columns are aligned by exact sample identifier, never by position: every
/// source must cover exactly the same samples, and the comparison fails
/// loudly on the first identifier present in one table and absent in
/// another. The per-sample loop is a pure map over read-only tables and
/// runs in parallel.
pub fn correlate(sources: &[Source<'_>]) -> Result<Vec<CorrelationRecord>, QuantError> {
    assert!(sources.len() >= 2, "comparing fewer than two sources");

    for (a, b) in sources.iter().tuple_combinations() {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(sample) = from
                .matrix
                .sample_ids()
                .iter()
                .find(|sample| !to.matrix.has_sample(sample))
            {
                return Err(QuantError::SampleMismatch {
                    sample: sample.clone(),
                    present_in: from.label.clone(),
                    missing_from: to.label.clone(),
                });
            }
        }
    }

    // Tables are dense, so the shared feature set is the same for every
    // sample and can be resolved once, in first-source row order.
    let first = &sources[0];
    let shared: Vec<&String> = first
        .matrix
        .feature_ids()
        .iter()
        .filter(|id| {
            sources[1..]
                .iter()
                .all(|s| s.matrix.feature_row(id).is_some())
        })
        .collect();
    if shared.is_empty() {
        return Err(QuantError::EmptyIntersection {
            sources: sources.iter().map(|s| s.label.as_str()).join(", "),
        });
    }
    info!(
        "comparing {} sources over {} shared features and {} samples",
        sources.len(),
        shared.len(),
        first.matrix.n_samples()
    );

    let rows: Vec<Vec<usize>> = sources
        .iter()
        .map(|s| {
            shared
                .iter()
                .map(|id| s.matrix.feature_row(id).expect("intersection checked"))
                .collect()
        })
        .collect();

    let records = first
        .matrix
        .sample_ids()
        .par_iter()
        .flat_map_iter(|sample| per_sample(sources, &rows, sample))
        .collect();
    Ok(records)
}

fn per_sample(
    sources: &[Source<'_>],
    rows: &[Vec<usize>],
    sample: &str,
) -> Vec<CorrelationRecord> {
    let vectors: Vec<Vec<f64>> = sources
        .iter()
        .zip(rows)
        .map(|(s, rows)| {
            let col = s
                .matrix
                .abundance_column(sample)
                .expect("sample coverage checked");
            rows.iter().map(|&i| col[i]).collect()
        })
        .collect();

    (0..sources.len())
        .tuple_combinations()
        .map(|(i, j)| CorrelationRecord {
            sample: sample.to_string(),
            source_a: sources[i].label.clone(),
            source_b: sources[j].label.clone(),
            rho: spearman(&vectors[i], &vectors[j]),
        })
        .collect()
}

/// Abundance vectors of one sample in two tables, aligned over their shared
/// features (in the first table's row order). Used for the pipeline-vs-
/// pipeline scatterplots.
pub fn aligned_abundance(
    a: &QuantMatrix,
    b: &QuantMatrix,
    sample: &str,
) -> Result<(Vec<f64>, Vec<f64>), QuantError> {
    for (present, missing) in [(a, b), (b, a)] {
        if !missing.has_sample(sample) {
            return Err(QuantError::SampleMismatch {
                sample: sample.to_string(),
                present_in: present.tool().to_string(),
                missing_from: missing.tool().to_string(),
            });
        }
    }
    let col_a = a.abundance_column(sample).expect("coverage checked above");
    let col_b = b.abundance_column(sample).expect("coverage checked above");

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (i, id) in a.feature_ids().iter().enumerate() {
        if let Some(row_b) = b.feature_row(id) {
            xs.push(col_a[i]);
            ys.push(col_b[row_b]);
        }
    }
    if xs.is_empty() {
        return Err(QuantError::EmptyIntersection {
            sources: format!("{}, {}", a.tool(), b.tool()),
        });
    }
    Ok((xs, ys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use pretty_assertions::assert_eq;
    use quant_types::{FeatureLevel, Tool};

    const TOL: f64 = 1e-12;

    fn matrix(tool: Tool, features: &[&str], samples: &[&str], abundance: Array2<f64>) -> QuantMatrix {
        let counts = abundance.clone();
        let lengths = Array2::from_elem(abundance.dim(), 1000.0);
        QuantMatrix::from_dense(
            tool,
            FeatureLevel::Gene,
            features.iter().map(ToString::to_string).collect(),
            samples.iter().map(ToString::to_string).collect(),
            counts,
            abundance,
            lengths,
        )
    }

    fn rho_of<'r>(
        records: &'r [CorrelationRecord],
        sample: &str,
        a: &str,
        b: &str,
    ) -> &'r CorrelationRecord {
        records
            .iter()
            .find(|r| {
                r.sample == sample
                    && ((r.source_a == a && r.source_b == b)
                        || (r.source_a == b && r.source_b == a))
            })
            .unwrap()
    }

    #[test]
    fn hand_computed_coefficients_are_reproduced() {
        let genes = ["g1", "g2", "g3", "g4", "g5"];
        let samples = ["s1", "s2"];
        // s1 columns have a known rank structure; s2 agrees everywhere
        let rsem = matrix(
            Tool::Rsem,
            &genes,
            &samples,
            ndarray::array![
                [100.0, 10.0],
                [200.0, 20.0],
                [300.0, 30.0],
                [400.0, 40.0],
                [500.0, 50.0]
            ],
        );
        let kallisto = matrix(
            Tool::Kallisto,
            &genes,
            &samples,
            ndarray::array![
                [200.0, 1.0],
                [100.0, 2.0],
                [400.0, 3.0],
                [300.0, 4.0],
                [500.0, 5.0]
            ],
        );
        let stringtie = matrix(
            Tool::StringTie,
            &genes,
            &samples,
            ndarray::array![
                [500.0, 2.0],
                [400.0, 4.0],
                [300.0, 6.0],
                [200.0, 8.0],
                [100.0, 10.0]
            ],
        );

        let records = correlate(&[
            Source::new("rsem", &rsem),
            Source::new("stringtie", &stringtie),
            Source::new("kallisto", &kallisto),
        ])
        .unwrap();
        assert_eq!(records.len(), 6);

        // d^2 sums: rsem/kallisto 4 -> 0.8; rsem/stringtie reversed -> -1;
        // stringtie/kallisto 36 -> -0.8
        assert!((rho_of(&records, "s1", "rsem", "kallisto").rho - 0.8).abs() < TOL);
        assert!((rho_of(&records, "s1", "rsem", "stringtie").rho + 1.0).abs() < TOL);
        assert!((rho_of(&records, "s1", "stringtie", "kallisto").rho + 0.8).abs() < TOL);
        // s2 ranks agree across all tools
        assert!((rho_of(&records, "s2", "rsem", "kallisto").rho - 1.0).abs() < TOL);
        assert!((rho_of(&records, "s2", "rsem", "stringtie").rho - 1.0).abs() < TOL);
    }

    #[test]
    fn correlation_is_symmetric_in_source_order() {
        let a = matrix(
            Tool::Rsem,
            &["g1", "g2", "g3"],
            &["s1"],
            ndarray::array![[1.0], [5.0], [3.0]],
        );
        let b = matrix(
            Tool::Kallisto,
            &["g1", "g2", "g3"],
            &["s1"],
            ndarray::array![[2.0], [1.0], [9.0]],
        );
        let fwd = correlate(&[Source::new("a", &a), Source::new("b", &b)]).unwrap();
        let rev = correlate(&[Source::new("b", &b), Source::new("a", &a)]).unwrap();
        assert!((fwd[0].rho - rev[0].rho).abs() < TOL);
    }

    #[test]
    fn restricts_to_the_shared_feature_set() {
        // g9 exists only in `a` and carries a wild value; it must not
        // influence the coefficient
        let a = matrix(
            Tool::Rsem,
            &["g1", "g2", "g9", "g3"],
            &["s1"],
            ndarray::array![[1.0], [2.0], [1e9], [3.0]],
        );
        let b = matrix(
            Tool::Kallisto,
            &["g1", "g2", "g3"],
            &["s1"],
            ndarray::array![[10.0], [20.0], [30.0]],
        );
        let records = correlate(&[Source::new("a", &a), Source::new("b", &b)]).unwrap();
        assert!((records[0].rho - 1.0).abs() < TOL);
    }

    #[test]
    fn disjoint_feature_sets_fail_rather_than_report_nan() {
        let a = matrix(
            Tool::Rsem,
            &["g1", "g2"],
            &["s1"],
            ndarray::array![[1.0], [2.0]],
        );
        let b = matrix(
            Tool::Kallisto,
            &["h1", "h2"],
            &["s1"],
            ndarray::array![[1.0], [2.0]],
        );
        let err = correlate(&[Source::new("a", &a), Source::new("b", &b)]).unwrap_err();
        assert!(matches!(err, QuantError::EmptyIntersection { .. }));
    }

    #[test]
    fn missing_sample_in_either_direction_is_detected() {
        let a = matrix(
            Tool::Rsem,
            &["g1"],
            &["s1", "s2"],
            ndarray::array![[1.0, 2.0]],
        );
        let b = matrix(Tool::Kallisto, &["g1"], &["s1"], ndarray::array![[1.0]]);
        let err = correlate(&[Source::new("a", &a), Source::new("b", &b)]).unwrap_err();
        match err {
            QuantError::SampleMismatch {
                sample,
                present_in,
                missing_from,
            } => {
                assert_eq!(sample, "s2");
                assert_eq!(present_in, "a");
                assert_eq!(missing_from, "b");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = correlate(&[Source::new("b", &b), Source::new("a", &a)]).unwrap_err();
        assert!(matches!(err, QuantError::SampleMismatch { .. }));
    }

    #[test]
    fn aligned_abundance_pairs_values_by_feature_id() {
        let a = matrix(
            Tool::Rsem,
            &["g1", "g2", "g3"],
            &["s1"],
            ndarray::array![[1.0], [2.0], [3.0]],
        );
        // same features, different row order
        let b = matrix(
            Tool::Kallisto,
            &["g3", "g1", "g2"],
            &["s1"],
            ndarray::array![[30.0], [10.0], [20.0]],
        );
        let (xs, ys) = aligned_abundance(&a, &b, "s1").unwrap();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(ys, vec![10.0, 20.0, 30.0]);
    }
}
