use itertools::Itertools;
use log::info;
use ndarray::Array2;
use quant_types::{FeatureLevel, QuantError, QuantMatrix, RawQuantMatrix, TxToGene};
use std::collections::HashMap;

/// Resolve every transcript row to a gene row. Gene rows are ordered by
/// sorted gene identifier so aggregated tables are deterministic regardless
/// of transcript order in the source files.
fn gene_assignment(
    feature_ids: &[String],
    map: &TxToGene,
) -> Result<(Vec<String>, Vec<usize>), QuantError> {
    let genes_per_tx: Vec<String> = feature_ids
        .iter()
        .map(|transcript| {
            map.gene(transcript)
                .map(String::from)
                .ok_or_else(|| QuantError::UnmappedTranscript {
                    transcript: transcript.clone(),
                    map_len: map.len(),
                })
        })
        .try_collect()?;

    let gene_ids: Vec<String> = genes_per_tx.iter().cloned().sorted().dedup().collect();
    let index: HashMap<&str, usize> = gene_ids
        .iter()
        .enumerate()
        .map(|(i, gene)| (gene.as_str(), i))
        .collect();
    let assignment = genes_per_tx
        .iter()
        .map(|gene| index[gene.as_str()])
        .collect();
    Ok((gene_ids, assignment))
}

fn sum_rows(src: &Array2<f64>, assignment: &[usize], n_genes: usize) -> Array2<f64> {
    let mut out = Array2::zeros((n_genes, src.ncols()));
    for (t_row, &g_row) in assignment.iter().enumerate() {
        for j in 0..src.ncols() {
            out[[g_row, j]] += src[[t_row, j]];
        }
    }
    out
}

/// Aggregate a transcript-level table with native TPM to gene level: counts,
/// lengths and abundance are all summed per gene. Summing native TPM is
/// valid because TPM is already depth-normalized, so the per-sample
/// million-sum is preserved.
pub fn to_gene_level(m: &QuantMatrix, map: &TxToGene) -> Result<QuantMatrix, QuantError> {
    assert_eq!(m.level(), FeatureLevel::Transcript);
    let (gene_ids, assignment) = gene_assignment(m.feature_ids(), map)?;
    let n_genes = gene_ids.len();
    info!(
        "{}: aggregating {} transcripts into {n_genes} genes",
        m.tool(),
        m.n_features()
    );
    Ok(QuantMatrix::from_dense(
        m.tool(),
        FeatureLevel::Gene,
        gene_ids,
        m.sample_ids().to_vec(),
        sum_rows(m.counts(), &assignment, n_genes),
        sum_rows(m.abundance(), &assignment, n_genes),
        sum_rows(m.lengths(), &assignment, n_genes),
    ))
}

/// Aggregate a raw (no abundance yet) transcript-level table to gene level.
/// The result is still raw: gene-level TPM is re-derived by the normalizer
/// from the summed counts and lengths.
pub fn to_gene_level_raw(
    m: &RawQuantMatrix,
    map: &TxToGene,
) -> Result<RawQuantMatrix, QuantError> {
    assert_eq!(m.level(), FeatureLevel::Transcript);
    let (gene_ids, assignment) = gene_assignment(m.feature_ids(), map)?;
    let n_genes = gene_ids.len();
    info!(
        "{}: aggregating {} transcripts into {n_genes} genes",
        m.tool(),
        m.n_features()
    );
    Ok(RawQuantMatrix::from_dense(
        m.tool(),
        FeatureLevel::Gene,
        gene_ids,
        m.sample_ids().to_vec(),
        sum_rows(m.counts(), &assignment, n_genes),
        sum_rows(m.lengths(), &assignment, n_genes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use quant_types::Tool;

    fn tx_matrix() -> QuantMatrix {
        QuantMatrix::from_dense(
            Tool::Kallisto,
            FeatureLevel::Transcript,
            vec!["t1".to_string(), "t2".to_string(), "t3".to_string()],
            vec!["s1".to_string(), "s2".to_string()],
            array![[1.0, 10.0], [2.0, 20.0], [4.0, 40.0]],
            array![[0.1, 0.5], [0.2, 0.25], [0.7, 0.25]],
            array![[100.0, 100.0], [200.0, 200.0], [300.0, 300.0]],
        )
    }

    fn map() -> TxToGene {
        TxToGene::from_pairs([
            ("t1".to_string(), "gB".to_string()),
            ("t2".to_string(), "gB".to_string()),
            ("t3".to_string(), "gA".to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn sums_counts_lengths_and_abundance_per_gene() {
        let g = to_gene_level(&tx_matrix(), &map()).unwrap();
        assert_eq!(g.level(), FeatureLevel::Gene);
        // gene rows are sorted by identifier
        assert_eq!(g.feature_ids(), ["gA", "gB"]);
        assert_eq!(g.counts()[[0, 0]], 4.0);
        assert_eq!(g.counts()[[1, 0]], 3.0);
        assert_eq!(g.counts()[[1, 1]], 30.0);
        assert_eq!(g.abundance()[[1, 1]], 0.75);
        assert_eq!(g.lengths()[[1, 0]], 300.0);
    }

    #[test]
    fn unmapped_transcript_is_fatal() {
        let partial = TxToGene::from_pairs([("t1".to_string(), "gB".to_string())]).unwrap();
        let err = to_gene_level(&tx_matrix(), &partial).unwrap_err();
        match err {
            QuantError::UnmappedTranscript { transcript, .. } => assert_eq!(transcript, "t2"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
