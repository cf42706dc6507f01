use crate::discover::{discover, DiscoveredSample, SampleIdStrategy};
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use log::info;
use quant_types::{FeatureLevel, QuantMatrix, SampleColumn, Tool};
use serde::Deserialize;
use std::path::Path;

/// File-name pattern of RSEM per-sample result files at a given level.
pub fn pattern(level: FeatureLevel) -> &'static str {
    match level {
        FeatureLevel::Gene => "*.genes.results",
        FeatureLevel::Transcript => "*.isoforms.results",
    }
}

/// One row of an RSEM result file. Gene files key rows by `gene_id`,
/// isoform files by `transcript_id`; RSEM reports TPM natively.
#[derive(Debug, Deserialize)]
struct RsemRow {
    gene_id: Option<String>,
    transcript_id: Option<String>,
    length: f64,
    expected_count: f64,
    #[serde(rename = "TPM")]
    tpm: f64,
}

/// Load all RSEM result files under `root` into one table. No
/// normalization is applied; the reported TPM column is used as-is.
pub fn load(root: &Path, level: FeatureLevel, strategy: SampleIdStrategy) -> Result<QuantMatrix> {
    let files = discover(root, pattern(level), strategy)?;
    let columns: Vec<SampleColumn> = files
        .iter()
        .map(|file| read_sample(file, level))
        .try_collect()?;
    let matrix = QuantMatrix::from_samples(Tool::Rsem, level, &columns)?;
    info!(
        "rsem: loaded {} {level}s x {} samples",
        matrix.n_features(),
        matrix.n_samples()
    );
    Ok(matrix)
}

fn read_sample(file: &DiscoveredSample, level: FeatureLevel) -> Result<SampleColumn> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(&file.path)
        .with_context(|| file.path.display().to_string())?;

    let mut feature_ids = Vec::new();
    let mut counts = Vec::new();
    let mut abundance = Vec::new();
    let mut lengths = Vec::new();
    for record in rdr.deserialize() {
        let row: RsemRow =
            record.with_context(|| format!("parsing RSEM row in {}", file.path.display()))?;
        let id = match level {
            FeatureLevel::Gene => row.gene_id,
            FeatureLevel::Transcript => row.transcript_id,
        };
        let Some(id) = id else {
            bail!(
                "{} has no {} column; it does not look like an RSEM {} file",
                file.path.display(),
                match level {
                    FeatureLevel::Gene => "gene_id",
                    FeatureLevel::Transcript => "transcript_id",
                },
                pattern(level),
            );
        };
        feature_ids.push(id);
        counts.push(row.expected_count);
        abundance.push(row.tpm);
        lengths.push(row.length);
    }

    Ok(SampleColumn {
        sample_id: file.sample_id.clone(),
        path: file.path.clone(),
        feature_ids,
        counts,
        abundance: Some(abundance),
        lengths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quant_types::QuantError;
    use std::fs;

    const GENES_HEADER: &str =
        "gene_id\ttranscript_id(s)\tlength\teffective_length\texpected_count\tTPM\tFPKM\n";

    fn write_genes_file(dir: &Path, sample: &str, rows: &[(&str, f64, f64, f64)]) {
        let mut body = GENES_HEADER.to_string();
        for (gene, length, count, tpm) in rows {
            body.push_str(&format!(
                "{gene}\t{gene}.1\t{length}\t{length}\t{count}\t{tpm}\t0.0\n"
            ));
        }
        fs::write(dir.join(format!("{sample}_rsem.genes.results")), body).unwrap();
    }

    #[test]
    fn loads_gene_level_results() {
        let dir = tempfile::tempdir().unwrap();
        write_genes_file(
            dir.path(),
            "s1",
            &[("g1", 1000.0, 10.0, 400000.0), ("g2", 2000.0, 30.0, 600000.0)],
        );
        write_genes_file(
            dir.path(),
            "s2",
            &[("g1", 1000.0, 5.0, 250000.0), ("g2", 2000.0, 45.0, 750000.0)],
        );

        let m = load(dir.path(), FeatureLevel::Gene, SampleIdStrategy::StemPrefix).unwrap();
        assert_eq!(m.tool(), Tool::Rsem);
        assert_eq!(m.feature_ids(), ["g1", "g2"]);
        assert_eq!(m.sample_ids(), ["s1", "s2"]);
        assert_eq!(m.counts()[[1, 1]], 45.0);
        assert_eq!(m.abundance_column("s1").unwrap()[0], 400000.0);
        assert_eq!(m.lengths()[[1, 0]], 2000.0);
    }

    #[test]
    fn mismatched_annotations_across_samples_fail() {
        let dir = tempfile::tempdir().unwrap();
        write_genes_file(dir.path(), "s1", &[("g1", 1000.0, 10.0, 1e6)]);
        write_genes_file(dir.path(), "s2", &[("g9", 1000.0, 10.0, 1e6)]);
        let err = load(dir.path(), FeatureLevel::Gene, SampleIdStrategy::StemPrefix).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QuantError>(),
            Some(QuantError::InconsistentFeatureSet { .. })
        ));
    }

    #[test]
    fn isoform_files_key_rows_by_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let body = "transcript_id\tgene_id\tlength\teffective_length\texpected_count\tTPM\tFPKM\tIsoPct\n\
                    t1\tg1\t500\t400\t7\t1e6\t0\t100.0\n";
        fs::write(dir.path().join("s1_rsem.isoforms.results"), body).unwrap();
        let m = load(
            dir.path(),
            FeatureLevel::Transcript,
            SampleIdStrategy::StemPrefix,
        )
        .unwrap();
        assert_eq!(m.feature_ids(), ["t1"]);
        assert_eq!(m.counts()[[0, 0]], 7.0);
    }
}
