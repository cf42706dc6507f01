use crate::discover::{discover, DiscoveredSample, SampleIdStrategy};
use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use quant_types::{FeatureLevel, QuantMatrix, SampleColumn, Tool};
use serde::Deserialize;
use std::path::Path;

/// File name of the per-sample Kallisto abundance table.
pub const ABUNDANCE_PATTERN: &str = "abundance.tsv";

#[derive(Debug, Deserialize)]
struct AbundanceRow {
    target_id: String,
    length: f64,
    est_counts: f64,
    tpm: f64,
}

/// Load all Kallisto abundance tables under `root` into one transcript-level
/// table. Kallisto reports both estimated counts and TPM natively.
pub fn load(root: &Path, strategy: SampleIdStrategy) -> Result<QuantMatrix> {
    let files = discover(root, ABUNDANCE_PATTERN, strategy)?;
    let columns: Vec<SampleColumn> = files.iter().map(read_sample).try_collect()?;
    let matrix = QuantMatrix::from_samples(Tool::Kallisto, FeatureLevel::Transcript, &columns)?;
    info!(
        "kallisto: loaded {} transcripts x {} samples",
        matrix.n_features(),
        matrix.n_samples()
    );
    Ok(matrix)
}

fn read_sample(file: &DiscoveredSample) -> Result<SampleColumn> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(&file.path)
        .with_context(|| file.path.display().to_string())?;

    let mut feature_ids = Vec::new();
    let mut counts = Vec::new();
    let mut abundance = Vec::new();
    let mut lengths = Vec::new();
    for record in rdr.deserialize() {
        let row: AbundanceRow =
            record.with_context(|| format!("parsing Kallisto row in {}", file.path.display()))?;
        feature_ids.push(row.target_id);
        counts.push(row.est_counts);
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
