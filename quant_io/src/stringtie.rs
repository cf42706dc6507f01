use crate::discover::{discover, DiscoveredSample, SampleIdStrategy};
use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use quant_types::{FeatureLevel, QuantError, RawQuantMatrix, SampleColumn, Tool, TxToGene};
use serde::Deserialize;
use std::path::Path;

/// File name of the per-sample StringTie transcript coverage table.
pub const CTAB_PATTERN: &str = "t_data.ctab";

/// One row of a `t_data.ctab`. StringTie reports per-base coverage and
/// FPKM, not read counts or TPM; counts are derived below and TPM by the
/// normalizer.
#[derive(Debug, Deserialize)]
struct CtabRow {
    t_name: String,
    length: f64,
    gene_id: String,
    cov: f64,
}

/// Load all StringTie coverage tables under `root` into a raw (counts and
/// lengths only) transcript-level table.
///
/// `read_length` is the sequencing read length in bases, required to turn
/// per-base coverage into a read count as `cov * length / read_length`. It
/// is not validated against the input files; a wrong value skews every
/// derived count, which is why it must be supplied explicitly.
pub fn load(
    root: &Path,
    read_length: u32,
    strategy: SampleIdStrategy,
) -> Result<RawQuantMatrix> {
    if read_length == 0 {
        return Err(QuantError::InvalidReadLength { value: read_length }.into());
    }
    let files = discover(root, CTAB_PATTERN, strategy)?;
    let columns: Vec<SampleColumn> = files
        .iter()
        .map(|file| read_sample(file, read_length))
        .try_collect()?;
    let matrix = RawQuantMatrix::from_samples(Tool::StringTie, FeatureLevel::Transcript, &columns)?;
    info!(
        "stringtie: loaded {} transcripts x {} samples (read length {read_length})",
        matrix.n_features(),
        matrix.n_samples()
    );
    Ok(matrix)
}

fn read_sample(file: &DiscoveredSample, read_length: u32) -> Result<SampleColumn> {
    let mut feature_ids = Vec::new();
    let mut counts = Vec::new();
    let mut lengths = Vec::new();
    for row in read_ctab(&file.path)? {
        counts.push(row.cov * row.length / f64::from(read_length));
        feature_ids.push(row.t_name);
        lengths.push(row.length);
    }
    Ok(SampleColumn {
        sample_id: file.sample_id.clone(),
        path: file.path.clone(),
        feature_ids,
        counts,
        abundance: None,
        lengths,
    })
}

/// Extract the transcript-to-gene map from a single coverage table. Any one
/// sample's table carries the full annotation, so the map is read once and
/// reused for gene-level aggregation of StringTie and Kallisto tables.
pub fn tx_to_gene(ctab: &Path) -> Result<TxToGene> {
    let pairs = read_ctab(ctab)?
        .into_iter()
        .map(|row| (row.t_name, row.gene_id));
    let map = TxToGene::from_pairs(pairs)?;
    info!("tx-to-gene: {} transcripts from {}", map.len(), ctab.display());
    Ok(map)
}

fn read_ctab(path: &Path) -> Result<Vec<CtabRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| path.display().to_string())?;
    rdr.deserialize()
        .map(|record| record.with_context(|| format!("parsing StringTie row in {}", path.display())))
        .try_collect()
}
