use crate::compare::{aligned_abundance, correlate, Source};
use crate::normalize;
use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use quant_io::discover::{discover, SampleIdStrategy};
use quant_io::{aggregate, kallisto, rsem, stringtie};
use quant_types::{CorrelationRecord, FeatureLevel, Tool};
use quant_websummary::{correlation_boxplot, log1p_scatter, SummaryTable};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one batch invocation needs. Deserializable from a JSON file
/// for the binary; constructed directly when driven in-process.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub rsem_dir: PathBuf,
    pub stringtie_dir: PathBuf,
    pub kallisto_dir: PathBuf,
    /// Sequencing read length in bases, required to derive StringTie read
    /// counts from per-base coverage. Never defaulted: a wrong value skews
    /// every derived count without any detectable symptom.
    pub read_length: u32,
    pub level: FeatureLevel,
    pub out_dir: PathBuf,
    #[serde(default = "stem_prefix")]
    pub rsem_sample_id: SampleIdStrategy,
    #[serde(default = "parent_dir")]
    pub stringtie_sample_id: SampleIdStrategy,
    #[serde(default = "parent_dir")]
    pub kallisto_sample_id: SampleIdStrategy,
}

fn stem_prefix() -> SampleIdStrategy {
    SampleIdStrategy::StemPrefix
}

fn parent_dir() -> SampleIdStrategy {
    SampleIdStrategy::ParentDir
}

impl AnalysisConfig {
    /// Config with the stock per-tool sample-id strategies.
    pub fn new(
        rsem_dir: PathBuf,
        stringtie_dir: PathBuf,
        kallisto_dir: PathBuf,
        read_length: u32,
        level: FeatureLevel,
        out_dir: PathBuf,
    ) -> AnalysisConfig {
        AnalysisConfig {
            rsem_dir,
            stringtie_dir,
            kallisto_dir,
            read_length,
            level,
            out_dir,
            rsem_sample_id: stem_prefix(),
            stringtie_sample_id: parent_dir(),
            kallisto_sample_id: parent_dir(),
        }
    }

    pub fn from_json(path: &Path) -> Result<AnalysisConfig> {
        let text = fs::read_to_string(path).with_context(|| path.display().to_string())?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing analysis config {}", path.display()))
    }
}

/// What a run produced: the raw records plus the files written under
/// `out_dir`. Nothing else persists; a rerun recomputes everything.
#[derive(Debug)]
pub struct AnalysisOutputs {
    pub records: Vec<CorrelationRecord>,
    pub summary_csv: PathBuf,
    pub boxplot_html: PathBuf,
    pub scatter_htmls: Vec<PathBuf>,
}

/// End-to-end batch pass: discover and load the three tools' outputs,
/// normalize StringTie onto TPM, aggregate to gene level when requested,
/// correlate per sample, and write the summary table and charts.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisOutputs> {
    let level = config.level;
    info!("starting {level}-level comparison");

    let rsem = rsem::load(&config.rsem_dir, level, config.rsem_sample_id)?;
    let stringtie_raw = stringtie::load(
        &config.stringtie_dir,
        config.read_length,
        config.stringtie_sample_id,
    )?;
    let kallisto_tx = kallisto::load(&config.kallisto_dir, config.kallisto_sample_id)?;

    let (stringtie, kallisto) = match level {
        FeatureLevel::Transcript => (normalize::tpm(stringtie_raw)?, kallisto_tx),
        FeatureLevel::Gene => {
            // the transcript-to-gene map comes from one StringTie table and
            // is reused for both tools that need aggregation
            let ctabs = discover(
                &config.stringtie_dir,
                stringtie::CTAB_PATTERN,
                config.stringtie_sample_id,
            )?;
            let map = stringtie::tx_to_gene(&ctabs[0].path)?;
            let stringtie = normalize::tpm(aggregate::to_gene_level_raw(&stringtie_raw, &map)?)?;
            let kallisto = aggregate::to_gene_level(&kallisto_tx, &map)?;
            (stringtie, kallisto)
        }
    };

    let sources = [
        Source::new(Tool::Rsem.to_string(), &rsem),
        Source::new(Tool::StringTie.to_string(), &stringtie),
        Source::new(Tool::Kallisto.to_string(), &kallisto),
    ];
    let records = correlate(&sources)?;
    info!("computed {} correlation records", records.len());

    fs::create_dir_all(&config.out_dir)
        .with_context(|| config.out_dir.display().to_string())?;
    let summary_csv = config.out_dir.join(format!("spearman_{level}.csv"));
    SummaryTable::from_records(&records).write_csv(&summary_csv)?;

    let boxplot_html = config.out_dir.join(format!("spearman_{level}.html"));
    correlation_boxplot(&records).write_html(&boxplot_html)?;

    let scatter_htmls = write_scatters(&config.out_dir, &sources)?;

    Ok(AnalysisOutputs {
        records,
        summary_csv,
        boxplot_html,
        scatter_htmls,
    })
}

fn write_scatters(out_dir: &Path, sources: &[Source<'_>]) -> Result<Vec<PathBuf>> {
    let scatter_dir = out_dir.join("scatter");
    fs::create_dir_all(&scatter_dir).with_context(|| scatter_dir.display().to_string())?;

    let mut paths = Vec::new();
    for (a, b) in sources.iter().tuple_combinations() {
        for sample in a.matrix.sample_ids() {
            let (xs, ys) = aligned_abundance(a.matrix, b.matrix, sample)?;
            let chart = log1p_scatter(&a.label, &xs, &b.label, &ys, sample);
            let path = scatter_dir.join(format!("{sample}_{}_vs_{}.html", a.label, b.label));
            chart.write_html(&path)?;
            paths.push(path);
        }
    }
    Ok(paths)
}
