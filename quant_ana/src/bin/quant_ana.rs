//! quant_ana

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use quant_ana::run::{run, AnalysisConfig};
use quant_types::FeatureLevel;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about = "Compare RSEM, StringTie and Kallisto quantifications of the same samples")]
struct Args {
    /// JSON analysis config; replaces the individual flags below
    #[clap(long)]
    config: Option<PathBuf>,

    /// Root directory of RSEM result files
    #[clap(long)]
    rsem_dir: Option<PathBuf>,

    /// Root directory of StringTie output directories
    #[clap(long)]
    stringtie_dir: Option<PathBuf>,

    /// Root directory of Kallisto output directories
    #[clap(long)]
    kallisto_dir: Option<PathBuf>,

    /// Sequencing read length in bases (required; used to derive StringTie
    /// read counts from coverage)
    #[clap(long)]
    read_length: Option<u32>,

    /// Aggregation level: gene or transcript
    #[clap(long, default_value = "gene")]
    level: String,

    /// Directory for the summary CSV and charts
    #[clap(long, default_value = "quant_compare")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.config {
        Some(path) => AnalysisConfig::from_json(&path)?,
        None => {
            let level: FeatureLevel = args
                .level
                .parse()
                .map_err(|_| anyhow!("--level must be 'gene' or 'transcript'"))?;
            AnalysisConfig::new(
                args.rsem_dir
                    .context("--rsem-dir is required without --config")?,
                args.stringtie_dir
                    .context("--stringtie-dir is required without --config")?,
                args.kallisto_dir
                    .context("--kallisto-dir is required without --config")?,
                args.read_length
                    .context("--read-length is required without --config")?,
                level,
                args.out_dir,
            )
        }
    };

    let outputs = run(&config)?;
    println!("summary: {}", outputs.summary_csv.display());
    println!("boxplot: {}", outputs.boxplot_html.display());
    println!("scatter plots: {}", outputs.scatter_htmls.len());
    Ok(())
}
