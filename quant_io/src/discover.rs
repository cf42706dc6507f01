use anyhow::{Context, Result};
use itertools::Itertools;
use lazy_static::lazy_static;
use log::info;
use quant_types::QuantError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

lazy_static! {
    static ref RUN_ACCESSION: Regex = Regex::new(r"[SED]RR\d+").unwrap();
}

/// How to recover a sample identifier from a result-file path. Extraction is
/// a pure function of the path; uniqueness of the extracted identifiers is
/// validated immediately after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SampleIdStrategy {
    /// Text of the file name before the first underscore. Suits RSEM
    /// outputs named `<sample>_rsem.genes.results`.
    StemPrefix,
    /// Name of the directory containing the file. Suits StringTie and
    /// Kallisto layouts with one `<sample>/` directory per sample.
    ParentDir,
    /// First SRA-style run accession (`SRR`/`ERR`/`DRR` + digits) found
    /// anywhere in the path.
    RunAccession,
}

impl SampleIdStrategy {
    /// Extract a sample identifier, or `None` when the path does not match
    /// the convention.
    pub fn extract(self, path: &Path) -> Option<String> {
        match self {
            SampleIdStrategy::StemPrefix => {
                let name = path.file_name()?.to_str()?;
                let prefix = name.split('_').next()?;
                (!prefix.is_empty()).then(|| prefix.to_string())
            }
            SampleIdStrategy::ParentDir => {
                let dir = path.parent()?.file_name()?.to_str()?;
                (!dir.is_empty()).then(|| dir.to_string())
            }
            SampleIdStrategy::RunAccession => RUN_ACCESSION
                .find(path.to_str()?)
                .map(|m| m.as_str().to_string()),
        }
    }
}

/// A result file paired with the sample identifier extracted from its path.
#[derive(Debug, Clone)]
pub struct DiscoveredSample {
    pub sample_id: String,
    pub path: PathBuf,
}

/// Recursively search `root` for files matching `pattern` and extract one
/// sample identifier per file. Fails when nothing matches, when extraction
/// fails for a file, or when two files yield the same identifier.
pub fn discover(
    root: &Path,
    pattern: &str,
    strategy: SampleIdStrategy,
) -> Result<Vec<DiscoveredSample>> {
    let glob_pattern = format!("{}/**/{}", root.display(), pattern);
    let mut paths: Vec<PathBuf> = glob::glob(&glob_pattern)
        .with_context(|| format!("invalid glob pattern '{glob_pattern}'"))?
        .try_collect()
        .with_context(|| format!("searching {}", root.display()))?;
    paths.sort();

    if paths.is_empty() {
        return Err(QuantError::NoFilesFound {
            root: root.to_path_buf(),
            pattern: pattern.to_string(),
        }
        .into());
    }

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut samples = Vec::with_capacity(paths.len());
    for path in paths {
        let sample_id =
            strategy
                .extract(&path)
                .ok_or_else(|| QuantError::SampleIdExtraction {
                    path: path.clone(),
                    strategy: strategy.to_string(),
                })?;
        if let Some(first) = seen.get(&sample_id) {
            return Err(QuantError::DuplicateSampleId {
                sample: sample_id,
                first: first.clone(),
                second: path,
            }
            .into());
        }
        seen.insert(sample_id.clone(), path.clone());
        samples.push(DiscoveredSample { sample_id, path });
    }
    info!(
        "discovered {} files matching '{pattern}' under {}",
        samples.len(),
        root.display()
    );
    Ok(samples)
}
