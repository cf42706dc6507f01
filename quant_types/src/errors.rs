use std::path::PathBuf;

/// Fatal failures of the analysis. There is no partial-result or retry
/// semantics anywhere in the pipeline: any data-integrity violation aborts
/// the run rather than producing plausible-looking but wrong correlations.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error(
        "No quantification files matching '{pattern}' were found under {root:?}. \
         Check that the directory is the output root of the expected pipeline and \
         that the per-sample result files have not been renamed."
    )]
    NoFilesFound { root: PathBuf, pattern: String },

    #[error(
        "Could not extract a sample identifier from {path:?} using the '{strategy}' \
         strategy. Either rename the file to match the convention or select a \
         different sample-id strategy."
    )]
    SampleIdExtraction { path: PathBuf, strategy: String },

    #[error(
        "The sample identifier '{sample}' was extracted from two different files: \
         {first:?} and {second:?}. Sample identifiers must be unique within one \
         table; correlating a sample against the wrong file would go undetected."
    )]
    DuplicateSampleId {
        sample: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(
        "Sample '{sample}' from {path:?} does not report the same feature set as \
         sample '{first_sample}': {detail}. All files in one table must come from \
         the same annotation; mismatched annotation versions produce exactly this \
         failure."
    )]
    InconsistentFeatureSet {
        sample: String,
        path: PathBuf,
        first_sample: String,
        detail: String,
    },

    #[error(
        "Feature '{feature}' in sample '{sample}' has length {length}, which is not \
         a positive number of bases. A zero or missing length cannot be silently \
         skipped: it would corrupt the scaling factor used for every other feature \
         in the sample."
    )]
    InvalidFeatureLength {
        feature: String,
        sample: String,
        length: f64,
    },

    #[error(
        "Sample '{sample}' has zero reads over every feature, so its TPM scaling \
         factor is zero. Refusing to divide by it; downstream correlations would \
         silently become NaN."
    )]
    DegenerateSample { sample: String },

    #[error(
        "The sequencing read length must be a positive number of bases, got \
         {value}. This constant scales every derived StringTie count and is never \
         validated against the input files, so it must be supplied explicitly."
    )]
    InvalidReadLength { value: u32 },

    #[error(
        "Transcript '{transcript}' has no gene assignment in the supplied \
         transcript-to-gene map ({map_len} entries). Gene-level aggregation \
         requires every transcript to be mapped; the map was likely extracted from \
         a different annotation."
    )]
    UnmappedTranscript { transcript: String, map_len: usize },

    #[error(
        "Sample '{sample}' is present in the '{present_in}' table but absent from \
         the '{missing_from}' table. Tables are aligned by exact sample identifier, \
         never by column position, and every compared table must cover the same \
         samples."
    )]
    SampleMismatch {
        sample: String,
        present_in: String,
        missing_from: String,
    },

    #[error(
        "The tables being compared ({sources}) share no feature identifiers. \
         Refusing to report a coefficient over an empty intersection; the tables \
         are probably keyed at different aggregation levels."
    )]
    EmptyIntersection { sources: String },

    #[error(
        "Transcript '{transcript}' maps to both gene '{gene_a}' and gene \
         '{gene_b}' in the transcript-to-gene source. The mapping must be a \
         function from transcript to gene."
    )]
    ConflictingTxMapping {
        transcript: String,
        gene_a: String,
        gene_b: String,
    },

    #[error(
        "Feature '{feature}' appears more than once in {path:?}. Feature \
         identifiers index the rows of a table and must be unique within one \
         file."
    )]
    DuplicateFeatureId { feature: String, path: PathBuf },
}
