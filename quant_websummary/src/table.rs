use anyhow::{Context, Result};
use itertools::Itertools;
use quant_types::CorrelationRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Pivot of correlation records: one row per sample, one column per
/// unordered source pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryTable {
    pub samples: Vec<String>,
    pub pairs: Vec<String>,
    /// Row-major, samples by pairs. `None` when a record for the cell is
    /// absent from the input.
    pub coefficients: Vec<Vec<Option<f64>>>,
}

impl SummaryTable {
    pub fn from_records(records: &[CorrelationRecord]) -> SummaryTable {
        let samples: Vec<String> = records
            .iter()
            .map(|r| r.sample.clone())
            .sorted()
            .dedup()
            .collect();
        let pairs: Vec<String> = records
            .iter()
            .map(CorrelationRecord::pair_label)
            .sorted()
            .dedup()
            .collect();

        let by_cell: HashMap<(&str, String), f64> = records
            .iter()
            .map(|r| ((r.sample.as_str(), r.pair_label()), r.rho))
            .collect();
        let coefficients = samples
            .iter()
            .map(|sample| {
                pairs
                    .iter()
                    .map(|pair| by_cell.get(&(sample.as_str(), pair.clone())).copied())
                    .collect()
            })
            .collect();

        SummaryTable {
            samples,
            pairs,
            coefficients,
        }
    }

    /// Write the pivot as CSV: a `sample` column followed by one column per
    /// pair. Missing cells are left empty.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path).with_context(|| path.display().to_string())?;
        let mut header = vec!["sample".to_string()];
        header.extend(self.pairs.iter().cloned());
        wtr.write_record(&header)?;
        for (sample, row) in self.samples.iter().zip(&self.coefficients) {
            let mut record = vec![sample.clone()];
            record.extend(
                row.iter()
                    .map(|cell| cell.map(|rho| format!("{rho:.6}")).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
