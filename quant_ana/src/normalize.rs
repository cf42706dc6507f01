use log::info;
use ndarray::Array2;
use quant_types::{QuantError, QuantMatrix, RawQuantMatrix};

const TPM_SCALE: f64 = 1_000_000.0;

/// Compute TPM for a raw table and return the finished matrix.
///
/// Per sample, independently of every other sample:
///   1. RPK = counts / (length_in_bases / 1000)
///   2. scaling factor = sum(RPK) / 1,000,000
///   3. TPM = RPK / scaling factor
///
/// Every feature length must be a positive, finite number of bases before
/// any arithmetic happens; a sample whose counts are all zero has a zero
/// scaling factor and is rejected rather than turned into NaN.
pub fn tpm(raw: RawQuantMatrix) -> Result<QuantMatrix, QuantError> {
    let (n_features, n_samples) = raw.counts().dim();

    for j in 0..n_samples {
        for i in 0..n_features {
            let length = raw.lengths()[[i, j]];
            if !(length.is_finite() && length > 0.0) {
                return Err(QuantError::InvalidFeatureLength {
                    feature: raw.feature_ids()[i].clone(),
                    sample: raw.sample_ids()[j].clone(),
                    length,
                });
            }
        }
    }

    let mut abundance = Array2::zeros((n_features, n_samples));
    for j in 0..n_samples {
        let rpk: Vec<f64> = (0..n_features)
            .map(|i| raw.counts()[[i, j]] / (raw.lengths()[[i, j]] / 1000.0))
            .collect();
        let scale = rpk.iter().sum::<f64>() / TPM_SCALE;
        if scale == 0.0 {
            return Err(QuantError::DegenerateSample {
                sample: raw.sample_ids()[j].clone(),
            });
        }
        for (i, rpk) in rpk.iter().enumerate() {
            abundance[[i, j]] = rpk / scale;
        }
    }

    info!(
        "{}: normalized {n_features} features x {n_samples} samples to TPM",
        raw.tool()
    );
    Ok(QuantMatrix::from_raw(raw, abundance))
}
