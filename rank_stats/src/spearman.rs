use crate::ranks::average_ranks;
use ndarray::{Array1, Array2};
use ndarray_stats::CorrelationExt;

/// Spearman rank correlation of two equal-length vectors: Pearson
/// correlation applied to mid-ranks. Returns a value in [-1, 1], or NaN if
/// either vector is constant (its ranks then have zero variance).
///
/// Panics on empty or length-mismatched input.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "correlating vectors of unequal length");
    assert!(!x.is_empty(), "correlating empty vectors");

    let n = x.len();
    let mut ranks = Array2::zeros((2, n));
    ranks.row_mut(0).assign(&Array1::from(average_ranks(x)));
    ranks.row_mut(1).assign(&Array1::from(average_ranks(y)));
    let corr = ranks
        .pearson_correlation()
        .expect("observation matrix is non-empty");
    corr[[0, 1]]
}
