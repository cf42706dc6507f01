use crate::chart::Chart;
use itertools::Itertools;
use plotly::common::Mode;
use plotly::layout::Axis;
use plotly::{BoxPlot, Layout, Scatter};
use quant_types::CorrelationRecord;

/// Distribution of Spearman coefficients across samples, one box per
/// unordered source pair.
pub fn correlation_boxplot(records: &[CorrelationRecord]) -> Chart {
    let layout = Layout::new()
        .x_axis(Axis::new().title("Comparison"))
        .y_axis(Axis::new().title("Spearman rank correlation"));

    let traces: Vec<_> = records
        .iter()
        .map(|r| (r.pair_label(), r.rho))
        .into_group_map()
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(pair, rhos)| BoxPlot::<f64, f64>::new(rhos).name(&pair))
        .collect();

    Chart::with_layout_and_data(layout, traces)
}

/// Scatter of log1p-transformed abundance for one sample between two
/// sources. The vectors must already be aligned over the shared feature
/// set; this function only transforms and renders.
pub fn log1p_scatter(
    a_label: &str,
    a: &[f64],
    b_label: &str,
    b: &[f64],
    sample: &str,
) -> Chart {
    assert_eq!(a.len(), b.len(), "scatter inputs must be aligned");
    let xs: Vec<f64> = a.iter().map(|v| v.ln_1p()).collect();
    let ys: Vec<f64> = b.iter().map(|v| v.ln_1p()).collect();

    let layout = Layout::new()
        .x_axis(Axis::new().title(format!("log1p(TPM) {a_label}").as_str()))
        .y_axis(Axis::new().title(format!("log1p(TPM) {b_label}").as_str()));
    let trace = Scatter::new(xs, ys).mode(Mode::Markers).name(sample);

    Chart::with_layout_and_data(layout, vec![trace])
}
