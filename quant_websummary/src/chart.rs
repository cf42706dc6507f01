use anyhow::{Context, Result};
use plotly::Layout;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

const PLOTLY_CONFIG: &str = r#"{
    "displayModeBar": true,
    "responsive": true
}"#;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

fn default_config() -> Value {
    serde_json::from_str(PLOTLY_CONFIG).unwrap()
}

/// A chart held as plain Plotly JSON (config, data traces, layout), ready to
/// be embedded in a summary document or written as a standalone HTML page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    pub config: Value,
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Chart {
    pub fn with_layout_and_data<D: Serialize>(layout: Layout, data: Vec<D>) -> Chart {
        Chart {
            config: default_config(),
            data: data
                .iter()
                .map(|trace| serde_json::to_value(trace).unwrap())
                .collect(),
            layout: serde_json::to_value(&layout).unwrap(),
        }
    }

    /// Write a self-contained HTML page rendering this chart.
    pub fn write_html(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string(&self.data).unwrap();
        let layout = serde_json::to_string(&self.layout).unwrap();
        let config = serde_json::to_string(&self.config).unwrap();
        let html = format!(
            "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\">\
             <script src=\"{PLOTLY_CDN}\"></script></head>\n\
             <body>\n<div id=\"chart\"></div>\n\
             <script>Plotly.newPlot(\"chart\", {data}, {layout}, {config});</script>\n\
             </body>\n</html>\n"
        );
        fs::write(path, html).with_context(|| path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotly::Scatter;

    #[test]
    fn serializes_traces_and_writes_html() {
        let trace = Scatter::new(vec![1.0, 2.0], vec![3.0, 4.0]);
        let chart = Chart::with_layout_and_data(Layout::new(), vec![trace]);
        assert_eq!(chart.data.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.html");
        chart.write_html(&path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("scatter"));
    }
}
