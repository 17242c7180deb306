//! Turns a flow graph into the node/link arrays of a Sankey diagram and renders them as a
//! self-contained HTML page that loads Plotly from a CDN.

use crate::error::Result;
use crate::model::{AmountError, FlowNode, Period, RootNode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const VALUE_SUFFIX: &str = "€";

/// Node colours, assigned by node index. The link colour is the colour of its target node with
/// reduced opacity.
const PALETTE: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

/// The arrays of a Plotly `sankey` trace.
///
/// Every node of the graph is visited exactly once and gets its own index: the income nodes
/// first, then the root, then the issue forest in depth-first order. Links run from each income
/// node to the root and from every other node to its direct children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SankeyData {
    pub labels: Vec<String>,
    pub colors: Vec<String>,
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    pub values: Vec<Decimal>,
}

impl From<&RootNode> for SankeyData {
    fn from(root: &RootNode) -> Self {
        let mut data = SankeyData::default();
        let income: Vec<usize> = root
            .income_nodes()
            .iter()
            .map(|node| data.push_node(node.label()))
            .collect();
        let root_ix = data.push_node(root.label());
        for (ix, node) in income.into_iter().zip(root.income_nodes()) {
            data.push_link(ix, root_ix, node.amount());
        }
        for node in root.issue_nodes() {
            data.push_subtree(root_ix, node);
        }
        data
    }
}

impl SankeyData {
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn link_count(&self) -> usize {
        self.sources.len()
    }

    fn push_node(&mut self, label: &str) -> usize {
        let ix = self.labels.len();
        self.labels.push(label.to_string());
        self.colors.push(color(ix, 0.8));
        ix
    }

    fn push_link(&mut self, source: usize, target: usize, value: Decimal) {
        self.sources.push(source);
        self.targets.push(target);
        self.values.push(value);
    }

    fn push_subtree(&mut self, parent: usize, node: &FlowNode) {
        let ix = self.push_node(node.label());
        self.push_link(parent, ix, node.amount());
        for child in node.children() {
            self.push_subtree(ix, child);
        }
    }
}

fn color(ix: usize, alpha: f32) -> String {
    let (r, g, b) = PALETTE[ix % PALETTE.len()];
    format!("rgba({r},{g},{b},{alpha})")
}

/// Renders `root` as a complete HTML page titled `Sankey <period>`.
///
/// `amount_label` names the link value in the hover text, e.g. `Betrag`.
pub fn render_html(root: &RootNode, period: &Period, amount_label: &str) -> Result<String> {
    let data = SankeyData::from(root);
    let mut values = Vec::with_capacity(data.values.len());
    for value in &data.values {
        let value = value
            .round_dp(2)
            .to_f64()
            .ok_or_else(|| {
                AmountError::new(&value.to_string(), "the amount cannot be plotted")
            })?;
        values.push(value);
    }
    let link_colors: Vec<String> = data.targets.iter().map(|&t| color(t, 0.35)).collect();
    let title = format!("Sankey {period}");

    let trace = json!([{
        "type": "sankey",
        "orientation": "h",
        "valuesuffix": VALUE_SUFFIX,
        "valueformat": ",.2f",
        "node": {
            "pad": 15,
            "thickness": 20,
            "line": { "color": "black", "width": 0.5 },
            "label": data.labels,
            "color": data.colors,
        },
        "link": {
            "source": data.sources,
            "target": data.targets,
            "value": values,
            "color": link_colors,
            "hovertemplate": format!("{amount_label}: %{{value}}<extra></extra>"),
        },
    }]);
    let layout = json!({
        "title": { "text": title },
        "font": { "size": 12 },
        "separators": ",.",
    });

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="sankey" style="width:100%;height:95vh;"></div>
<script>
Plotly.newPlot("sankey", {trace}, {layout}, {{"responsive": true}});
</script>
</body>
</html>
"#,
        title = escape_html(&title),
        trace = script_safe(&trace.to_string()),
        layout = script_safe(&layout.to_string()),
    ))
}

/// JSON embedded in a `<script>` element must not close it.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
