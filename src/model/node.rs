//! The flow graph handed to the Sankey renderer.
//!
//! The graph is an owned tree: a `RootNode` owns an income forest and an issue forest, and every
//! `FlowNode` owns its children. Traversal is strictly parent to child.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One bar segment of the diagram.
///
/// `children` break the amount down further. Their amounts are expected to sum to at most the
/// parent's amount but this is not enforced.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    amount: Decimal,
    label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<FlowNode>,
}

impl FlowNode {
    pub fn new(amount: Decimal, label: impl Into<String>) -> Self {
        Self {
            amount,
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &[FlowNode] {
        &self.children
    }

    pub fn add_child(&mut self, child: FlowNode) {
        self.children.push(child);
    }

    /// Builder-style variant of [`FlowNode::add_child`].
    pub fn with_child(mut self, child: FlowNode) -> Self {
        self.add_child(child);
        self
    }
}

/// The total-income node in the middle of the diagram.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    label: String,
    income_nodes: Vec<FlowNode>,
    issue_nodes: Vec<FlowNode>,
}

impl RootNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            income_nodes: Vec::new(),
            issue_nodes: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn income_nodes(&self) -> &[FlowNode] {
        &self.income_nodes
    }

    pub fn issue_nodes(&self) -> &[FlowNode] {
        &self.issue_nodes
    }

    pub fn add_income(&mut self, node: FlowNode) {
        self.income_nodes.push(node);
    }

    pub fn add_issue(&mut self, node: FlowNode) {
        self.issue_nodes.push(node);
    }

    /// Sum of the income node amounts. Saturates at the bounds of `Decimal`.
    pub fn income_amount(&self) -> Decimal {
        saturating_total(&self.income_nodes)
    }

    /// Sum of the top-level issue node amounts. Saturates at the bounds of `Decimal`.
    pub fn issues_amount(&self) -> Decimal {
        saturating_total(&self.issue_nodes)
    }

    /// Sum of the income node amounts, `None` on overflow.
    pub fn checked_income_amount(&self) -> Option<Decimal> {
        checked_total(&self.income_nodes)
    }

    /// Sum of the top-level issue node amounts, `None` on overflow.
    pub fn checked_issues_amount(&self) -> Option<Decimal> {
        checked_total(&self.issue_nodes)
    }
}

fn saturating_total(nodes: &[FlowNode]) -> Decimal {
    nodes
        .iter()
        .fold(Decimal::ZERO, |sum, node| sum.saturating_add(node.amount()))
}

fn checked_total(nodes: &[FlowNode]) -> Option<Decimal> {
    nodes
        .iter()
        .try_fold(Decimal::ZERO, |sum, node| sum.checked_add(node.amount()))
}
