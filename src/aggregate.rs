//! Sums transaction amounts into flow nodes and assembles them into the flow graph.

use crate::error::{Error, Result};
use crate::model::{
    normalized_sum, AmountError, Category, FlowNode, IssueLevel, RootNode, Selection,
    SourceFilter,
};
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

/// Sums the amounts of the rows whose lowercase `column` value contains `needle`.
///
/// Returns zero when no row matches. An empty `needle` sums the whole amount column.
///
/// # Errors
/// - `Error::AmountFormat` if a matching amount cell does not parse.
/// - `Error::FileFormat` if a column is missing.
pub fn sum_matching(
    subset: &Selection<'_>,
    column: &str,
    needle: &str,
    amount_column: &str,
) -> Result<Decimal> {
    let matching = subset.where_contains(column, needle)?;
    let sum = normalized_sum(matching.values(amount_column)?)?;
    trace!(column, needle, rows = matching.len(), %sum, "Summed matching rows");
    Ok(sum)
}

/// Creates one node per income source, in the configured order, followed by the residual node.
///
/// The residual is the whole amount column of `income` minus the explicit source nodes. It is
/// negative when the sources overlap or claim more than the column total.
pub fn build_income_nodes(
    income: &Selection<'_>,
    sources: &[SourceFilter],
    amount_column: &str,
    other_income_label: &str,
) -> Result<(Vec<FlowNode>, FlowNode)> {
    let mut nodes = Vec::with_capacity(sources.len());
    for source in sources {
        let sum = sum_matching(income, source.column(), &source.needle(), amount_column)?;
        nodes.push(FlowNode::new(sum, source.label()));
    }

    let total = normalized_sum(income.values(amount_column)?)?;
    let claimed = nodes
        .iter()
        .try_fold(Decimal::ZERO, |sum, node| sum.checked_add(node.amount()))
        .ok_or_else(|| AmountError::new(other_income_label, "the sum is out of range"))?;
    let other = total
        .checked_sub(claimed)
        .ok_or_else(|| AmountError::new(other_income_label, "the sum is out of range"))?;
    if other < Decimal::ZERO {
        warn!(
            %total,
            %claimed,
            "Income sources claim more than the income total, '{other_income_label}' is negative"
        );
    }
    debug!(sources = nodes.len(), %total, %other, "Built income nodes");
    Ok((nodes, FlowNode::new(other, other_income_label)))
}

/// Creates one node per category. At `IssueLevel::Sub` each category node gets one child per
/// subcategory.
///
/// Matching is a lowercase substring match, so a category whose name is contained in another
/// category's name also counts that category's rows. Subcategory sums run over the whole issues
/// subset.
///
/// # Errors
/// - `Error::Config` if `level` is `IssueLevel::Sub` and no `sub_column` is given.
pub fn build_category_nodes(
    issues: &Selection<'_>,
    categories: &[Category],
    main_column: &str,
    sub_column: Option<&str>,
    level: IssueLevel,
    amount_column: &str,
) -> Result<Vec<FlowNode>> {
    let sub_column = match level {
        IssueLevel::Main => None,
        IssueLevel::Sub => Some(sub_column.ok_or_else(|| {
            Error::config("A sub category column must be configured for issue level 2")
        })?),
    };
    warn_overlapping_names(categories.iter().map(|c| ("", c.name())));
    if sub_column.is_some() {
        warn_overlapping_names(categories.iter().flat_map(|c| {
            c.sub_categories()
                .iter()
                .map(move |sub| (c.name(), sub.as_str()))
        }));
    }

    let mut nodes = Vec::with_capacity(categories.len());
    for category in categories {
        let sum = sum_matching(
            issues,
            main_column,
            &category.name().to_lowercase(),
            amount_column,
        )?;
        let mut node = FlowNode::new(sum, category.name());

        if let Some(sub_column) = sub_column {
            for sub_category in category.sub_categories() {
                let sum = sum_matching(
                    issues,
                    sub_column,
                    &sub_category.to_lowercase(),
                    amount_column,
                )?;
                node.add_child(FlowNode::new(sum, sub_category));
            }
        }
        nodes.push(node);
    }
    debug!(categories = nodes.len(), %level, "Built category nodes");
    Ok(nodes)
}

/// Builds the root node from the income and category nodes.
///
/// When income exceeds the issue total, an extra issue node labelled `unused_labels.0` closes
/// the gap. At `IssueLevel::Sub` it gets a single pass-through child labelled `unused_labels.1`.
///
/// # Errors
/// - `Error::Config` if `level` is `IssueLevel::Sub` and no second unused label is given.
pub fn assemble(
    label: &str,
    income_nodes: Vec<FlowNode>,
    category_nodes: Vec<FlowNode>,
    unused_labels: (&str, Option<&str>),
    level: IssueLevel,
) -> Result<RootNode> {
    let sub_label = match level {
        IssueLevel::Main => None,
        IssueLevel::Sub => Some(unused_labels.1.ok_or_else(|| {
            Error::config("Two unused income labels must be configured for issue level 2")
        })?),
    };

    let mut root = RootNode::new(label);
    for node in income_nodes {
        root.add_income(node);
    }
    for node in category_nodes {
        root.add_issue(node);
    }

    let income = root
        .checked_income_amount()
        .ok_or_else(|| AmountError::new(label, "the sum is out of range"))?;
    let issues = root
        .checked_issues_amount()
        .ok_or_else(|| AmountError::new(label, "the sum is out of range"))?;
    let unused = income
        .checked_sub(issues)
        .ok_or_else(|| AmountError::new(label, "the sum is out of range"))?;
    if unused > Decimal::ZERO {
        let mut node = FlowNode::new(unused, unused_labels.0);
        if let Some(sub_label) = sub_label {
            node.add_child(FlowNode::new(unused, sub_label));
        }
        root.add_issue(node);
    } else if unused < Decimal::ZERO {
        warn!(%income, %issues, "Issues exceed income for '{label}'");
    }
    Ok(root)
}

/// Logs a warning for each name whose rows are also matched by another entry.
fn warn_overlapping_names<'a>(names: impl Iterator<Item = (&'a str, &'a str)>) {
    for (name, other) in overlapping_names(names) {
        warn!("'{name}' also matches the rows of '{other}'");
    }
}

/// Finds the pairs `(a, b)` where the lowercase name of `a` is contained in the name of `b`, so
/// substring matching counts `a`'s rows for `b` as well. Entries are `(parent, name)`; the same
/// name under two parents is reported once.
fn overlapping_names<'a>(
    names: impl Iterator<Item = (&'a str, &'a str)>,
) -> Vec<(String, String)> {
    let entries: Vec<(&str, &str, String)> = names
        .map(|(parent, name)| (parent, name, name.to_lowercase()))
        .collect();
    let describe = |parent: &str, name: &str| {
        if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        }
    };

    let mut pairs = Vec::new();
    for (i, (parent, name, needle)) in entries.iter().enumerate() {
        for (j, (other_parent, other, haystack)) in entries.iter().enumerate() {
            let same_name = needle == haystack;
            if i == j || (same_name && j < i) || !haystack.contains(needle.as_str()) {
                continue;
            }
            pairs.push((describe(*parent, *name), describe(*other_parent, *other)));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{extract_categories, TransactionTable};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const CSV: &str = "\
Haupt;Unter;Gegenpartei;Betrag
Wohnen;Miete;Vermieter;-800,00
Lebensmittel;Supermarkt;Rewe;-100,00
Wohnen;Strom;Stadtwerke;-60,00
Einnahmen;Gehalt;ACME GmbH;2.000,00
Einnahmen;Zinsen;Bank;15,00
";

    fn table() -> TransactionTable {
        TransactionTable::from_reader(CSV.as_bytes(), &[]).unwrap()
    }

    #[test]
    fn test_sum_matching() {
        let table = table();
        let all = table.all();
        assert_eq!(sum_matching(&all, "Haupt", "wohnen", "Betrag").unwrap(), dec("860"));
        assert_eq!(sum_matching(&all, "Haupt", "urlaub", "Betrag").unwrap(), Decimal::ZERO);
        // Upper case needles never match the lowercased cells.
        assert_eq!(sum_matching(&all, "Haupt", "Wohnen", "Betrag").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_sum_matching_bad_amount() {
        let csv = "Haupt;Betrag\nWohnen;abc\n";
        let table = TransactionTable::from_reader(csv.as_bytes(), &[]).unwrap();
        let err = sum_matching(&table.all(), "Haupt", "", "Betrag").unwrap_err();
        assert!(err.is_amount_format());
    }

    #[test]
    fn test_income_nodes_with_residual() {
        let table = table();
        let income = table.all().where_equals("Haupt", "Einnahmen").unwrap();
        let sources = vec![SourceFilter::new("Salary", "Gegenpartei", "acme")];
        let (nodes, other) = build_income_nodes(&income, &sources, "Betrag", "Other").unwrap();
        assert_eq!(nodes, vec![FlowNode::new(dec("2000"), "Salary")]);
        assert_eq!(other, FlowNode::new(dec("15"), "Other"));
    }

    #[test]
    fn test_income_residual_may_be_negative() {
        let table = table();
        let income = table.all().where_equals("Haupt", "Einnahmen").unwrap();
        let sources = vec![
            SourceFilter::new("Salary", "Gegenpartei", "acme"),
            SourceFilter::new("Salary again", "Unter", "gehalt"),
        ];
        let (_, other) = build_income_nodes(&income, &sources, "Betrag", "Other").unwrap();
        assert_eq!(other.amount(), dec("-1985"));
    }

    #[test]
    fn test_category_nodes_level_one_have_no_children() {
        let table = table();
        let issues = table.all().where_contains("Betrag", "-").unwrap();
        let categories = extract_categories(&issues, "Haupt", None, IssueLevel::Main).unwrap();
        let nodes =
            build_category_nodes(&issues, &categories, "Haupt", None, IssueLevel::Main, "Betrag")
                .unwrap();
        assert_eq!(
            nodes,
            vec![
                FlowNode::new(dec("860"), "Wohnen"),
                FlowNode::new(dec("100"), "Lebensmittel"),
            ]
        );
    }

    #[test]
    fn test_category_nodes_level_two() {
        let table = table();
        let issues = table.all().where_contains("Betrag", "-").unwrap();
        let categories =
            extract_categories(&issues, "Haupt", Some("Unter"), IssueLevel::Sub).unwrap();
        let nodes = build_category_nodes(
            &issues,
            &categories,
            "Haupt",
            Some("Unter"),
            IssueLevel::Sub,
            "Betrag",
        )
        .unwrap();
        let housing = &nodes[0];
        assert_eq!(housing.label(), "Wohnen");
        let children: Vec<(&str, Decimal)> = housing
            .children()
            .iter()
            .map(|c| (c.label(), c.amount()))
            .collect();
        assert_eq!(children, vec![("Miete", dec("800")), ("Strom", dec("60"))]);
    }

    #[test]
    fn test_overlapping_category_names_double_count() {
        let csv = "Haupt;Betrag\nAuto;-100,00\nAutoversicherung;-50,00\n";
        let table = TransactionTable::from_reader(csv.as_bytes(), &[]).unwrap();
        let issues = table.all();
        let categories = extract_categories(&issues, "Haupt", None, IssueLevel::Main).unwrap();
        let nodes =
            build_category_nodes(&issues, &categories, "Haupt", None, IssueLevel::Main, "Betrag")
                .unwrap();
        assert_eq!(nodes[0].amount(), dec("150"));
        assert_eq!(nodes[1].amount(), dec("50"));
    }

    #[test]
    fn test_assemble_adds_unused_node() {
        let income = vec![
            FlowNode::new(dec("2000"), "Salary"),
            FlowNode::new(Decimal::ZERO, "Other"),
        ];
        let issues = vec![
            FlowNode::new(dec("800"), "Rent"),
            FlowNode::new(dec("150.5"), "Groceries"),
        ];
        let root = assemble("Income", income, issues, ("Unused", None), IssueLevel::Main).unwrap();
        let last = root.issue_nodes().last().unwrap();
        assert_eq!(last, &FlowNode::new(dec("1049.5"), "Unused"));
        assert_eq!(root.issues_amount(), root.income_amount());
    }

    #[test]
    fn test_assemble_unused_pass_through_child() {
        let income = vec![FlowNode::new(dec("100"), "Salary")];
        let issues = vec![FlowNode::new(dec("40"), "Rent")];
        let root = assemble(
            "Income",
            income,
            issues,
            ("Unused", Some("Savings")),
            IssueLevel::Sub,
        )
        .unwrap();
        let unused = root.issue_nodes().last().unwrap();
        assert_eq!(unused.amount(), dec("60"));
        assert_eq!(unused.children(), &[FlowNode::new(dec("60"), "Savings")]);
    }

    #[test]
    fn test_assemble_without_surplus_adds_nothing() {
        let income = vec![FlowNode::new(dec("100"), "Salary")];
        let issues = vec![FlowNode::new(dec("100"), "Rent")];
        let root = assemble("Income", income.clone(), issues, ("Unused", None), IssueLevel::Main)
            .unwrap();
        assert_eq!(root.issue_nodes().len(), 1);

        let issues = vec![FlowNode::new(dec("150"), "Rent")];
        let root =
            assemble("Income", income, issues, ("Unused", None), IssueLevel::Main).unwrap();
        assert_eq!(root.issue_nodes().len(), 1);
        assert!(root.issues_amount() > root.income_amount());
    }

    #[test]
    fn test_assemble_level_two_needs_second_label() {
        let err = assemble("Income", vec![], vec![], ("Unused", None), IssueLevel::Sub)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_subcategory_sums_span_all_categories() {
        let csv = "\
Haupt;Unter;Betrag
Wohnen;Miete;-800,00
Wohnen;Sonstiges;-20,00
Freizeit;Kino;-30,00
Freizeit;Sonstiges;-10,00
";
        let table = TransactionTable::from_reader(csv.as_bytes(), &[]).unwrap();
        let issues = table.all();
        let categories =
            extract_categories(&issues, "Haupt", Some("Unter"), IssueLevel::Sub).unwrap();
        let nodes = build_category_nodes(
            &issues,
            &categories,
            "Haupt",
            Some("Unter"),
            IssueLevel::Sub,
            "Betrag",
        )
        .unwrap();
        let children = |ix: usize| {
            nodes[ix]
                .children()
                .iter()
                .map(|c| (c.label(), c.amount()))
                .collect::<Vec<_>>()
        };
        assert_eq!(nodes[0].amount(), dec("820"));
        assert_eq!(children(0), vec![("Miete", dec("800")), ("Sonstiges", dec("30"))]);
        assert_eq!(nodes[1].amount(), dec("40"));
        assert_eq!(children(1), vec![("Kino", dec("30")), ("Sonstiges", dec("30"))]);
    }

    #[test]
    fn test_overlapping_names() {
        let main = overlapping_names(
            [("", "Auto"), ("", "Autoversicherung"), ("", "Wohnen")].into_iter(),
        );
        assert_eq!(main, vec![("Auto".to_string(), "Autoversicherung".to_string())]);

        let subs = overlapping_names(
            [
                ("Wohnen", "Miete"),
                ("Wohnen", "Sonstiges"),
                ("Freizeit", "sonstiges"),
            ]
            .into_iter(),
        );
        assert_eq!(
            subs,
            vec![(
                "Wohnen/Sonstiges".to_string(),
                "Freizeit/sonstiges".to_string()
            )]
        );

        assert!(overlapping_names([("", "Miete"), ("", "Strom")].into_iter()).is_empty());
    }

    #[test]
    fn test_income_sum_overflow_is_an_error() {
        let csv = "Haupt;Gegenpartei;Betrag\n\
Einnahmen;ACME;79.228.162.514.264.337.593.543.950.335\n\
Einnahmen;ACME;1,00\n";
        let table = TransactionTable::from_reader(csv.as_bytes(), &[]).unwrap();
        let sources = vec![SourceFilter::new("Salary", "Gegenpartei", "acme")];
        let err = build_income_nodes(&table.all(), &sources, "Betrag", "Other").unwrap_err();
        assert!(err.is_amount_format());
    }

    #[test]
    fn test_assemble_overflow_is_an_error() {
        let income = vec![FlowNode::new(Decimal::MAX, "Salary")];
        let issues = vec![
            FlowNode::new(Decimal::MAX, "Rent"),
            FlowNode::new(Decimal::ONE, "Food"),
        ];
        let err = assemble("Income", income, issues, ("Unused", None), IssueLevel::Main)
            .unwrap_err();
        assert!(err.is_amount_format());
    }
}
