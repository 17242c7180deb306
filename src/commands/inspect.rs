use crate::args::InspectArgs;
use crate::commands::{resolve_period, Out};
use crate::model::{Amount, FlowNode, RootNode};
use crate::Config;
use anyhow::{Context, Result};
use std::fmt::Write;

/// Parses the export for the requested period and returns the flow graph, rendered as an
/// indented tree or as JSON.
pub fn inspect(config: &Config, args: &InspectArgs) -> Result<Out<RootNode>> {
    let (period, level) = resolve_period(config, args.period())?;
    let root = config
        .parser()
        .parse_period(period, level)
        .with_context(|| format!("Unable to parse {}", config.input_file().display()))?;

    let message = if args.json() {
        serde_json::to_string_pretty(&root).context("Unable to serialize the flow graph")?
    } else {
        format!("Sankey {period}\n{}", tree(&root))
    };
    Ok(Out::new(message, root))
}

/// Income nodes are marked with `<-`, issue nodes with `->`, children are indented below their
/// parent.
fn tree(root: &RootNode) -> String {
    let mut s = format!("{} {}\n", root.label(), Amount::from(root.income_amount()));
    for node in root.income_nodes() {
        let _ = writeln!(s, "  <- {} {}", node.label(), Amount::from(node.amount()));
    }
    for node in root.issue_nodes() {
        write_issue(&mut s, node, 1);
    }
    s
}

fn write_issue(s: &mut String, node: &FlowNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(s, "{indent}-> {} {}", node.label(), Amount::from(node.amount()));
    for child in node.children() {
        write_issue(s, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PeriodArgs;
    use crate::test::{TestEnv, SCENARIO_CSV};

    #[test]
    fn test_inspect_tree() {
        let env = TestEnv::new(SCENARIO_CSV);
        let args = InspectArgs::new(PeriodArgs::new(Some(2024), Some(3), Some(2)), false);
        let out = inspect(&env.config(), &args).unwrap();
        let expected = "\
Sankey 2024-03
Income 2.000,00
  <- Salary 2.000,00
  <- other income 0,00
  -> Rent 800,00
    -> Flat 800,00
  -> Groceries 150,50
    -> Supermarket 120,50
    -> Bakery 30,00
  -> unused 1.049,50
    -> unused income 1.049,50
";
        assert_eq!(out.message(), expected);
        assert_eq!(out.structure().unwrap().issue_nodes().len(), 3);
    }

    #[test]
    fn test_inspect_json() {
        let env = TestEnv::new(SCENARIO_CSV);
        let args = InspectArgs::new(PeriodArgs::new(Some(2024), Some(3), Some(1)), true);
        let out = inspect(&env.config(), &args).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.message()).unwrap();
        assert_eq!(value["label"], "Income");
        assert_eq!(value["income_nodes"][0]["label"], "Salary");
        assert_eq!(value["issue_nodes"][1]["amount"], "150.50");
    }

    #[test]
    fn test_inspect_does_not_remember_period() {
        let env = TestEnv::new(SCENARIO_CSV);
        let args = InspectArgs::new(PeriodArgs::new(Some(2024), None, Some(1)), false);
        inspect(&env.config(), &args).unwrap();
        assert!(env.config().last_used().is_none());
    }
}
