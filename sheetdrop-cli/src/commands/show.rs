//! Show command - print a single rule

use anyhow::Result;
use colored::Colorize;
use sheetdrop_core::{Rule, RuleDisplayInfo};

use super::list::RuleView;
use super::{get_context, id_text, status_text, type_cell};

pub fn run(id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let rule = ctx.rule_service.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&RuleView::new(rule))?);
        return Ok(());
    }

    print_rule(&rule);
    Ok(())
}

/// Human-readable rule summary, shared by the commands that save rules
pub fn print_rule(rule: &Rule) {
    let info = RuleDisplayInfo::from_rule(rule);
    let config = info.filter_type.config();

    println!("{} {}", rule.name.bold(), format!("#{}", id_text(rule)).dimmed());
    println!("  Type:    {}", type_cell(&info));
    println!("  Status:  {}", status_text(rule));
    println!("  Matches: {}", rule.filter().describe());

    let fields: Vec<_> = rule.populated_fields().collect();
    if !fields.is_empty() {
        println!();
        for (name, value) in fields {
            let label = config.field(name).map(|f| f.label).unwrap_or(name.as_str());
            println!("  {:<18} {}", format!("{}:", label), value);
        }
    }
}
