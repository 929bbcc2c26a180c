//! List command - show all rules

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sheetdrop_core::{Rule, RuleDisplayInfo};

use super::{get_context, id_text, status_text, type_cell};
use crate::output::create_table;

/// A rule with its derived display fields
#[derive(Serialize)]
pub struct RuleView {
    #[serde(flatten)]
    pub rule: Rule,
    pub display: RuleDisplayInfo,
}

impl RuleView {
    pub fn new(rule: Rule) -> Self {
        let display = RuleDisplayInfo::from_rule(&rule);
        Self { rule, display }
    }
}

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let rules = ctx.rule_service.refresh()?;

    if json {
        let views: Vec<RuleView> = rules.into_iter().map(RuleView::new).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules yet. Create one with {}", "sd new".bold());
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["ID", "Name", "Type", "Details", "Status"]);

    for rule in &rules {
        let info = RuleDisplayInfo::from_rule(rule);
        let status = if rule.is_active {
            status_text(rule).green().to_string()
        } else {
            status_text(rule).dimmed().to_string()
        };
        table.add_row(vec![
            id_text(rule),
            rule.name.clone(),
            type_cell(&info),
            info.details,
            status,
        ]);
    }

    println!("{}", table);
    println!(
        "{}",
        format!("{} rules ({} backend)", rules.len(), ctx.rule_service.backend()).dimmed()
    );

    Ok(())
}
