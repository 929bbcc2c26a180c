//! Remove command - delete a rule

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use sheetdrop_core::RuleDisplayInfo;

use super::{get_context, type_cell};

pub fn run(id: i64, force: bool) -> Result<()> {
    let ctx = get_context()?;
    // Delete events take the filter type from the cached list
    ctx.rule_service.refresh()?;
    let rule = ctx.rule_service.get(id)?;

    // Confirm removal unless --force
    if !force {
        let info = RuleDisplayInfo::from_rule(&rule);
        println!(
            "\n{}",
            format!("This will delete the rule '{}'.", rule.name).yellow()
        );
        println!("{}\n", format!("{}  {}", type_cell(&info), info.details).dimmed());

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    if ctx.rule_service.delete(id)? {
        println!("{} Rule '{}' removed", "✓".green(), rule.name);
    } else {
        println!("{}", format!("Rule {} was already gone", id).dimmed());
    }

    Ok(())
}
