//! Toggle command - switch a rule on or off

use anyhow::Result;
use sheetdrop_core::OperationResult;

use super::get_context;
use crate::output;

pub fn run(id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let rule = ctx.rule_service.toggle(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&rule))?);
    } else if rule.is_active {
        output::success(&format!("Rule '{}' is now active", rule.name));
    } else {
        output::warning(&format!("Rule '{}' is now inactive", rule.name));
    }

    Ok(())
}
