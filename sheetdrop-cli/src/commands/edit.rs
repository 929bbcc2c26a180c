//! Edit command - change an existing rule
//!
//! The rule keeps the filter type it classifies as; only that type's
//! fields can be set.

use anyhow::Result;
use sheetdrop_core::RuleForm;

use super::get_context;
use super::new::report;
use super::prompt::{apply_sets, input_name, interactive, parse_sets, prompt_fields};
use crate::output;

pub fn run(
    id: i64,
    name: Option<String>,
    sets: &[String],
    is_active: Option<bool>,
    json: bool,
) -> Result<()> {
    let sets = parse_sets(sets)?;
    let ctx = get_context()?;
    let rule = ctx.rule_service.get(id)?;

    let mut form = RuleForm::edit(&rule);
    let no_changes = name.is_none() && sets.is_empty() && is_active.is_none();

    if let Some(name) = name {
        form.set_name(name);
    }
    if let Some(is_active) = is_active {
        form.set_active(is_active);
    }
    apply_sets(&mut form, &sets)?;

    if no_changes {
        if !interactive(json) {
            output::warning("Nothing to change. Use --name, --set or --active/--inactive.");
            return Ok(());
        }
        let config = form.config();
        output::info(&format!("Editing {} {} rule", config.icon, config.label));
        let current = form.data().name.clone();
        form.set_name(input_name(&current)?);
        prompt_fields(&mut form, &[])?;
    }

    let outcome = ctx.rule_service.save(&form)?;
    report(outcome, json, "Rule updated")
}
