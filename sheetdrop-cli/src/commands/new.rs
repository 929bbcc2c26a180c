//! New command - create a rule

use anyhow::{bail, Result};
use sheetdrop_core::{FilterType, OperationResult, Rule, RuleForm, Submission};

use super::get_context;
use super::prompt::{apply_sets, input_name, interactive, parse_sets, prompt_fields, select_filter_type};
use super::show::print_rule;
use crate::output;

pub fn run(
    filter_type: Option<&str>,
    name: Option<String>,
    sets: &[String],
    inactive: bool,
    json: bool,
) -> Result<()> {
    let sets = parse_sets(sets)?;
    let prompting = interactive(json);

    let filter_type = match filter_type {
        Some(key) => key.parse::<FilterType>()?,
        None if prompting => select_filter_type()?,
        None => bail!("No filter type given. Use --type (see `sd types`)."),
    };

    let mut form = RuleForm::new(filter_type);
    form.set_active(!inactive);
    apply_sets(&mut form, &sets)?;

    match name {
        Some(name) => form.set_name(name),
        None if prompting => form.set_name(input_name("")?),
        None => {}
    }

    if prompting {
        let given: Vec<_> = sets.iter().map(|(field, _)| *field).collect();
        prompt_fields(&mut form, &given)?;
    }

    let ctx = get_context()?;
    let outcome = ctx.rule_service.save(&form)?;
    report(outcome, json, "Rule created")
}

/// Print the outcome of a save; a rejected form is a command failure
pub fn report(outcome: Submission<Rule>, json: bool, done: &str) -> Result<()> {
    match outcome {
        Submission::Saved(rule) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(rule))?);
            } else {
                output::success(done);
                print_rule(&rule);
            }
            Ok(())
        }
        Submission::Rejected(reason) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&OperationResult::<Rule>::fail(reason.clone()))?
                );
            }
            bail!(reason)
        }
    }
}
