//! Filling a rule form from flags and interactive prompts

use anyhow::{bail, Context, Result};
use dialoguer::{Input, Select};
use sheetdrop_core::{FieldKind, FieldName, FilterField, FilterType, RuleForm};

/// Whether prompts can be shown
pub fn interactive(json: bool) -> bool {
    !json && atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Parse repeated `field=value` flags
pub fn parse_sets(sets: &[String]) -> Result<Vec<(FieldName, String)>> {
    sets.iter()
        .map(|set| {
            let (field, value) = set
                .split_once('=')
                .with_context(|| format!("Expected FIELD=VALUE, got '{}'", set))?;
            let field: FieldName = field.trim().parse()?;
            Ok((field, value.to_string()))
        })
        .collect()
}

/// Apply `field=value` flags to a form
///
/// Each field must belong to the form's filter type, and select fields
/// must hold one of their options. An empty value clears the field.
pub fn apply_sets(form: &mut RuleForm, sets: &[(FieldName, String)]) -> Result<()> {
    let config = form.config();
    for (name, value) in sets {
        let Some(field) = config.field(*name) else {
            bail!("Field '{}' is not part of the {} filter type", name, config.label);
        };
        if !value.is_empty() && !field.accepts(value) {
            let options: Vec<_> = field.options.iter().map(|o| o.value).collect();
            bail!(
                "Invalid value '{}' for {} (expected one of: {})",
                value,
                name,
                options.join(", ")
            );
        }
        form.set_field(*name, value.clone());
    }
    Ok(())
}

/// Ask for a filter type
pub fn select_filter_type() -> Result<FilterType> {
    let items: Vec<String> = FilterType::ALL
        .iter()
        .map(|t| {
            let config = t.config();
            format!("{} {} - {}", config.icon, config.label, config.description)
        })
        .collect();

    let index = Select::new()
        .with_prompt("Filter type")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(FilterType::ALL[index])
}

/// Ask for a rule name until a non-blank one is given
pub fn input_name(initial: &str) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt("Rule name");
    if !initial.is_empty() {
        input = input.with_initial_text(initial);
    }
    let name = input
        .validate_with(|v: &String| -> std::result::Result<(), &str> {
            if v.trim().is_empty() {
                Err("Rule name is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(name)
}

/// Prompt for every field of the form's type not in `skip`
pub fn prompt_fields(form: &mut RuleForm, skip: &[FieldName]) -> Result<()> {
    let config = form.config();
    for field in config.fields {
        if skip.contains(&field.name) {
            continue;
        }
        let current = form.data().value(field.name).to_string();
        let value = prompt_field(field, &current)?;
        form.set_field(field.name, value);
    }
    Ok(())
}

fn prompt_field(field: &FilterField, current: &str) -> Result<String> {
    let prompt = match field.help_text {
        Some(help) => format!("{} ({})", field.label, help),
        None => field.label.to_string(),
    };

    match field.kind {
        FieldKind::Select => {
            let mut values: Vec<&str> = Vec::new();
            let mut labels: Vec<&str> = Vec::new();
            if !field.required {
                values.push("");
                labels.push("(any)");
            }
            for option in field.options {
                values.push(option.value);
                labels.push(option.label);
            }
            let default = values.iter().position(|v| *v == current).unwrap_or(0);
            let index = Select::new()
                .with_prompt(prompt)
                .items(&labels)
                .default(default)
                .interact()?;
            Ok(values[index].to_string())
        }
        FieldKind::Switch => {
            let on = dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(current == "true")
                .interact()?;
            Ok(on.to_string())
        }
        FieldKind::Text | FieldKind::Textarea | FieldKind::Date => {
            let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(!field.required);
            if !current.is_empty() {
                input = input.with_initial_text(current);
            } else if let Some(placeholder) = field.placeholder {
                input = input.with_prompt(format!("{} [e.g. {}]", field.label, placeholder));
            }
            Ok(input.interact_text()?)
        }
    }
}
