//! Classify command - derive filter types for rule JSON
//!
//! Works offline: no store or backend is touched.

use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sheetdrop_core::{Rule, RuleDisplayInfo, RuleFilter};

use super::{id_text, type_cell};
use crate::output::create_table;

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Many(Vec<Rule>),
    Wrapped { data: Vec<Rule> },
    One(Rule),
}

#[derive(Serialize)]
struct Classified {
    name: String,
    #[serde(flatten)]
    display: RuleDisplayInfo,
    filter: RuleFilter,
}

fn read_input(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read rules from stdin")?;
        Ok(buffer)
    } else {
        bail!("No rules provided. Pass a JSON file or pipe JSON on stdin.");
    }
}

fn parse_rules(content: &str) -> Result<Vec<Rule>> {
    let input: Input = serde_json::from_str(content).context("Input is not rule JSON")?;
    Ok(match input {
        Input::Many(rules) | Input::Wrapped { data: rules } => rules,
        Input::One(rule) => vec![rule],
    })
}

pub fn run(file: Option<&Path>, json: bool) -> Result<()> {
    let rules = parse_rules(&read_input(file)?)?;

    if json {
        let classified: Vec<Classified> = rules
            .iter()
            .map(|rule| Classified {
                name: rule.name.clone(),
                display: RuleDisplayInfo::from_rule(rule),
                filter: rule.filter(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["ID", "Name", "Type", "Matches"]);
    for rule in &rules {
        let info = RuleDisplayInfo::from_rule(rule);
        table.add_row(vec![
            id_text(rule),
            rule.name.clone(),
            type_cell(&info),
            rule.filter().describe(),
        ]);
    }
    println!("{}", table);

    Ok(())
}
