//! Types command - show the filter type registry

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sheetdrop_core::{FilterType, FilterTypeConfig};

use crate::output::create_table;

#[derive(Serialize)]
struct TypeEntry {
    key: FilterType,
    #[serde(flatten)]
    config: &'static FilterTypeConfig,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let entries: Vec<TypeEntry> = FilterType::ALL
            .into_iter()
            .map(|key| TypeEntry { key, config: key.config() })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (i, filter_type) in FilterType::ALL.into_iter().enumerate() {
        let config = filter_type.config();
        if i > 0 {
            println!();
        }
        println!(
            "{} {} {}",
            config.icon,
            config.label.bold(),
            format!("({})", filter_type).dimmed()
        );
        println!("  {}", config.description);

        let mut table = create_table();
        table.set_header(vec!["Field", "Label", "Input", "Required", "Options"]);
        for field in config.fields {
            let options = field
                .options
                .iter()
                .map(|o| o.value)
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                field.name.to_string(),
                field.label.to_string(),
                format!("{:?}", field.kind).to_lowercase(),
                if field.required { "yes" } else { "" }.to_string(),
                options,
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
