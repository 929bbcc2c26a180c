//! Status command - rule counts per filter type

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "SheetDrop Rules".bold());
    println!("Backend: {}", status.backend);
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Rules".to_string(), status.total_rules.to_string()]);
    table.add_row(vec!["Active".to_string(), status.active_rules.to_string()]);
    table.add_row(vec!["Inactive".to_string(), status.inactive_rules.to_string()]);

    println!("{}", table);
    println!();

    println!("{}", "By Filter Type".bold());
    for entry in &status.by_type {
        let line = format!("  {} {:<24} {}", entry.icon, entry.label, entry.count);
        if entry.count == 0 {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }

    Ok(())
}
