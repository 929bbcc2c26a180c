//! Logs command - browse rule activity

use anyhow::{anyhow, Result};
use chrono::{Local, TimeZone};
use clap::Subcommand;
use colored::Colorize;
use sheetdrop_core::{FilterType, LogQuery, RuleActivity};

use super::get_logger;
use crate::output::create_table;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent entries, newest first
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only entries about this filter type
        #[arg(long = "type", short = 't')]
        filter_type: Option<FilterType>,
        /// Only this event (e.g. rule_created, rule_update_failed)
        #[arg(long)]
        event: Option<String>,
        /// Only failures
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rule events counted per filter type
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn type_text(filter_type: Option<FilterType>) -> String {
    match filter_type {
        Some(t) => format!("{} {}", t.config().icon, t.config().label),
        None => String::new(),
    }
}

pub fn run(command: LogsCommands) -> Result<()> {
    let logger = get_logger().ok_or_else(|| anyhow!("Log database is unavailable"))?;

    match command {
        LogsCommands::List {
            limit,
            filter_type,
            event,
            errors,
            json,
        } => {
            let mut query = LogQuery::recent(limit);
            if let Some(filter_type) = filter_type {
                query = query.filter_type(filter_type);
            }
            if let Some(event) = event {
                query = query.event(event);
            }
            if errors {
                query = query.errors_only();
            }
            let entries = logger.query(&query)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No matching log entries.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["Time", "Event", "Filter Type", "Command", "Error"]);
            for entry in entries {
                let event = if entry.error_message.is_some() {
                    entry.event.red().to_string()
                } else {
                    entry.event
                };
                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    event,
                    type_text(entry.filter_type),
                    entry.command.unwrap_or_default(),
                    entry.error_message.unwrap_or_default(),
                ]);
            }
            println!("{}", table);
        }
        LogsCommands::Summary { json } => {
            let activity = logger.rule_activity()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&activity)?);
                return Ok(());
            }
            print_summary(&activity);
        }
    }

    Ok(())
}

fn print_summary(activity: &[RuleActivity]) {
    let mut table = create_table();
    table.set_header(vec!["Filter Type", "Created", "Updated", "Deleted", "Rejected", "Failed"]);
    for row in activity {
        let failed = if row.failed > 0 {
            row.failed.to_string().red().to_string()
        } else {
            row.failed.to_string()
        };
        table.add_row(vec![
            type_text(Some(row.filter_type)),
            row.created.to_string(),
            row.updated.to_string(),
            row.deleted.to_string(),
            row.rejected.to_string(),
            failed,
        ]);
    }
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_text() {
        assert_eq!(type_text(None), "");
        assert_eq!(type_text(Some(FilterType::TimeBased)), "⏰ Time Based");
    }
}
