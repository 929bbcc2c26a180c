//! SheetDrop CLI - email filtering rules in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{classify, config, edit, list, logs, new, remove, show, status, toggle, types};
use sheetdrop_core::config::Backend;

/// SheetDrop - email filtering rules in your terminal
#[derive(Parser)]
#[command(name = "sd", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available filter types and their fields
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List rules
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single rule
    Show {
        /// Rule ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a rule, prompting for anything not given
    New {
        /// Filter type (subject_only, sender_only, body_only, domain_exclude, time_based, multiple_fields)
        #[arg(long = "type", short = 't')]
        filter_type: Option<String>,
        /// Rule name
        #[arg(long, short)]
        name: Option<String>,
        /// Field value as field=value (repeatable)
        #[arg(long = "set", short = 's', value_name = "FIELD=VALUE")]
        sets: Vec<String>,
        /// Create the rule switched off
        #[arg(long)]
        inactive: bool,
        /// Output as JSON (never prompts)
        #[arg(long)]
        json: bool,
    },

    /// Edit a rule; its filter type stays fixed
    Edit {
        /// Rule ID
        id: i64,
        /// New rule name
        #[arg(long, short)]
        name: Option<String>,
        /// Field value as field=value, empty value clears (repeatable)
        #[arg(long = "set", short = 's', value_name = "FIELD=VALUE")]
        sets: Vec<String>,
        /// Switch the rule on
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        /// Switch the rule off
        #[arg(long)]
        inactive: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Switch a rule on or off
    Toggle {
        /// Rule ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a rule
    Remove {
        /// Rule ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Classify rule JSON from a file or stdin
    Classify {
        /// JSON file holding a rule or a list of rules
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show rule counts per filter type
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings (backend, API URL, token)
    Config {
        /// Rule store: remote (SheetDrop API) or local (offline)
        #[arg(long)]
        backend: Option<Backend>,
        /// SheetDrop API base URL
        #[arg(long)]
        api_url: Option<String>,
        /// API token
        #[arg(long, conflicts_with = "clear_token")]
        token: Option<String>,
        /// Forget the stored API token
        #[arg(long)]
        clear_token: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse rule activity logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Types { .. } => "types",
            Commands::List { .. } => "list",
            Commands::Show { .. } => "show",
            Commands::New { .. } => "new",
            Commands::Edit { .. } => "edit",
            Commands::Toggle { .. } => "toggle",
            Commands::Remove { .. } => "remove",
            Commands::Classify { .. } => "classify",
            Commands::Status { .. } => "status",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.name();

    let logger = commands::get_logger();
    commands::log_command(&logger, command);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_error(&logger, command, &e);
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Types { json } => types::run(json),
        Commands::List { json } => list::run(json),
        Commands::Show { id, json } => show::run(id, json),
        Commands::New { filter_type, name, sets, inactive, json } => {
            new::run(filter_type.as_deref(), name, &sets, inactive, json)
        }
        Commands::Edit { id, name, sets, active, inactive, json } => {
            let is_active = match (active, inactive) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            edit::run(id, name, &sets, is_active, json)
        }
        Commands::Toggle { id, json } => toggle::run(id, json),
        Commands::Remove { id, force } => remove::run(id, force),
        Commands::Classify { file, json } => classify::run(file.as_deref(), json),
        Commands::Status { json } => status::run(json),
        Commands::Config { backend, api_url, token, clear_token, json } => config::run(
            config::ConfigChanges {
                backend,
                api_url,
                token,
                clear_token,
            },
            json,
        ),
        Commands::Logs { command } => logs::run(command),
    }
}
