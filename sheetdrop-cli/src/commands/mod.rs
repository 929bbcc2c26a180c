//! CLI command implementations

pub mod classify;
pub mod config;
pub mod edit;
pub mod list;
pub mod logs;
pub mod new;
pub mod remove;
pub mod show;
pub mod status;
pub mod toggle;
pub mod types;

mod prompt;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use sheetdrop_core::services::events;
use sheetdrop_core::{EntryPoint, LogEvent, LoggingService, Rule, RuleDisplayInfo, SheetDropContext};

static LOGGER: OnceLock<Option<Arc<LoggingService>>> = OnceLock::new();

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations).
/// The service is opened once per process and shared.
pub fn get_logger() -> Option<Arc<LoggingService>> {
    LOGGER
        .get_or_init(|| {
            let sheetdrop_dir = get_sheetdrop_dir().ok()?;
            std::fs::create_dir_all(&sheetdrop_dir).ok()?;
            LoggingService::new(&sheetdrop_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
                .ok()
                .map(Arc::new)
        })
        .clone()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

pub fn log_command(logger: &Option<Arc<LoggingService>>, command: &str) {
    log_event(logger, LogEvent::new(events::COMMAND_EXECUTED).with_command(command));
}

pub fn log_error(logger: &Option<Arc<LoggingService>>, command: &str, error: &anyhow::Error) {
    let details = error
        .chain()
        .skip(1)
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>();
    let mut event = LogEvent::new(events::COMMAND_FAILED)
        .with_command(command)
        .with_error(error.to_string());
    if !details.is_empty() {
        event = event.with_error_details(details.join(": "));
    }
    log_event(logger, event);
}

/// Get the sheetdrop directory from environment or default
pub fn get_sheetdrop_dir() -> Result<PathBuf> {
    sheetdrop_core::config::sheetdrop_dir()
}

/// Get sheetdrop context, with the shared logger attached
pub fn get_context() -> Result<SheetDropContext> {
    let sheetdrop_dir = get_sheetdrop_dir()?;

    std::fs::create_dir_all(&sheetdrop_dir)
        .with_context(|| format!("Failed to create sheetdrop directory: {:?}", sheetdrop_dir))?;

    let ctx = SheetDropContext::new(&sheetdrop_dir)
        .context("Failed to initialize sheetdrop context")?;

    Ok(match get_logger() {
        Some(logger) => ctx.with_logger(logger),
        None => ctx,
    })
}

/// "icon label" for a rule's filter type
pub fn type_cell(info: &RuleDisplayInfo) -> String {
    format!("{} {}", info.icon, info.label)
}

/// "Active" or "Inactive"
pub fn status_text(rule: &Rule) -> &'static str {
    if rule.is_active {
        "Active"
    } else {
        "Inactive"
    }
}

/// Display form of a rule ID, "-" for unsaved rules
pub fn id_text(rule: &Rule) -> String {
    rule.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}
