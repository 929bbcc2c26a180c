//! Rule activity log
//!
//! Every rule operation leaves an event in logs.duckdb naming what
//! happened and the filter type it concerned. Rule names and field values
//! are never logged, so the log can be shared when reporting a problem.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::types::Type;
use duckdb::{Connection, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::FilterType;
use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::MigrationService;

/// Event names written by the rule service and the CLI
pub mod events {
    pub const RULE_CREATED: &str = "rule_created";
    pub const RULE_UPDATED: &str = "rule_updated";
    pub const RULE_DELETED: &str = "rule_deleted";
    pub const RULE_REJECTED: &str = "rule_rejected";
    pub const RULE_CREATE_FAILED: &str = "rule_create_failed";
    pub const RULE_UPDATE_FAILED: &str = "rule_update_failed";
    pub const RULE_DELETE_FAILED: &str = "rule_delete_failed";
    pub const RULES_LOAD_FAILED: &str = "rules_load_failed";
    pub const COMMAND_EXECUTED: &str = "command_executed";
    pub const COMMAND_FAILED: &str = "command_failed";
}

/// Who wrote an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Library,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Library => "library",
        }
    }
}

/// An event about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub event: String,
    pub filter_type: Option<FilterType>,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            filter_type: None,
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn with_filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = Some(filter_type);
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Cause chain or other context for the error
    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A recorded event
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    /// Unix milliseconds
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub event: String,
    pub filter_type: Option<FilterType>,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEntry {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        let filter_type = row
            .get::<_, Option<String>>(5)?
            .map(|key| key.parse::<FilterType>())
            .transpose()
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(LogEntry {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            entry_point: row.get(2)?,
            app_version: row.get(3)?,
            event: row.get(4)?,
            filter_type,
            command: row.get(6)?,
            error_message: row.get(7)?,
            error_details: row.get(8)?,
        })
    }
}

const LOG_COLUMNS: &str = "id, timestamp, entry_point, app_version, event,
    filter_type, command, error_message, error_details";

/// Which entries to read, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub limit: usize,
    pub errors_only: bool,
    pub event: Option<String>,
    pub filter_type: Option<FilterType>,
}

impl LogQuery {
    /// The latest `limit` entries of any kind
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            errors_only: false,
            event: None,
            filter_type: None,
        }
    }

    pub fn errors_only(mut self) -> Self {
        self.errors_only = true;
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = Some(filter_type);
        self
    }

    fn to_sql(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if self.errors_only {
            clauses.push("error_message IS NOT NULL");
        }
        if let Some(event) = &self.event {
            clauses.push("event = ?");
            params.push(Box::new(event.clone()));
        }
        if let Some(filter_type) = self.filter_type {
            clauses.push("filter_type = ?");
            params.push(Box::new(filter_type.as_str().to_string()));
        }
        params.push(Box::new(self.limit as i64));

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM sys_logs {} ORDER BY timestamp DESC, id DESC LIMIT ?",
            LOG_COLUMNS, filter
        );
        (sql, params)
    }
}

/// Rule event counts for one filter type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleActivity {
    pub filter_type: FilterType,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl RuleActivity {
    fn empty(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            created: 0,
            updated: 0,
            deleted: 0,
            rejected: 0,
            failed: 0,
        }
    }

    fn add(&mut self, event: &str, count: u64) {
        match event {
            events::RULE_CREATED => self.created += count,
            events::RULE_UPDATED => self.updated += count,
            events::RULE_DELETED => self.deleted += count,
            events::RULE_REJECTED => self.rejected += count,
            events::RULE_CREATE_FAILED | events::RULE_UPDATE_FAILED | events::RULE_DELETE_FAILED => {
                self.failed += count
            }
            _ => {}
        }
    }
}

/// Writes and reads the activity log
pub struct LoggingService {
    conn: Mutex<Connection>,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    /// Open or create logs.duckdb in `sheetdrop_dir`
    pub fn new(
        sheetdrop_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let conn = Connection::open(sheetdrop_dir.join("logs.duckdb"))?;
        MigrationService::with_migrations(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            entry_point,
            app_version: app_version.into(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sys_logs (
                timestamp, entry_point, app_version, platform,
                event, filter_type, command, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                Utc::now().timestamp_millis(),
                self.entry_point.as_str(),
                &self.app_version,
                std::env::consts::OS,
                &event.event,
                event.filter_type.map(|t| t.as_str()),
                &event.command,
                &event.error_message,
                &event.error_details,
            ],
        )?;
        Ok(())
    }

    pub fn query(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let (sql, params) = query.to_sql();
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(param_refs.as_slice(), |row| LogEntry::from_row(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Rule event counts for every filter type, in registry order
    pub fn rule_activity(&self) -> Result<Vec<RuleActivity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT filter_type, event, COUNT(*) FROM sys_logs
             WHERE filter_type IS NOT NULL
             GROUP BY filter_type, event",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        let mut activity: Vec<RuleActivity> =
            FilterType::ALL.into_iter().map(RuleActivity::empty).collect();
        for (key, event, count) in counts {
            // Entries from a newer release may name types this one lacks
            let Ok(filter_type) = key.parse::<FilterType>() else {
                continue;
            };
            if let Some(row) = activity.iter_mut().find(|a| a.filter_type == filter_type) {
                row.add(&event, count.max(0) as u64);
            }
        }
        Ok(activity)
    }
}
