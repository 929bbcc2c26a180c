//! DuckDB rule store
//!
//! Offline implementation of [`RuleRepository`], selected with the
//! `local` backend setting.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::types::Type;
use duckdb::{params, Connection};

use crate::domain::{FieldName, Rule, RulePayload};
use crate::ports::RuleRepository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const RULE_COLUMNS: &str = "rule_id, name, is_active,
    subject_match_type, subject_value, sender_match_type, sender_value,
    body_match_type, body_value, sender_domain, exclude_domains,
    received_after, received_before";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed rule repository
pub struct DuckDbRuleRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRuleRepository {
    /// Open (or create) the rule store at `db_path`
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[sheetdrop] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// In-memory store, used by tests and dry runs
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs one
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_rule(row: &duckdb::Row) -> duckdb::Result<Rule> {
        // 0: rule_id, 1: name, 2: is_active, 3..=12: filter fields in FieldName order
        let mut rule = Rule::new(row.get::<_, String>(1)?);
        rule.id = Some(row.get(0)?);
        rule.is_active = row.get(2)?;

        for (offset, field) in FieldName::ALL.into_iter().enumerate() {
            let column = 3 + offset;
            let value: Option<String> = row.get(column)?;
            rule.set(field, value.as_deref()).map_err(|e| {
                duckdb::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
            })?;
        }
        Ok(rule)
    }

    fn field_params(payload: &RulePayload) -> Vec<Option<String>> {
        FieldName::ALL
            .into_iter()
            .map(|f| payload.get(f).map(str::to_string))
            .collect()
    }

    fn fetch_rule(conn: &Connection, id: i64) -> Result<Option<Rule>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_rules WHERE rule_id = ?",
            RULE_COLUMNS
        ))?;
        let mut rows = stmt.query_map([id], |row| Self::row_to_rule(row))?;
        Ok(rows.next().transpose()?)
    }
}

impl RuleRepository for DuckDbRuleRepository {
    fn name(&self) -> &str {
        "local"
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_rules ORDER BY rule_id",
            RULE_COLUMNS
        ))?;

        let rules = stmt
            .query_map([], |row| Self::row_to_rule(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;

        Ok(rules)
    }

    fn get_rule(&self, id: i64) -> Result<Option<Rule>> {
        let conn = self.lock()?;
        Self::fetch_rule(&conn, id)
    }

    fn create_rule(&self, payload: &RulePayload) -> Result<Rule> {
        // Parse first so a bad match type never reaches the table
        let mut rule = Rule::from_payload(None, payload)?;
        let f = Self::field_params(payload);
        let now = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        let id: i64 = conn.query_row(
            "INSERT INTO sys_rules (name, is_active,
                 subject_match_type, subject_value, sender_match_type, sender_value,
                 body_match_type, body_value, sender_domain, exclude_domains,
                 received_after, received_before, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING rule_id",
            params![
                payload.name,
                payload.is_active,
                f[0], f[1], f[2], f[3], f[4], f[5], f[6], f[7], f[8], f[9],
                now,
                now,
            ],
            |row| row.get(0),
        )?;

        rule.id = Some(id);
        Ok(rule)
    }

    fn update_rule(&self, id: i64, payload: &RulePayload) -> Result<Rule> {
        let rule = Rule::from_payload(Some(id), payload)?;
        let f = Self::field_params(payload);
        let now = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE sys_rules SET
                name = ?, is_active = ?,
                subject_match_type = ?, subject_value = ?,
                sender_match_type = ?, sender_value = ?,
                body_match_type = ?, body_value = ?,
                sender_domain = ?, exclude_domains = ?,
                received_after = ?, received_before = ?,
                updated_at = ?
             WHERE rule_id = ?",
            params![
                payload.name,
                payload.is_active,
                f[0], f[1], f[2], f[3], f[4], f[5], f[6], f[7], f[8], f[9],
                now,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(crate::domain::result::Error::not_found(format!("rule {}", id)).into());
        }
        Ok(rule)
    }

    fn delete_rule(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM sys_rules WHERE rule_id = ?", params![id])?;
        Ok(rows > 0)
    }
}
