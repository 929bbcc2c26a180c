//! Rule repository port - where rules live

use anyhow::Result;

use crate::domain::{Rule, RulePayload};

/// Rule storage abstraction
///
/// Implementations store only the flat field set of a rule. The filter
/// type is never persisted; it is derived again on every read.
pub trait RuleRepository: Send + Sync {
    /// Repository name (e.g., "local", "remote")
    fn name(&self) -> &str;

    /// All rules, oldest first
    fn list_rules(&self) -> Result<Vec<Rule>>;

    /// Get a rule by ID
    fn get_rule(&self, id: i64) -> Result<Option<Rule>>;

    /// Create a rule from a payload, returning it with its assigned ID
    fn create_rule(&self, payload: &RulePayload) -> Result<Rule>;

    /// Replace a rule's name, status and filter fields with the payload
    ///
    /// Filter fields missing from the payload are cleared.
    fn update_rule(&self, id: i64, payload: &RulePayload) -> Result<Rule>;

    /// Delete a rule. Returns false if it did not exist.
    fn delete_rule(&self, id: i64) -> Result<bool>;
}
