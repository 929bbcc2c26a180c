//! Rule service - keeps a rule list in step with the repository
//!
//! Saves go through [`RuleForm::submit`], so a form that fails validation
//! never reaches the repository. After every successful write the cached
//! list is patched in place: created rules are appended, updated rules
//! replace their entry and deleted rules are dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use crate::domain::result::Error;
use crate::domain::{FilterType, Rule, RuleForm, RulePayload, Submission};
use crate::ports::RuleRepository;
use crate::services::logging::{events, LogEvent, LoggingService};

pub struct RuleService {
    repository: Arc<dyn RuleRepository>,
    rules: Mutex<Vec<Rule>>,
    logger: Option<Arc<LoggingService>>,
}

impl RuleService {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self {
            repository,
            rules: Mutex::new(Vec::new()),
            logger: None,
        }
    }

    /// Record rule events in `logger`
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Name of the backing repository
    pub fn backend(&self) -> &str {
        self.repository.name()
    }

    fn cache(&self) -> Result<MutexGuard<'_, Vec<Rule>>> {
        self.rules.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            // Logging must never fail a rule operation
            let _ = logger.log(event);
        }
    }

    fn log_failure(&self, event: &str, filter_type: Option<FilterType>, err: &anyhow::Error) {
        let mut entry = LogEvent::new(event).with_error(err.to_string());
        if let Some(filter_type) = filter_type {
            entry = entry.with_filter_type(filter_type);
        }
        self.log(entry);
    }

    /// Reload the rule list from the repository
    pub fn refresh(&self) -> Result<Vec<Rule>> {
        let loaded = self.repository.list_rules().map_err(|e| {
            self.log_failure(events::RULES_LOAD_FAILED, None, &e);
            e
        })?;
        let mut cache = self.cache()?;
        *cache = loaded.clone();
        Ok(loaded)
    }

    /// The cached rule list, as of the last refresh or write
    pub fn rules(&self) -> Result<Vec<Rule>> {
        Ok(self.cache()?.clone())
    }

    /// Find a rule, asking the repository when it is not cached
    pub fn get(&self, id: i64) -> Result<Rule> {
        if let Some(rule) = self.cache()?.iter().find(|r| r.id == Some(id)) {
            return Ok(rule.clone());
        }
        self.repository
            .get_rule(id)?
            .ok_or_else(|| Error::not_found(format!("Rule {}", id)).into())
    }

    /// Validate and save a form
    ///
    /// A form editing a saved rule updates it; anything else creates a new
    /// rule. Validation failures come back as [`Submission::Rejected`].
    pub fn save(&self, form: &RuleForm) -> Result<Submission<Rule>> {
        let editing_id = form.editing().and_then(|r| r.id);
        let outcome = form.submit(|payload| match editing_id {
            Some(id) => self.update(id, &payload),
            None => self.create(&payload),
        })?;

        if let Submission::Rejected(reason) = &outcome {
            self.log(
                LogEvent::new(events::RULE_REJECTED)
                    .with_filter_type(form.filter_type())
                    .with_error(reason.clone()),
            );
        }
        Ok(outcome)
    }

    /// Create a rule and append it to the list
    pub fn create(&self, payload: &RulePayload) -> Result<Rule> {
        let rule = self.repository.create_rule(payload).map_err(|e| {
            self.log_failure(events::RULE_CREATE_FAILED, payload_type(payload), &e);
            e
        })?;

        self.cache()?.push(rule.clone());
        self.log(LogEvent::new(events::RULE_CREATED).with_filter_type(rule.filter_type()));
        Ok(rule)
    }

    /// Replace a rule and its entry in the list
    pub fn update(&self, id: i64, payload: &RulePayload) -> Result<Rule> {
        let rule = self.repository.update_rule(id, payload).map_err(|e| {
            self.log_failure(events::RULE_UPDATE_FAILED, payload_type(payload), &e);
            e
        })?;

        let mut cache = self.cache()?;
        match cache.iter_mut().find(|r| r.id == Some(id)) {
            Some(existing) => *existing = rule.clone(),
            None => cache.push(rule.clone()),
        }
        drop(cache);

        self.log(LogEvent::new(events::RULE_UPDATED).with_filter_type(rule.filter_type()));
        Ok(rule)
    }

    /// Delete a rule. Returns false if the repository did not know it.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let filter_type = self
            .cache()?
            .iter()
            .find(|r| r.id == Some(id))
            .map(Rule::filter_type);
        let deleted = self.repository.delete_rule(id).map_err(|e| {
            self.log_failure(events::RULE_DELETE_FAILED, filter_type, &e);
            e
        })?;

        self.cache()?.retain(|r| r.id != Some(id));
        if deleted {
            let mut entry = LogEvent::new(events::RULE_DELETED);
            if let Some(filter_type) = filter_type {
                entry = entry.with_filter_type(filter_type);
            }
            self.log(entry);
        }
        Ok(deleted)
    }

    /// Flip a rule between active and inactive, keeping its fields
    pub fn toggle(&self, id: i64) -> Result<Rule> {
        let rule = self.get(id)?;
        let mut payload = RulePayload::from_rule(&rule);
        payload.is_active = !rule.is_active;
        self.update(id, &payload)
    }
}

/// Filter type a payload would be saved as
fn payload_type(payload: &RulePayload) -> Option<FilterType> {
    Rule::from_payload(None, payload).ok().map(|r| r.filter_type())
}
