//! Status service - rule counts per filter type

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::domain::{FilterType, Rule};
use crate::ports::RuleRepository;

/// Status service for rule summaries
pub struct StatusService {
    repository: Arc<dyn RuleRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let rules = self.repository.list_rules()?;
        Ok(StatusSummary::from_rules(self.repository.name(), &rules))
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub backend: String,
    pub total_rules: usize,
    pub active_rules: usize,
    pub inactive_rules: usize,
    /// One entry per filter type, in registry order, including empty ones
    pub by_type: Vec<TypeCount>,
}

#[derive(Debug, Serialize)]
pub struct TypeCount {
    pub filter_type: FilterType,
    pub label: &'static str,
    pub icon: &'static str,
    pub count: usize,
}

impl StatusSummary {
    pub fn from_rules(backend: &str, rules: &[Rule]) -> Self {
        let active_rules = rules.iter().filter(|r| r.is_active).count();
        let by_type = FilterType::ALL
            .into_iter()
            .map(|t| {
                let config = t.config();
                TypeCount {
                    filter_type: t,
                    label: config.label,
                    icon: config.icon,
                    count: rules.iter().filter(|r| r.filter_type() == t).count(),
                }
            })
            .collect();

        Self {
            backend: backend.to_string(),
            total_rules: rules.len(),
            active_rules,
            inactive_rules: rules.len() - active_rules,
            by_type,
        }
    }
}
