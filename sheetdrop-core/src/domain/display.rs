//! One-line rule summaries for list views

use serde::Serialize;

use super::filter_type::FilterType;
use super::rule::Rule;

/// Label, icon and detail line for a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDisplayInfo {
    pub filter_type: FilterType,
    pub label: &'static str,
    pub icon: &'static str,
    pub details: String,
}

impl RuleDisplayInfo {
    pub fn from_rule(rule: &Rule) -> Self {
        let filter_type = rule.filter_type();
        let config = filter_type.config();

        let mut details = String::new();
        let labelled = [
            ("Subject", &rule.subject_value),
            ("Sender", &rule.sender_value),
            ("Body", &rule.body_value),
            ("Domain", &rule.sender_domain),
            ("Exclude", &rule.exclude_domains),
        ];
        for (prefix, value) in labelled {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                details.push_str(&format!("{}: {} ", prefix, v));
            }
        }

        let after = date_part(rule.received_after.as_deref());
        let before = date_part(rule.received_before.as_deref());
        match (after.is_empty(), before.is_empty()) {
            (false, false) => details.push_str(&format!("Time: {} - {} ", after, before)),
            (false, true) => details.push_str(&format!("After: {} ", after)),
            (true, false) => details.push_str(&format!("Before: {} ", before)),
            (true, true) => {}
        }

        Self {
            filter_type,
            label: config.label,
            icon: config.icon,
            details: details.trim_end().to_string(),
        }
    }
}

/// Date portion of an ISO-8601 datetime: everything before the first `T`
fn date_part(iso: Option<&str>) -> &str {
    match iso {
        Some(s) if !s.trim().is_empty() => s.split('T').next().unwrap_or(""),
        _ => "",
    }
}
