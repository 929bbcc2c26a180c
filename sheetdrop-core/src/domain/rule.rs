//! Filtering rule domain entity
//!
//! Rules are stored and exchanged as a flat bag of optional fields. The
//! filter type is a view over which fields are populated, computed by
//! [`classify`]; [`Rule::filter`] then materializes the typed variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::field::FieldName;
use super::filter_type::FilterType;
use super::form::RulePayload;
use super::result::{Error, Result};

/// How a text field is compared against an email
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    StartsWith,
    EndsWith,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Contains => "contains",
            MatchType::Exact => "exact",
            MatchType::StartsWith => "starts_with",
            MatchType::EndsWith => "ends_with",
        }
    }

    /// Human readable phrase used in rule descriptions
    pub fn phrase(&self) -> &'static str {
        match self {
            MatchType::Contains => "contains",
            MatchType::Exact => "is exactly",
            MatchType::StartsWith => "starts with",
            MatchType::EndsWith => "ends with",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "contains" => Ok(MatchType::Contains),
            "exact" => Ok(MatchType::Exact),
            "starts_with" => Ok(MatchType::StartsWith),
            "ends_with" => Ok(MatchType::EndsWith),
            _ => Err(Error::InvalidMatchType(s.to_string())),
        }
    }
}

/// `null`, a missing key and `""` all mean "not set"
fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) if !s.is_empty() => s.parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn default_active() -> bool {
    true
}

/// Whether an optional text value counts as populated
pub(crate) fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

/// A persisted email filtering rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Assigned by the backend; absent for unsaved rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub subject_match_type: Option<MatchType>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub subject_value: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub sender_match_type: Option<MatchType>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub sender_value: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub body_match_type: Option<MatchType>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub body_value: Option<String>,
    /// Only mail from this domain is considered
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub sender_domain: Option<String>,
    /// Comma-separated list of domains to skip
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub exclude_domains: Option<String>,
    /// ISO-8601 datetime
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub received_after: Option<String>,
    /// ISO-8601 datetime
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub received_before: Option<String>,
}

impl Rule {
    /// Create an active rule with no filter fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_active: true,
            subject_match_type: None,
            subject_value: None,
            sender_match_type: None,
            sender_value: None,
            body_match_type: None,
            body_value: None,
            sender_domain: None,
            exclude_domains: None,
            received_after: None,
            received_before: None,
        }
    }

    /// Build a rule from a save payload, replacing every filter field
    pub fn from_payload(id: Option<i64>, payload: &RulePayload) -> Result<Self> {
        let mut rule = Rule::new(payload.name.clone());
        rule.id = id;
        rule.is_active = payload.is_active;
        for (field, value) in &payload.fields {
            rule.set(*field, Some(value.as_str()))?;
        }
        Ok(rule)
    }

    /// Read a field as the string a form would hold
    pub fn get(&self, field: FieldName) -> Option<&str> {
        match field {
            FieldName::SubjectMatchType => self.subject_match_type.as_ref().map(MatchType::as_str),
            FieldName::SubjectValue => self.subject_value.as_deref(),
            FieldName::SenderMatchType => self.sender_match_type.as_ref().map(MatchType::as_str),
            FieldName::SenderValue => self.sender_value.as_deref(),
            FieldName::BodyMatchType => self.body_match_type.as_ref().map(MatchType::as_str),
            FieldName::BodyValue => self.body_value.as_deref(),
            FieldName::SenderDomain => self.sender_domain.as_deref(),
            FieldName::ExcludeDomains => self.exclude_domains.as_deref(),
            FieldName::ReceivedAfter => self.received_after.as_deref(),
            FieldName::ReceivedBefore => self.received_before.as_deref(),
        }
    }

    /// Set or clear a field from its string form
    ///
    /// An empty string clears the field. Match type fields must hold one
    /// of the known match type keys.
    pub fn set(&mut self, field: FieldName, value: Option<&str>) -> Result<()> {
        let text = value.filter(|v| !v.is_empty()).map(str::to_string);
        let match_type = |v: &Option<String>| -> Result<Option<MatchType>> {
            v.as_deref().map(str::parse::<MatchType>).transpose()
        };

        match field {
            FieldName::SubjectMatchType => self.subject_match_type = match_type(&text)?,
            FieldName::SubjectValue => self.subject_value = text,
            FieldName::SenderMatchType => self.sender_match_type = match_type(&text)?,
            FieldName::SenderValue => self.sender_value = text,
            FieldName::BodyMatchType => self.body_match_type = match_type(&text)?,
            FieldName::BodyValue => self.body_value = text,
            FieldName::SenderDomain => self.sender_domain = text,
            FieldName::ExcludeDomains => self.exclude_domains = text,
            FieldName::ReceivedAfter => self.received_after = text,
            FieldName::ReceivedBefore => self.received_before = text,
        }
        Ok(())
    }

    /// Whether a field holds a non-blank value
    pub fn has(&self, field: FieldName) -> bool {
        is_present(self.get(field))
    }

    /// Fields holding a non-blank value, in declaration order
    pub fn populated_fields(&self) -> impl Iterator<Item = (FieldName, &str)> {
        FieldName::ALL
            .into_iter()
            .filter_map(|f| self.get(f).filter(|v| is_present(Some(*v))).map(|v| (f, v)))
    }

    /// The derived filter type
    pub fn filter_type(&self) -> FilterType {
        classify(self)
    }

    /// Materialize the typed filter for this rule's derived type
    pub fn filter(&self) -> RuleFilter {
        let criteria = FilterCriteria::from_rule(self);
        let filter = match classify(self) {
            FilterType::SubjectOnly => criteria.subject.map(RuleFilter::Subject),
            FilterType::SenderOnly => criteria.sender.map(RuleFilter::Sender),
            FilterType::BodyOnly => criteria.body.map(RuleFilter::Body),
            FilterType::DomainExclude => Some(RuleFilter::Domain {
                include: criteria.include_domain,
                exclude: criteria.exclude_domains,
            }),
            FilterType::TimeBased => Some(RuleFilter::Time {
                after: criteria.received_after,
                before: criteria.received_before,
            }),
            FilterType::MultipleFields => Some(RuleFilter::Multiple(criteria)),
        };
        filter.unwrap_or_else(|| RuleFilter::Multiple(FilterCriteria::from_rule(self)))
    }
}

/// Derive the filter type of a rule from its populated fields
///
/// Domain/exclude and after/before each form one slot: a rule whose only
/// populated fields sit in a single slot belongs to that slot's type. A
/// rule with exactly one of subject, sender or body and nothing else is
/// the matching `*_only` type. Anything else, including a rule with no
/// filter fields at all, is `multiple_fields`. Match type fields never
/// take part.
pub fn classify(rule: &Rule) -> FilterType {
    let has_subject = rule.has(FieldName::SubjectValue);
    let has_sender = rule.has(FieldName::SenderValue);
    let has_body = rule.has(FieldName::BodyValue);
    let has_domain = rule.has(FieldName::SenderDomain);
    let has_exclude = rule.has(FieldName::ExcludeDomains);
    let has_after = rule.has(FieldName::ReceivedAfter);
    let has_before = rule.has(FieldName::ReceivedBefore);

    let active_count = [has_subject, has_sender, has_body, has_domain, has_exclude, has_after, has_before]
        .iter()
        .filter(|flag| **flag)
        .count();

    if active_count == 1 {
        if has_subject {
            return FilterType::SubjectOnly;
        }
        if has_sender {
            return FilterType::SenderOnly;
        }
        if has_body {
            return FilterType::BodyOnly;
        }
        if has_domain || has_exclude {
            return FilterType::DomainExclude;
        }
        return FilterType::TimeBased;
    }

    let has_text = has_subject || has_sender || has_body;
    let has_domain_slot = has_domain || has_exclude;
    let has_time_slot = has_after || has_before;

    if has_domain_slot && !has_text && !has_time_slot {
        return FilterType::DomainExclude;
    }
    if has_time_slot && !has_text && !has_domain_slot {
        return FilterType::TimeBased;
    }
    if !has_domain_slot && !has_time_slot {
        match (has_subject, has_sender, has_body) {
            (true, false, false) => return FilterType::SubjectOnly,
            (false, true, false) => return FilterType::SenderOnly,
            (false, false, true) => return FilterType::BodyOnly,
            _ => {}
        }
    }

    FilterType::MultipleFields
}

/// A text comparison against one part of an email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMatch {
    pub match_type: MatchType,
    pub value: String,
}

impl TextMatch {
    fn from_parts(match_type: Option<MatchType>, value: Option<&str>) -> Option<Self> {
        value.filter(|v| is_present(Some(*v))).map(|v| TextMatch {
            match_type: match_type.unwrap_or_default(),
            value: v.to_string(),
        })
    }
}

/// Every populated criterion of a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub subject: Option<TextMatch>,
    pub sender: Option<TextMatch>,
    pub body: Option<TextMatch>,
    pub include_domain: Option<String>,
    pub exclude_domains: Vec<String>,
    pub received_after: Option<String>,
    pub received_before: Option<String>,
}

impl FilterCriteria {
    pub fn from_rule(rule: &Rule) -> Self {
        let present = |v: &Option<String>| v.clone().filter(|s| is_present(Some(s.as_str())));
        Self {
            subject: TextMatch::from_parts(rule.subject_match_type, rule.subject_value.as_deref()),
            sender: TextMatch::from_parts(rule.sender_match_type, rule.sender_value.as_deref()),
            body: TextMatch::from_parts(rule.body_match_type, rule.body_value.as_deref()),
            include_domain: present(&rule.sender_domain),
            exclude_domains: split_domains(rule.exclude_domains.as_deref().unwrap_or("")),
            received_after: present(&rule.received_after),
            received_before: present(&rule.received_before),
        }
    }
}

/// Split a comma-separated domain list, dropping blanks
pub fn split_domains(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Typed view of a rule, one shape per filter type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleFilter {
    Subject(TextMatch),
    Sender(TextMatch),
    Body(TextMatch),
    Domain {
        include: Option<String>,
        exclude: Vec<String>,
    },
    Time {
        after: Option<String>,
        before: Option<String>,
    },
    Multiple(FilterCriteria),
}

impl RuleFilter {
    pub fn filter_type(&self) -> FilterType {
        match self {
            RuleFilter::Subject(_) => FilterType::SubjectOnly,
            RuleFilter::Sender(_) => FilterType::SenderOnly,
            RuleFilter::Body(_) => FilterType::BodyOnly,
            RuleFilter::Domain { .. } => FilterType::DomainExclude,
            RuleFilter::Time { .. } => FilterType::TimeBased,
            RuleFilter::Multiple(_) => FilterType::MultipleFields,
        }
    }

    /// Plain-language description of what the rule matches
    pub fn describe(&self) -> String {
        match self {
            RuleFilter::Subject(m) => describe_text("subject", m),
            RuleFilter::Sender(m) => describe_text("sender", m),
            RuleFilter::Body(m) => describe_text("body", m),
            RuleFilter::Domain { include, exclude } => {
                describe_domains(include.as_deref(), exclude).unwrap_or_else(|| "any domain".to_string())
            }
            RuleFilter::Time { after, before } => {
                describe_time(after.as_deref(), before.as_deref()).unwrap_or_else(|| "any time".to_string())
            }
            RuleFilter::Multiple(c) => {
                let mut parts = Vec::new();
                if let Some(m) = &c.subject {
                    parts.push(describe_text("subject", m));
                }
                if let Some(m) = &c.sender {
                    parts.push(describe_text("sender", m));
                }
                if let Some(m) = &c.body {
                    parts.push(describe_text("body", m));
                }
                if let Some(d) = describe_domains(c.include_domain.as_deref(), &c.exclude_domains) {
                    parts.push(d);
                }
                if let Some(t) = describe_time(c.received_after.as_deref(), c.received_before.as_deref()) {
                    parts.push(t);
                }
                if parts.is_empty() {
                    "no criteria".to_string()
                } else {
                    parts.join(" and ")
                }
            }
        }
    }
}

fn describe_text(what: &str, m: &TextMatch) -> String {
    format!("{} {} \"{}\"", what, m.match_type.phrase(), m.value)
}

fn describe_domains(include: Option<&str>, exclude: &[String]) -> Option<String> {
    match (include, exclude.is_empty()) {
        (None, true) => None,
        (Some(d), true) => Some(format!("from {}", d)),
        (None, false) => Some(format!("not from {}", exclude.join(", "))),
        (Some(d), false) => Some(format!("from {} but not from {}", d, exclude.join(", "))),
    }
}

fn describe_time(after: Option<&str>, before: Option<&str>) -> Option<String> {
    match (after, before) {
        (None, None) => None,
        (Some(a), None) => Some(format!("received after {}", a)),
        (None, Some(b)) => Some(format!("received before {}", b)),
        (Some(a), Some(b)) => Some(format!("received between {} and {}", a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_with(fields: &[(FieldName, &str)]) -> Rule {
        let mut rule = Rule::new("x");
        for (field, value) in fields {
            rule.set(*field, Some(*value)).unwrap();
        }
        rule
    }

    #[test]
    fn test_single_field_round_trip() {
        let cases = [
            (FieldName::SubjectValue, "Invoice", FilterType::SubjectOnly),
            (FieldName::SenderValue, "boss@example.com", FilterType::SenderOnly),
            (FieldName::BodyValue, "unsubscribe", FilterType::BodyOnly),
            (FieldName::SenderDomain, "spam.com", FilterType::DomainExclude),
            (FieldName::ExcludeDomains, "ads.com", FilterType::DomainExclude),
            (FieldName::ReceivedAfter, "2024-01-01T00:00:00Z", FilterType::TimeBased),
            (FieldName::ReceivedBefore, "2024-02-01T00:00:00Z", FilterType::TimeBased),
        ];
        for (field, value, expected) in cases {
            assert_eq!(classify(&rule_with(&[(field, value)])), expected, "{}", field);
        }
    }

    #[test]
    fn test_subject_with_match_type() {
        let rule: Rule = serde_json::from_str(
            r#"{"name":"x","is_active":true,"subject_value":"Invoice","subject_match_type":"contains"}"#,
        )
        .unwrap();
        assert_eq!(classify(&rule), FilterType::SubjectOnly);
    }

    #[test]
    fn test_slot_pairs_resolve_through_fallback() {
        let domain = rule_with(&[
            (FieldName::SenderDomain, "spam.com"),
            (FieldName::ExcludeDomains, "ads.com"),
        ]);
        assert_eq!(classify(&domain), FilterType::DomainExclude);

        let time = rule_with(&[
            (FieldName::ReceivedAfter, "2024-01-01T00:00:00Z"),
            (FieldName::ReceivedBefore, "2024-02-01T00:00:00Z"),
        ]);
        assert_eq!(classify(&time), FilterType::TimeBased);
    }

    #[test]
    fn test_two_text_fields_are_multiple() {
        let rule = rule_with(&[(FieldName::SubjectValue, "a"), (FieldName::SenderValue, "b")]);
        assert_eq!(classify(&rule), FilterType::MultipleFields);
    }

    #[test]
    fn test_mixed_slots_are_multiple() {
        let rule = rule_with(&[(FieldName::SubjectValue, "a"), (FieldName::SenderDomain, "b.com")]);
        assert_eq!(classify(&rule), FilterType::MultipleFields);

        let rule = rule_with(&[(FieldName::ExcludeDomains, "a.com"), (FieldName::ReceivedAfter, "2024-01-01")]);
        assert_eq!(classify(&rule), FilterType::MultipleFields);
    }

    #[test]
    fn test_empty_rule_is_multiple() {
        assert_eq!(classify(&Rule::new("x")), FilterType::MultipleFields);
    }

    #[test]
    fn test_match_types_do_not_count() {
        let rule = rule_with(&[
            (FieldName::SubjectValue, "Invoice"),
            (FieldName::SenderMatchType, "exact"),
        ]);
        assert_eq!(classify(&rule), FilterType::SubjectOnly);

        let only_match_type = rule_with(&[(FieldName::BodyMatchType, "exact")]);
        assert_eq!(classify(&only_match_type), FilterType::MultipleFields);
    }

    #[test]
    fn test_whitespace_is_not_populated() {
        let rule = rule_with(&[(FieldName::SubjectValue, "Invoice"), (FieldName::SenderValue, "   ")]);
        assert_eq!(classify(&rule), FilterType::SubjectOnly);
    }

    #[test]
    fn test_classify_is_deterministic_over_all_combinations() {
        let value_fields = [
            FieldName::SubjectValue,
            FieldName::SenderValue,
            FieldName::BodyValue,
            FieldName::SenderDomain,
            FieldName::ExcludeDomains,
            FieldName::ReceivedAfter,
            FieldName::ReceivedBefore,
        ];
        for mask in 0u32..(1 << value_fields.len()) {
            let fields: Vec<(FieldName, &str)> = value_fields
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, f)| (*f, "v"))
                .collect();
            let rule = rule_with(&fields);
            let first = classify(&rule);
            assert_eq!(classify(&rule), first);
            assert!(FilterType::ALL.contains(&first));

            let slots = [
                mask & 0b1 != 0,
                mask & 0b10 != 0,
                mask & 0b100 != 0,
                mask & 0b11000 != 0,
                mask & 0b1100000 != 0,
            ];
            let expected = match slots {
                [true, false, false, false, false] => FilterType::SubjectOnly,
                [false, true, false, false, false] => FilterType::SenderOnly,
                [false, false, true, false, false] => FilterType::BodyOnly,
                [false, false, false, true, false] => FilterType::DomainExclude,
                [false, false, false, false, true] => FilterType::TimeBased,
                _ => FilterType::MultipleFields,
            };
            assert_eq!(first, expected, "mask {:07b}", mask);
        }
    }

    #[test]
    fn test_deserialize_treats_empty_as_absent() {
        let rule: Rule = serde_json::from_str(
            r#"{"id":7,"name":"x","subject_value":"","subject_match_type":"","sender_domain":null}"#,
        )
        .unwrap();
        assert_eq!(rule.id, Some(7));
        assert!(rule.is_active);
        assert_eq!(rule.subject_value, None);
        assert_eq!(rule.subject_match_type, None);
        assert_eq!(rule.sender_domain, None);
    }

    #[test]
    fn test_deserialize_rejects_unknown_match_type() {
        let result: std::result::Result<Rule, _> =
            serde_json::from_str(r#"{"name":"x","subject_match_type":"regex"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let rule = rule_with(&[(FieldName::SenderDomain, "spam.com")]);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json, serde_json::json!({"name": "x", "is_active": true, "sender_domain": "spam.com"}));
    }

    #[test]
    fn test_set_rejects_bad_match_type() {
        let mut rule = Rule::new("x");
        assert!(matches!(
            rule.set(FieldName::SubjectMatchType, Some("fuzzy")),
            Err(Error::InvalidMatchType(_))
        ));
        rule.set(FieldName::SubjectMatchType, Some("ends_with")).unwrap();
        assert_eq!(rule.subject_match_type, Some(MatchType::EndsWith));
        rule.set(FieldName::SubjectMatchType, Some("")).unwrap();
        assert_eq!(rule.subject_match_type, None);
    }

    #[test]
    fn test_filter_materializes_typed_variant() {
        let rule = rule_with(&[(FieldName::SubjectValue, "Invoice")]);
        assert_eq!(
            rule.filter(),
            RuleFilter::Subject(TextMatch {
                match_type: MatchType::Contains,
                value: "Invoice".to_string()
            })
        );

        let rule = rule_with(&[(FieldName::ExcludeDomains, "ads.com, , spam.com")]);
        assert_eq!(
            rule.filter(),
            RuleFilter::Domain {
                include: None,
                exclude: vec!["ads.com".to_string(), "spam.com".to_string()]
            }
        );
    }

    #[test]
    fn test_filter_type_agrees_with_classify() {
        let rules = [
            rule_with(&[(FieldName::BodyValue, "hello")]),
            rule_with(&[(FieldName::ReceivedBefore, "2024-01-01")]),
            rule_with(&[(FieldName::SubjectValue, "a"), (FieldName::BodyValue, "b")]),
            Rule::new("empty"),
        ];
        for rule in &rules {
            assert_eq!(rule.filter().filter_type(), classify(rule));
        }
    }

    #[test]
    fn test_describe() {
        let rule = rule_with(&[
            (FieldName::SenderMatchType, "ends_with"),
            (FieldName::SenderValue, "@example.com"),
            (FieldName::ExcludeDomains, "ads.com"),
        ]);
        assert_eq!(
            rule.filter().describe(),
            "sender ends with \"@example.com\" and not from ads.com"
        );
        assert_eq!(Rule::new("x").filter().describe(), "no criteria");
    }

    #[test]
    fn test_populated_fields_in_declaration_order() {
        let rule = rule_with(&[
            (FieldName::ReceivedAfter, "2024-01-01"),
            (FieldName::SubjectValue, "a"),
            (FieldName::SenderValue, "  "),
        ]);
        let fields: Vec<FieldName> = rule.populated_fields().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![FieldName::SubjectValue, FieldName::ReceivedAfter]);
    }
}
