//! Filter types and their form configuration
//!
//! A rule's filter type is never stored. It is derived from the populated
//! fields (see [`crate::domain::rule::classify`]) and used to look up the
//! static [`FilterTypeConfig`] that tells a front end which inputs to show.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::field::{FieldKind, FieldName, FilterField, SelectOption};
use super::result::{Error, Result};

/// The six ways a rule can be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    SubjectOnly,
    SenderOnly,
    BodyOnly,
    DomainExclude,
    TimeBased,
    MultipleFields,
}

impl FilterType {
    /// All filter types, in the order they are offered when creating a rule
    pub const ALL: [FilterType; 6] = [
        FilterType::SubjectOnly,
        FilterType::SenderOnly,
        FilterType::BodyOnly,
        FilterType::DomainExclude,
        FilterType::TimeBased,
        FilterType::MultipleFields,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::SubjectOnly => "subject_only",
            FilterType::SenderOnly => "sender_only",
            FilterType::BodyOnly => "body_only",
            FilterType::DomainExclude => "domain_exclude",
            FilterType::TimeBased => "time_based",
            FilterType::MultipleFields => "multiple_fields",
        }
    }

    /// Static form configuration for this filter type
    pub fn config(&self) -> &'static FilterTypeConfig {
        match self {
            FilterType::SubjectOnly => &SUBJECT_ONLY,
            FilterType::SenderOnly => &SENDER_ONLY,
            FilterType::BodyOnly => &BODY_ONLY,
            FilterType::DomainExclude => &DOMAIN_EXCLUDE,
            FilterType::TimeBased => &TIME_BASED,
            FilterType::MultipleFields => &MULTIPLE_FIELDS,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FilterType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownFilterType(s.to_string()))
    }
}

/// Look up a configuration by its string key
///
/// Unknown keys are an error, never a fallback to some default type.
pub fn lookup(key: &str) -> Result<&'static FilterTypeConfig> {
    key.parse::<FilterType>().map(|t| t.config())
}

/// Display metadata and field descriptors for one filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterTypeConfig {
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub fields: &'static [FilterField],
}

impl FilterTypeConfig {
    /// Find the descriptor for `name`, if this type declares it
    pub fn field(&self, name: FieldName) -> Option<&'static FilterField> {
        let fields: &'static [FilterField] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = FieldName> + 'static {
        let fields: &'static [FilterField] = self.fields;
        fields.iter().map(|f| f.name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FilterField> + 'static {
        let fields: &'static [FilterField] = self.fields;
        fields.iter().filter(|f| f.required)
    }
}

const MATCH_TYPE_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "contains", label: "Contains" },
    SelectOption { value: "exact", label: "Exact Match" },
    SelectOption { value: "starts_with", label: "Starts With" },
    SelectOption { value: "ends_with", label: "Ends With" },
];

const fn match_type(name: FieldName, label: &'static str, required: bool) -> FilterField {
    FilterField {
        name,
        label,
        kind: FieldKind::Select,
        required,
        options: MATCH_TYPE_OPTIONS,
        placeholder: None,
        help_text: None,
    }
}

const fn input(
    name: FieldName,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    placeholder: Option<&'static str>,
    help_text: Option<&'static str>,
) -> FilterField {
    FilterField {
        name,
        label,
        kind,
        required,
        options: &[],
        placeholder,
        help_text,
    }
}

static SUBJECT_ONLY: FilterTypeConfig = FilterTypeConfig {
    label: "Subject Only",
    description: "Filter emails based on subject line content",
    icon: "📧",
    fields: &[
        match_type(FieldName::SubjectMatchType, "Match Type", true),
        input(
            FieldName::SubjectValue,
            "Subject Value",
            FieldKind::Text,
            true,
            Some("Enter subject keyword or phrase"),
            None,
        ),
    ],
};

static SENDER_ONLY: FilterTypeConfig = FilterTypeConfig {
    label: "Sender Only",
    description: "Filter emails based on sender information",
    icon: "👤",
    fields: &[
        match_type(FieldName::SenderMatchType, "Match Type", true),
        input(
            FieldName::SenderValue,
            "Sender Value",
            FieldKind::Text,
            true,
            Some("Enter sender email or domain"),
            None,
        ),
    ],
};

static BODY_ONLY: FilterTypeConfig = FilterTypeConfig {
    label: "Body Only",
    description: "Filter emails based on email body content",
    icon: "📝",
    fields: &[
        match_type(FieldName::BodyMatchType, "Match Type", true),
        input(
            FieldName::BodyValue,
            "Body Value",
            FieldKind::Textarea,
            true,
            Some("Enter text to search in email body"),
            None,
        ),
    ],
};

static DOMAIN_EXCLUDE: FilterTypeConfig = FilterTypeConfig {
    label: "Domain / Exclude Domain",
    description: "Filter emails based on sender domains",
    icon: "🌐",
    fields: &[
        input(
            FieldName::SenderDomain,
            "Include Domain",
            FieldKind::Text,
            false,
            Some("example.com (optional)"),
            Some("Leave empty to include all domains"),
        ),
        input(
            FieldName::ExcludeDomains,
            "Exclude Domains",
            FieldKind::Textarea,
            false,
            Some("spam.com, advertising.com"),
            Some("Comma-separated list of domains to exclude"),
        ),
    ],
};

static TIME_BASED: FilterTypeConfig = FilterTypeConfig {
    label: "Time Based",
    description: "Filter emails based on received date range",
    icon: "⏰",
    fields: &[
        input(
            FieldName::ReceivedAfter,
            "Received After",
            FieldKind::Date,
            false,
            None,
            Some("Leave empty for no start date"),
        ),
        input(
            FieldName::ReceivedBefore,
            "Received Before",
            FieldKind::Date,
            false,
            None,
            Some("Leave empty for no end date"),
        ),
    ],
};

// Union of every other type's fields, none required.
static MULTIPLE_FIELDS: FilterTypeConfig = FilterTypeConfig {
    label: "Multiple Fields",
    description: "Combine multiple filter criteria",
    icon: "🔗",
    fields: &[
        match_type(FieldName::SubjectMatchType, "Subject Match Type", false),
        input(
            FieldName::SubjectValue,
            "Subject Value",
            FieldKind::Text,
            false,
            Some("Enter subject keyword"),
            None,
        ),
        match_type(FieldName::SenderMatchType, "Sender Match Type", false),
        input(
            FieldName::SenderValue,
            "Sender Value",
            FieldKind::Text,
            false,
            Some("Enter sender email or domain"),
            None,
        ),
        match_type(FieldName::BodyMatchType, "Body Match Type", false),
        input(
            FieldName::BodyValue,
            "Body Value",
            FieldKind::Textarea,
            false,
            Some("Enter text to search in email body"),
            None,
        ),
        input(
            FieldName::SenderDomain,
            "Include Domain",
            FieldKind::Text,
            false,
            Some("example.com"),
            None,
        ),
        input(
            FieldName::ExcludeDomains,
            "Exclude Domains",
            FieldKind::Textarea,
            false,
            Some("spam.com, advertising.com"),
            None,
        ),
        input(FieldName::ReceivedAfter, "Received After", FieldKind::Date, false, None, None),
        input(FieldName::ReceivedBefore, "Received Before", FieldKind::Date, false, None, None),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_keys() {
        for t in FilterType::ALL {
            let config = lookup(t.as_str()).unwrap();
            assert_eq!(config, t.config());
        }
    }

    #[test]
    fn test_lookup_unknown_key_fails() {
        let err = lookup("subject").unwrap_err();
        assert!(matches!(err, Error::UnknownFilterType(ref k) if k == "subject"));
        assert!(lookup("").is_err());
    }

    #[test]
    fn test_multiple_fields_is_union_of_the_others() {
        let mut union: Vec<FieldName> = FilterType::ALL
            .iter()
            .filter(|t| **t != FilterType::MultipleFields)
            .flat_map(|t| t.config().field_names())
            .collect();
        union.sort();

        let mut multiple: Vec<FieldName> = FilterType::MultipleFields.config().field_names().collect();
        multiple.sort();

        assert_eq!(union, multiple);
        assert_eq!(multiple, FieldName::ALL.to_vec());
    }

    #[test]
    fn test_multiple_fields_requires_nothing() {
        assert_eq!(FilterType::MultipleFields.config().required_fields().count(), 0);
    }

    #[test]
    fn test_single_text_types_require_both_fields() {
        for t in [FilterType::SubjectOnly, FilterType::SenderOnly, FilterType::BodyOnly] {
            let config = t.config();
            assert_eq!(config.fields.len(), 2);
            assert!(config.fields.iter().all(|f| f.required));
            assert_eq!(config.fields[0].kind, FieldKind::Select);
            assert_eq!(config.fields[0].label, "Match Type");
        }
    }

    #[test]
    fn test_domain_and_time_fields_are_optional() {
        assert_eq!(FilterType::DomainExclude.config().required_fields().count(), 0);
        assert_eq!(FilterType::TimeBased.config().required_fields().count(), 0);
    }

    #[test]
    fn test_match_type_field_accepts_only_options() {
        let field = FilterType::SubjectOnly.config().field(FieldName::SubjectMatchType).unwrap();
        assert!(field.accepts("starts_with"));
        assert!(!field.accepts("regex"));

        let text = FilterType::SubjectOnly.config().field(FieldName::SubjectValue).unwrap();
        assert!(text.accepts("anything at all"));
    }

    #[test]
    fn test_labels_and_icons() {
        assert_eq!(FilterType::DomainExclude.config().label, "Domain / Exclude Domain");
        assert_eq!(FilterType::DomainExclude.config().icon, "🌐");
        assert_eq!(FilterType::TimeBased.config().icon, "⏰");
    }
}
