//! Rule field names and form field descriptors

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// The ten optional filter fields a rule can carry
///
/// Declaration order is the order fields appear on the wire and in the
/// `multiple_fields` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    SubjectMatchType,
    SubjectValue,
    SenderMatchType,
    SenderValue,
    BodyMatchType,
    BodyValue,
    SenderDomain,
    ExcludeDomains,
    ReceivedAfter,
    ReceivedBefore,
}

impl FieldName {
    pub const ALL: [FieldName; 10] = [
        FieldName::SubjectMatchType,
        FieldName::SubjectValue,
        FieldName::SenderMatchType,
        FieldName::SenderValue,
        FieldName::BodyMatchType,
        FieldName::BodyValue,
        FieldName::SenderDomain,
        FieldName::ExcludeDomains,
        FieldName::ReceivedAfter,
        FieldName::ReceivedBefore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::SubjectMatchType => "subject_match_type",
            FieldName::SubjectValue => "subject_value",
            FieldName::SenderMatchType => "sender_match_type",
            FieldName::SenderValue => "sender_value",
            FieldName::BodyMatchType => "body_match_type",
            FieldName::BodyValue => "body_value",
            FieldName::SenderDomain => "sender_domain",
            FieldName::ExcludeDomains => "exclude_domains",
            FieldName::ReceivedAfter => "received_after",
            FieldName::ReceivedBefore => "received_before",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldName::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// Input widget used to edit a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Date,
    Switch,
}

/// One choice of a select field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Describes how a single field renders on a rule form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterField {
    pub name: FieldName,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub options: &'static [SelectOption],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<&'static str>,
}

impl FilterField {
    /// Whether `value` is one of this field's select options
    ///
    /// Fields without options accept anything.
    pub fn accepts(&self, value: &str) -> bool {
        self.options.is_empty() || self.options.iter().any(|o| o.value == value)
    }
}
