//! Rule form model
//!
//! Holds the editable state of a rule while it is being created or edited,
//! validates it against the selected filter type and shapes the payload
//! handed to the save callback.

use std::collections::BTreeMap;

use serde::Serialize;

use super::field::FieldName;
use super::filter_type::{FilterType, FilterTypeConfig};
use super::result::{Error, Result};
use super::rule::{classify, is_present, Rule};

/// Raw form values, keyed by field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFormData {
    pub name: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub values: BTreeMap<FieldName, String>,
}

impl RuleFormData {
    /// Blank state for a new rule: every field of the type set to ""
    pub fn empty(filter_type: FilterType) -> Self {
        Self {
            name: String::new(),
            is_active: true,
            values: filter_type
                .config()
                .field_names()
                .map(|f| (f, String::new()))
                .collect(),
        }
    }

    /// State seeded straight from an existing rule, values untouched
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            name: rule.name.clone(),
            is_active: rule.is_active,
            values: FieldName::ALL
                .into_iter()
                .filter_map(|f| rule.get(f).map(|v| (f, v.to_string())))
                .collect(),
        }
    }

    /// Current value of a field; unset fields read as ""
    pub fn value(&self, field: FieldName) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Seed form state for `filter_type`, or from `existing` when editing
pub fn initialize(filter_type: FilterType, existing: Option<&Rule>) -> RuleFormData {
    match existing {
        Some(rule) => RuleFormData::from_rule(rule),
        None => RuleFormData::empty(filter_type),
    }
}

/// Outcome of validating a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(msg) => Some(msg),
        }
    }
}

/// Check form state against the rules of `filter_type`
pub fn validate(data: &RuleFormData, filter_type: FilterType) -> Validation {
    let config = filter_type.config();

    if data.name.trim().is_empty() {
        return Validation::Invalid("Rule name is required".to_string());
    }

    if filter_type == FilterType::MultipleFields {
        let has_value = config
            .field_names()
            .any(|f| is_present(Some(data.value(f))));
        if !has_value {
            return Validation::Invalid("At least one filter field must have a value".to_string());
        }
    } else if let Some(missing) = config
        .required_fields()
        .find(|f| !is_present(Some(data.value(f.name))))
    {
        return Validation::Invalid(format!("{} is required", missing.label));
    }

    Validation::Valid
}

/// Body sent to the backend when saving a rule
///
/// Only fields declared by the filter type and holding a non-blank value
/// are included; the backend derives the filter type from which keys are
/// present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulePayload {
    pub name: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub fields: BTreeMap<FieldName, String>,
}

impl RulePayload {
    /// Payload carrying every populated field of an existing rule
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            name: rule.name.clone(),
            is_active: rule.is_active,
            fields: rule
                .populated_fields()
                .map(|(f, v)| (f, v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// Build the save payload, dropping blank fields
pub fn build_payload(data: &RuleFormData, filter_type: FilterType) -> RulePayload {
    let fields = filter_type
        .config()
        .field_names()
        .filter_map(|f| {
            let value = data.value(f);
            is_present(Some(value)).then(|| (f, value.to_string()))
        })
        .collect();

    RulePayload {
        name: data.name.clone(),
        is_active: data.is_active,
        fields,
    }
}

/// Result of submitting a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    /// The payload passed validation and the save callback returned
    Saved(T),
    /// Validation failed; the save callback was not called
    Rejected(String),
}

/// A rule form bound to a filter type
///
/// A new rule may switch filter types freely, which discards whatever was
/// typed into the previous type's fields. An existing rule keeps the type
/// it classifies as.
#[derive(Debug, Clone)]
pub struct RuleForm {
    filter_type: FilterType,
    data: RuleFormData,
    editing: Option<Rule>,
}

impl RuleForm {
    /// Blank form for a new rule
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            data: initialize(filter_type, None),
            editing: None,
        }
    }

    /// Form for editing an existing rule
    pub fn edit(rule: &Rule) -> Self {
        Self {
            filter_type: classify(rule),
            data: initialize(classify(rule), Some(rule)),
            editing: Some(rule.clone()),
        }
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn config(&self) -> &'static FilterTypeConfig {
        self.filter_type.config()
    }

    pub fn data(&self) -> &RuleFormData {
        &self.data
    }

    /// The rule being edited, if any
    pub fn editing(&self) -> Option<&Rule> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Switch a new rule to another filter type, resetting all values
    pub fn select_filter_type(&mut self, filter_type: FilterType) -> Result<()> {
        if self.editing.is_some() {
            return Err(Error::validation(
                "The filter type of an existing rule cannot be changed",
            ));
        }
        self.filter_type = filter_type;
        self.data = initialize(filter_type, None);
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.data.name = name.into();
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.data.is_active = is_active;
    }

    pub fn set_field(&mut self, field: FieldName, value: impl Into<String>) {
        self.data.values.insert(field, value.into());
    }

    pub fn validate(&self) -> Validation {
        validate(&self.data, self.filter_type)
    }

    pub fn build_payload(&self) -> RulePayload {
        build_payload(&self.data, self.filter_type)
    }

    /// Validate, then hand the payload to `save`
    pub fn submit<T, E>(
        &self,
        save: impl FnOnce(RulePayload) -> std::result::Result<T, E>,
    ) -> std::result::Result<Submission<T>, E> {
        match self.validate() {
            Validation::Valid => save(self.build_payload()).map(Submission::Saved),
            Validation::Invalid(msg) => Ok(Submission::Rejected(msg)),
        }
    }
}
