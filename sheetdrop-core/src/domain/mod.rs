//! Core domain entities
//!
//! Rules, filter types and the rule form model. These are pure data
//! structures with validation logic - no I/O or external dependencies.

pub mod display;
pub mod field;
pub mod filter_type;
pub mod form;
pub mod result;
pub mod rule;

pub use display::RuleDisplayInfo;
pub use field::{FieldKind, FieldName, FilterField, SelectOption};
pub use filter_type::{FilterType, FilterTypeConfig};
pub use form::{RuleForm, RuleFormData, RulePayload, Submission, Validation};
pub use rule::{classify, FilterCriteria, MatchType, Rule, RuleFilter, TextMatch};
