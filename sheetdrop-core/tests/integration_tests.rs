//! Integration tests for sheetdrop-core
//!
//! Exercise the public API end to end: classification and formatting of
//! rules as they arrive from a backend, the form model, and the context
//! wired to a real DuckDB store.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;

use sheetdrop_core::config::{Backend, Config};
use sheetdrop_core::domain::form::{build_payload, initialize, validate};
use sheetdrop_core::services::{EntryPoint, LogQuery, LoggingService};
use sheetdrop_core::{
    classify, lookup, Error, FieldName, FilterType, Rule, RuleDisplayInfo, RuleForm,
    SheetDropContext, Submission, Validation,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse a rule the way it arrives from the backend
fn rule(json: serde_json::Value) -> Rule {
    serde_json::from_value(json).expect("valid rule JSON")
}

fn local_context(dir: &TempDir) -> SheetDropContext {
    let config = Config {
        backend: Backend::Local,
        ..Config::default()
    };
    SheetDropContext::with_config(dir.path(), config).expect("context")
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classification_is_deterministic() {
    let r = rule(serde_json::json!({
        "name": "x", "is_active": true,
        "subject_value": "Invoice", "received_after": "2024-01-01T00:00:00Z"
    }));
    let first = classify(&r);
    for _ in 0..10 {
        assert_eq!(classify(&r), first);
    }
    assert!(FilterType::ALL.contains(&first));
}

#[test]
fn test_minimal_rules_round_trip_to_their_type() {
    let cases = [
        (
            serde_json::json!({"name": "x", "is_active": true, "subject_value": "Invoice", "subject_match_type": "contains"}),
            FilterType::SubjectOnly,
        ),
        (
            serde_json::json!({"name": "x", "sender_value": "boss@example.com", "sender_match_type": "exact"}),
            FilterType::SenderOnly,
        ),
        (
            serde_json::json!({"name": "x", "body_value": "refund", "body_match_type": "starts_with"}),
            FilterType::BodyOnly,
        ),
        (
            serde_json::json!({"name": "x", "sender_domain": "spam.com"}),
            FilterType::DomainExclude,
        ),
        (
            serde_json::json!({"name": "x", "received_before": "2024-02-01T00:00:00Z"}),
            FilterType::TimeBased,
        ),
    ];

    for (json, expected) in cases {
        assert_eq!(classify(&rule(json.clone())), expected, "{}", json);
    }
}

#[test]
fn test_fallbacks_to_multiple_fields() {
    let both = rule(serde_json::json!({"name": "x", "subject_value": "a", "sender_value": "b"}));
    assert_eq!(classify(&both), FilterType::MultipleFields);

    let empty = rule(serde_json::json!({"name": "x", "is_active": true}));
    assert_eq!(classify(&empty), FilterType::MultipleFields);
}

#[test]
fn test_null_and_blank_fields_are_absent() {
    let r = rule(serde_json::json!({
        "id": 4, "name": "x", "is_active": false,
        "subject_value": "", "sender_value": null, "body_value": "   ",
        "sender_domain": "a.com", "exclude_domains": "b.com, c.com"
    }));
    assert_eq!(r.filter_type(), FilterType::DomainExclude);
    assert!(!r.has(FieldName::BodyValue));
}

// ============================================================================
// Form model
// ============================================================================

#[test]
fn test_validation_messages() {
    let mut data = initialize(FilterType::SubjectOnly, None);
    for t in FilterType::ALL {
        assert_eq!(
            validate(&data, t),
            Validation::Invalid("Rule name is required".to_string())
        );
    }

    data.name = "x".to_string();
    assert_eq!(validate(&data, FilterType::SubjectOnly).error(), Some("Match Type is required"));

    let empty = initialize(FilterType::MultipleFields, None);
    let mut named = empty.clone();
    named.name = "x".to_string();
    assert_eq!(
        validate(&named, FilterType::MultipleFields).error(),
        Some("At least one filter field must have a value")
    );
}

#[test]
fn test_payload_omits_whitespace_values() {
    let mut data = initialize(FilterType::SubjectOnly, None);
    data.name = "x".to_string();
    data.values.insert(FieldName::SubjectValue, "  ".to_string());
    data.values.insert(FieldName::SubjectMatchType, "contains".to_string());

    let payload = build_payload(&data, FilterType::SubjectOnly);
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["subject_match_type"], "contains");
    assert!(json.get("subject_value").is_none());
}

#[test]
fn test_registry_lookup() {
    let config = lookup("time_based").unwrap();
    assert_eq!(config.label, "Time Based");
    assert_eq!(config.icon, "⏰");

    let err = lookup("regex_only").unwrap_err();
    assert!(matches!(err, Error::UnknownFilterType(key) if key == "regex_only"));
}

// ============================================================================
// Display
// ============================================================================

#[test]
fn test_display_for_backend_rules() {
    let domain = rule(serde_json::json!({"name": "x", "sender_domain": "spam.com", "exclude_domains": "ads.com"}));
    let info = RuleDisplayInfo::from_rule(&domain);
    assert_eq!(info.details, "Domain: spam.com Exclude: ads.com");
    assert_eq!(info.label, FilterType::DomainExclude.config().label);
    assert_eq!(info.icon, FilterType::DomainExclude.config().icon);

    let time = rule(serde_json::json!({
        "name": "x",
        "received_after": "2024-01-01T00:00:00Z",
        "received_before": "2024-02-01T00:00:00Z"
    }));
    assert!(RuleDisplayInfo::from_rule(&time)
        .details
        .contains("Time: 2024-01-01 - 2024-02-01"));
}

// ============================================================================
// Context wiring
// ============================================================================

#[test]
fn test_fresh_directory_uses_backend() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_with_env(dir.path(), |_| None).unwrap();
    let ctx = SheetDropContext::with_config(dir.path(), config).unwrap();

    assert_eq!(ctx.config.backend, Backend::Remote);
    assert_eq!(ctx.repository.name(), "remote");
    assert!(!dir.path().join("rules.duckdb").exists());
}

// ============================================================================
// Context with a local store
// ============================================================================

#[test]
fn test_local_context_lifecycle() {
    let dir = TempDir::new().unwrap();
    let ctx = local_context(&dir);
    assert_eq!(ctx.config.backend, Backend::Local);
    assert_eq!(ctx.repository.name(), "local");
    assert!(dir.path().join("rules.duckdb").exists());

    let mut form = RuleForm::new(FilterType::SubjectOnly);
    form.select_filter_type(FilterType::TimeBased).unwrap();
    form.set_name("Q1");
    form.set_field(FieldName::ReceivedAfter, "2024-01-01T00:00:00Z");
    form.set_field(FieldName::ReceivedBefore, "2024-04-01T00:00:00Z");

    let created = match ctx.rule_service.save(&form).unwrap() {
        Submission::Saved(rule) => rule,
        Submission::Rejected(reason) => panic!("rejected: {}", reason),
    };
    assert_eq!(created.filter_type(), FilterType::TimeBased);

    let status = ctx.status_service.get_status().unwrap();
    assert_eq!(status.total_rules, 1);
    let time = status
        .by_type
        .iter()
        .find(|c| c.filter_type == FilterType::TimeBased)
        .unwrap();
    assert_eq!(time.count, 1);

    let toggled = ctx.rule_service.toggle(created.id.unwrap()).unwrap();
    assert!(!toggled.is_active);
    assert_eq!(ctx.status_service.get_status().unwrap().inactive_rules, 1);
}

#[test]
fn test_rules_survive_new_context() {
    let dir = TempDir::new().unwrap();
    {
        let ctx = local_context(&dir);
        let mut form = RuleForm::new(FilterType::SenderOnly);
        form.set_name("Boss");
        form.set_field(FieldName::SenderMatchType, "ends_with");
        form.set_field(FieldName::SenderValue, "@example.com");
        ctx.rule_service.save(&form).unwrap();
    }

    let ctx = local_context(&dir);
    let rules = ctx.rule_service.refresh().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].filter().describe(), "sender ends with \"@example.com\"");
}

#[test]
fn test_context_logger_records_events() {
    let dir = TempDir::new().unwrap();
    let logger = Arc::new(LoggingService::new(dir.path(), EntryPoint::Library, "test").unwrap());
    let ctx = local_context(&dir).with_logger(Arc::clone(&logger));

    let mut form = RuleForm::new(FilterType::DomainExclude);
    form.set_name("Ads");
    ctx.rule_service.save(&form).unwrap();

    let entries = logger.query(&LogQuery::recent(10)).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event, "rule_created");
    assert_eq!(entries[0].filter_type, Some(FilterType::DomainExclude));
}
