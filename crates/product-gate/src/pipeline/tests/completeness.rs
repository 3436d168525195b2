use super::common::*;
use crate::pipeline::contract::{check_completeness, CompletenessContract, Tier};
use crate::pipeline::domain::{Severity, SpecValue, ViolationKind};

fn contract() -> CompletenessContract {
    CompletenessContract::new("widget", Tier::Production)
        .product(&["widthCm", "material"])
        .mock(&["colour", "weightKg"])
        .evidence(&["material", "weightKg"])
}

#[test]
fn missing_product_field_is_an_error() {
    let values = specs(&[
        ("material", text("steel")),
        ("colour", text("red")),
        ("weightKg", SpecValue::Number(2.0)),
    ]);

    let outcome = check_completeness(&contract(), &values);

    assert_eq!(outcome.result.errors.len(), 1);
    assert_eq!(outcome.result.errors[0].field, "widthCm");
    assert_eq!(
        outcome.result.errors[0].kind,
        ViolationKind::MissingRequiredField
    );
    assert!(outcome.result.warnings.is_empty());
    assert!(outcome.result.is_blocking());
}

#[test]
fn missing_mock_field_is_a_warning_without_autofill() {
    let values = specs(&[
        ("widthCm", SpecValue::Number(10.0)),
        ("material", text("steel")),
        ("weightKg", SpecValue::Number(2.0)),
    ]);

    let outcome = check_completeness(&contract(), &values);

    assert!(outcome.result.errors.is_empty());
    assert_eq!(outcome.result.warnings.len(), 1);
    assert_eq!(outcome.result.warnings[0].field, "colour");
    assert_eq!(
        outcome.result.warnings[0].kind,
        ViolationKind::MissingRecommendedField
    );
    assert_eq!(outcome.specs, values);
}

#[test]
fn autofill_never_touches_evidence_required_fields() {
    let contract = contract().with_placeholder_autofill();
    let values = specs(&[
        ("widthCm", SpecValue::Number(10.0)),
        ("material", text("steel")),
    ]);

    let outcome = check_completeness(&contract, &values);

    assert_eq!(outcome.result.autofilled, vec!["colour".to_string()]);
    assert!(outcome.specs["colour"].is_placeholder());
    assert!(!outcome.specs.contains_key("weightKg"));
    assert_eq!(outcome.result.warnings.len(), 1);
    assert_eq!(outcome.result.warnings[0].field, "weightKg");
}

#[test]
fn placeholder_never_satisfies_a_product_field() {
    let values = specs(&[
        ("widthCm", SpecValue::placeholder()),
        ("material", text("steel")),
        ("colour", text("red")),
        ("weightKg", SpecValue::Number(2.0)),
    ]);

    let outcome = check_completeness(&contract(), &values);

    assert_eq!(outcome.result.errors.len(), 1);
    assert_eq!(outcome.result.errors[0].field, "widthCm");
    assert!(outcome.result.errors[0].detail.is_some());
}

#[test]
fn replayed_placeholder_stays_flagged_without_autofill() {
    let values = specs(&[
        ("widthCm", SpecValue::Number(10.0)),
        ("material", text("steel")),
        ("colour", SpecValue::placeholder()),
        ("weightKg", SpecValue::Number(2.0)),
    ]);

    let outcome = check_completeness(&contract(), &values);

    assert_eq!(outcome.result.autofilled, vec!["colour".to_string()]);
    assert!(outcome.result.warnings.is_empty());
}

#[test]
fn stub_tier_downgrades_product_gaps() {
    let contract = CompletenessContract::new("widget", Tier::Stub).product(&["widthCm"]);

    let outcome = check_completeness(&contract, &specs(&[]));

    assert!(outcome.result.errors.is_empty());
    assert_eq!(outcome.result.warnings.len(), 1);
    assert_eq!(outcome.result.warnings[0].severity, Severity::Warning);
    assert_eq!(
        outcome.result.warnings[0].kind,
        ViolationKind::MissingRequiredField
    );
}

#[test]
fn uncovered_evidence_fields_are_reported() {
    let contract = contract().evidence(&["serialNumber"]);

    assert_eq!(
        contract.uncovered_evidence_fields(),
        vec!["serialNumber".to_string()]
    );
}
