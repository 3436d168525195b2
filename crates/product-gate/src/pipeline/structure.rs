use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::domain::{RawInput, SpecMap, SpecValue, Violation, ViolationKind};

/// Shape failures that make per-field analysis meaningless.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    #[error("record shape is invalid: {0}")]
    Shape(String),
    #[error("record id is empty")]
    EmptyRecordId,
    #[error("product identity is missing '{field}'")]
    MissingIdentity { field: &'static str },
    #[error("price is invalid: {reason}")]
    InvalidPrice { reason: String },
    #[error("record cites no sources")]
    NoSources,
    #[error("source #{index} has an empty id")]
    EmptySourceId { index: usize },
    #[error("source id '{0}' is declared more than once")]
    DuplicateSource(String),
    #[error("evidence for '{field}' has confidence {value} outside [0, 1]")]
    EvidenceConfidence { field: String, value: f64 },
    #[error("evidence for '{field}' cites undeclared source '{cited}'")]
    UndeclaredEvidenceSource { field: String, cited: String },
    #[error("energy fact '{field}' must be a non-negative number")]
    InvalidEnergyFact { field: &'static str },
    #[error("authoring metadata names no author")]
    MissingAuthor,
}

/// Deserialize an already-parsed JSON document into a record type. Missing
/// or mistyped keys are a shape failure, not a process error.
pub fn parse_shape<T: DeserializeOwned>(value: Value) -> Result<T, StructuralError> {
    serde_json::from_value(value).map_err(|err| StructuralError::Shape(err.to_string()))
}

/// Envelope check applied to the raw record before normalization.
pub(crate) fn check_envelope(raw: &RawInput) -> Result<(), StructuralError> {
    if raw.id.0.trim().is_empty() {
        return Err(StructuralError::EmptyRecordId);
    }

    if raw.product.brand.trim().is_empty() {
        return Err(StructuralError::MissingIdentity { field: "brand" });
    }
    if raw.product.model.trim().is_empty() {
        return Err(StructuralError::MissingIdentity { field: "model" });
    }

    if !raw.price.amount.is_finite() || raw.price.amount < 0.0 {
        return Err(StructuralError::InvalidPrice {
            reason: format!("amount {} is not a non-negative number", raw.price.amount),
        });
    }
    let currency = raw.price.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(StructuralError::InvalidPrice {
            reason: format!("currency '{}' is not a three-letter code", raw.price.currency),
        });
    }

    if raw.sources.is_empty() {
        return Err(StructuralError::NoSources);
    }
    let mut seen = BTreeSet::new();
    for (index, source) in raw.sources.iter().enumerate() {
        let id = source.id.trim();
        if id.is_empty() {
            return Err(StructuralError::EmptySourceId { index });
        }
        if !seen.insert(id) {
            return Err(StructuralError::DuplicateSource(id.to_string()));
        }
    }

    for (field, entry) in &raw.evidence {
        let cited = entry.source.trim();
        if !cited.is_empty() && !seen.contains(cited) {
            return Err(StructuralError::UndeclaredEvidenceSource {
                field: field.clone(),
                cited: cited.to_string(),
            });
        }
        if let Some(value) = entry.confidence {
            if !(0.0..=1.0).contains(&value) {
                return Err(StructuralError::EvidenceConfidence {
                    field: field.clone(),
                    value,
                });
            }
        }
    }

    if let Some(energy) = &raw.energy {
        let facts = [
            ("annualKwh", energy.annual_kwh),
            ("standbyWatts", energy.standby_watts),
        ];
        for (field, value) in facts {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(StructuralError::InvalidEnergyFact { field });
            }
        }
    }

    if raw.authoring.author.trim().is_empty() {
        return Err(StructuralError::MissingAuthor);
    }

    Ok(())
}

/// Expected shape of a normalized spec field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number { min: f64, max: f64 },
    Bool,
    Text,
    OneOf(&'static [&'static str]),
}

/// One row of a category's field-type schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: FieldKind,
}

impl FieldRule {
    pub const fn number(field: &'static str, min: f64, max: f64) -> Self {
        Self {
            field,
            kind: FieldKind::Number { min, max },
        }
    }

    pub const fn boolean(field: &'static str) -> Self {
        Self {
            field,
            kind: FieldKind::Bool,
        }
    }

    pub const fn text(field: &'static str) -> Self {
        Self {
            field,
            kind: FieldKind::Text,
        }
    }

    pub const fn one_of(field: &'static str, allowed: &'static [&'static str]) -> Self {
        Self {
            field,
            kind: FieldKind::OneOf(allowed),
        }
    }
}

/// Flag present values whose kind or range does not match the schema.
///
/// Absent values and placeholders are left to the completeness checker.
pub fn check_fields(specs: &SpecMap, rules: &[FieldRule]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        let Some(value) = specs.get(rule.field) else {
            continue;
        };
        if !value.is_present() {
            continue;
        }

        let problem = match (rule.kind, value) {
            (FieldKind::Number { min, max }, SpecValue::Number(number)) => {
                if !number.is_finite() || *number < min || *number > max {
                    Some(format!("{number} is outside the plausible range {min}..={max}"))
                } else {
                    None
                }
            }
            (FieldKind::Bool, SpecValue::Bool(_)) => None,
            (FieldKind::Text, SpecValue::Text(_)) => None,
            (FieldKind::OneOf(allowed), SpecValue::Text(text)) => {
                if allowed.contains(&text.as_str()) {
                    None
                } else {
                    Some(format!(
                        "\"{text}\" is not one of: {}",
                        allowed.join(", ")
                    ))
                }
            }
            (kind, other) => Some(format!(
                "expected {}, found {} {}",
                expected_label(kind),
                other.kind_label(),
                other
            )),
        };

        if let Some(detail) = problem {
            violations.push(
                Violation::error(rule.field, ViolationKind::InvalidFieldValue).with_detail(detail),
            );
        }
    }

    violations
}

fn expected_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Number { .. } => "a number",
        FieldKind::Bool => "a boolean",
        FieldKind::Text => "text",
        FieldKind::OneOf(_) => "a canonical token",
    }
}
