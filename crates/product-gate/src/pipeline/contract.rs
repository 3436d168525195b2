use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{CategoryId, Severity, SpecMap, SpecValue, Violation, ViolationKind};

/// Strictness classification for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Production,
    Stub,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Production => "production",
            Tier::Stub => "stub",
        }
    }

    /// Severity assigned to a missing product-required field.
    const fn required_severity(self) -> Severity {
        match self {
            Tier::Production => Severity::Error,
            Tier::Stub => Severity::Warning,
        }
    }
}

/// Field presence and evidence obligations for one category.
///
/// The tier lives on the contract so a category's strictness is declared once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessContract {
    pub category: CategoryId,
    pub tier: Tier,
    pub required_fields_product: BTreeSet<String>,
    pub required_fields_mock: BTreeSet<String>,
    pub evidence_required_fields: BTreeSet<String>,
    #[serde(default)]
    pub evidence_recommended_fields: BTreeSet<String>,
    #[serde(default)]
    pub placeholder_autofill: bool,
}

impl CompletenessContract {
    pub fn new(category: &str, tier: Tier) -> Self {
        Self {
            category: CategoryId::new(category),
            tier,
            required_fields_product: BTreeSet::new(),
            required_fields_mock: BTreeSet::new(),
            evidence_required_fields: BTreeSet::new(),
            evidence_recommended_fields: BTreeSet::new(),
            placeholder_autofill: false,
        }
    }

    pub fn product(mut self, fields: &[&str]) -> Self {
        self.required_fields_product
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    pub fn mock(mut self, fields: &[&str]) -> Self {
        self.required_fields_mock
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    pub fn evidence(mut self, fields: &[&str]) -> Self {
        self.evidence_required_fields
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    pub fn evidence_recommended(mut self, fields: &[&str]) -> Self {
        self.evidence_recommended_fields
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    pub fn with_placeholder_autofill(mut self) -> Self {
        self.placeholder_autofill = true;
        self
    }

    /// Evidence-critical fields not covered by either required set.
    pub fn uncovered_evidence_fields(&self) -> Vec<String> {
        self.evidence_required_fields
            .iter()
            .filter(|field| {
                !self.required_fields_product.contains(*field)
                    && !self.required_fields_mock.contains(*field)
            })
            .cloned()
            .collect()
    }

    pub fn is_evidence_critical(&self, field: &str) -> bool {
        self.evidence_required_fields.contains(field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessResult {
    pub errors: Vec<Violation>,
    pub warnings: Vec<Violation>,
    pub autofilled: Vec<String>,
}

impl CompletenessResult {
    pub fn is_blocking(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Completeness verdict plus the spec map with any placeholders inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessOutcome {
    pub result: CompletenessResult,
    pub specs: SpecMap,
}

/// Compare normalized fields against the contract.
///
/// A placeholder already in the input counts as absent for product-required
/// and evidence-critical fields, and as autofilled otherwise.
pub fn check_completeness(contract: &CompletenessContract, specs: &SpecMap) -> CompletenessOutcome {
    let mut result = CompletenessResult::default();
    let mut filled = specs.clone();

    let required_severity = contract.tier.required_severity();
    for field in &contract.required_fields_product {
        if has_fact(specs, field) {
            continue;
        }
        let violation = Violation {
            field: field.clone(),
            kind: ViolationKind::MissingRequiredField,
            severity: required_severity,
            detail: placeholder_detail(specs, field),
        };
        match required_severity {
            Severity::Error => result.errors.push(violation),
            Severity::Warning => result.warnings.push(violation),
        }
    }

    for field in contract
        .required_fields_mock
        .iter()
        .filter(|field| !contract.required_fields_product.contains(*field))
    {
        if has_fact(specs, field) {
            continue;
        }

        let critical = contract.is_evidence_critical(field);
        let already_placeholder = specs.get(field).is_some_and(SpecValue::is_placeholder);

        if !critical && (already_placeholder || contract.placeholder_autofill) {
            filled.insert(field.clone(), SpecValue::placeholder());
            result.autofilled.push(field.clone());
        } else {
            let mut violation =
                Violation::warning(field.clone(), ViolationKind::MissingRecommendedField);
            violation.detail = placeholder_detail(specs, field);
            result.warnings.push(violation);
        }
    }

    CompletenessOutcome {
        result,
        specs: filled,
    }
}

fn has_fact(specs: &SpecMap, field: &str) -> bool {
    specs.get(field).is_some_and(SpecValue::is_present)
}

fn placeholder_detail(specs: &SpecMap, field: &str) -> Option<String> {
    specs
        .get(field)
        .filter(|value| value.is_placeholder())
        .map(|_| "placeholder does not satisfy this field".to_string())
}
