use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Visible, non-semantic filler used when a recommended field is autofilled.
pub const PLACEHOLDER_TOKEN: &str = "__needs_value__";

/// Identifier wrapper for authored records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry key for a product category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single spec value as authored or after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl SpecValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn placeholder() -> Self {
        Self::Text(PLACEHOLDER_TOKEN.to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SpecValue::Text(text) if text == PLACEHOLDER_TOKEN)
    }

    /// Whether the value asserts a fact. Placeholders never do.
    pub fn is_present(&self) -> bool {
        match self {
            SpecValue::Null => false,
            SpecValue::Bool(_) | SpecValue::Number(_) => true,
            SpecValue::Text(text) => !text.trim().is_empty() && text != PLACEHOLDER_TOKEN,
            SpecValue::List(items) => items.iter().any(|item| !item.trim().is_empty()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SpecValue::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SpecValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SpecValue::Text(text) if text != PLACEHOLDER_TOKEN => Some(text),
            _ => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            SpecValue::Null => "null",
            SpecValue::Bool(_) => "boolean",
            SpecValue::Number(_) => "number",
            SpecValue::Text(_) => "text",
            SpecValue::List(_) => "list",
        }
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Null => f.write_str("null"),
            SpecValue::Bool(value) => write!(f, "{value}"),
            SpecValue::Number(value) => write!(f, "{value}"),
            SpecValue::Text(text) => write!(f, "\"{text}\""),
            SpecValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

pub type SpecMap = BTreeMap<String, SpecValue>;

/// Citation backing a single spec field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    pub source: String,
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EvidenceEntry {
    pub fn has_citation(&self) -> bool {
        !self.source.trim().is_empty() && !self.quote.trim().is_empty()
    }
}

pub type EvidenceMap = BTreeMap<String, EvidenceEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdentity {
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standby_watts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoringMeta {
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
}

/// Authored record as received. The pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    pub id: RecordId,
    pub category: CategoryId,
    pub product: ProductIdentity,
    pub price: PriceInfo,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergyFacts>,
    #[serde(default)]
    pub specs: SpecMap,
    #[serde(default)]
    pub evidence: EvidenceMap,
    pub authoring: AuthoringMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    MissingRequiredField,
    MissingRecommendedField,
    MissingEvidence,
    InvalidFieldValue,
    PlaceholderValue,
}

impl ViolationKind {
    pub const fn label(self) -> &'static str {
        match self {
            ViolationKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ViolationKind::MissingRecommendedField => "MISSING_RECOMMENDED_FIELD",
            ViolationKind::MissingEvidence => "MISSING_EVIDENCE",
            ViolationKind::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ViolationKind::PlaceholderValue => "PLACEHOLDER_VALUE",
        }
    }
}

/// Field-addressed finding accumulated across pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Violation {
    pub fn error(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
            severity: Severity::Error,
            detail: None,
        }
    }

    pub fn warning(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
            severity: Severity::Warning,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}
