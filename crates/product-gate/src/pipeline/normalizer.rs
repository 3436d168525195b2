use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::{SpecMap, SpecValue};

const TRUTHY: [&str; 7] = ["true", "yes", "y", "1", "on", "supported", "included"];
const FALSY: [&str; 7] = ["false", "no", "n", "0", "off", "unsupported", "none"];

/// Per-category alias, unit, and boolean coercion tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationTables {
    /// field -> lowercase spelling -> canonical token
    pub aliases: BTreeMap<String, BTreeMap<String, String>>,
    pub units: BTreeMap<String, UnitRule>,
    pub booleans: BTreeSet<String>,
}

/// Conversion of suffixed numerics into one canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRule {
    pub canonical: String,
    /// lowercase suffix -> multiplier into the canonical unit
    pub factors: BTreeMap<String, f64>,
}

impl NormalizationTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, field: &str, pairs: &[(&str, &str)]) -> Self {
        let table = self.aliases.entry(field.to_string()).or_default();
        for (spelling, canonical) in pairs {
            table.insert(spelling.to_ascii_lowercase(), canonical.to_string());
        }
        self
    }

    pub fn unit(mut self, field: &str, canonical: &str, factors: &[(&str, f64)]) -> Self {
        let mut table: BTreeMap<String, f64> = factors
            .iter()
            .map(|(suffix, factor)| (suffix.to_ascii_lowercase(), *factor))
            .collect();
        table.insert(canonical.to_ascii_lowercase(), 1.0);
        self.units.insert(
            field.to_string(),
            UnitRule {
                canonical: canonical.to_string(),
                factors: table,
            },
        );
        self
    }

    pub fn booleans(mut self, fields: &[&str]) -> Self {
        self.booleans
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    /// Problems that would break idempotence: alias chains and bad factors.
    pub fn validate(&self) -> Result<(), String> {
        for (field, table) in &self.aliases {
            for canonical in table.values() {
                if let Some(next) = table.get(&canonical.to_ascii_lowercase()) {
                    if next != canonical {
                        return Err(format!(
                            "alias chain on '{field}': '{canonical}' maps on to '{next}'"
                        ));
                    }
                }
            }
        }

        for (field, rule) in &self.units {
            if let Some((suffix, factor)) = rule
                .factors
                .iter()
                .find(|(_, factor)| !factor.is_finite() || **factor <= 0.0)
            {
                return Err(format!(
                    "unit factor for '{field}' suffix '{suffix}' must be positive (found {factor})"
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeReason {
    TrimmedWhitespace,
    CanonicalAlias,
    NumericParsed { unit: String },
    UnitConverted { from: String, to: String },
    BooleanCoerced,
}

/// Append-only audit entry for one coercion step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationChange {
    pub field: String,
    pub before: SpecValue,
    pub after: SpecValue,
    pub reason: ChangeReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationOutcome {
    pub specs: SpecMap,
    pub changes: Vec<NormalizationChange>,
}

type Step = fn(&str, &SpecValue, &NormalizationTables) -> Option<(SpecValue, ChangeReason)>;

const STEPS: [Step; 4] = [trim_step, boolean_step, unit_step, alias_step];

/// Coerce a raw spec map. Values that cannot be converted pass through as-is.
pub fn normalize(specs: &SpecMap, tables: &NormalizationTables) -> NormalizationOutcome {
    let mut normalized = SpecMap::new();
    let mut changes = Vec::new();

    for (field, raw) in specs {
        let mut value = raw.clone();

        for step in STEPS {
            if let Some((next, reason)) = step(field, &value, tables) {
                if next != value {
                    changes.push(NormalizationChange {
                        field: field.clone(),
                        before: value.clone(),
                        after: next.clone(),
                        reason,
                    });
                    value = next;
                }
            }
        }

        normalized.insert(field.clone(), value);
    }

    NormalizationOutcome {
        specs: normalized,
        changes,
    }
}

fn trim_step(
    _field: &str,
    value: &SpecValue,
    _tables: &NormalizationTables,
) -> Option<(SpecValue, ChangeReason)> {
    match value {
        SpecValue::Text(text) => {
            let collapsed = collapse_whitespace(text);
            (collapsed != *text)
                .then(|| (SpecValue::Text(collapsed), ChangeReason::TrimmedWhitespace))
        }
        SpecValue::List(items) => {
            let collapsed: Vec<String> = items.iter().map(|item| collapse_whitespace(item)).collect();
            (collapsed != *items)
                .then(|| (SpecValue::List(collapsed), ChangeReason::TrimmedWhitespace))
        }
        _ => None,
    }
}

fn boolean_step(
    field: &str,
    value: &SpecValue,
    tables: &NormalizationTables,
) -> Option<(SpecValue, ChangeReason)> {
    if !tables.booleans.contains(field) {
        return None;
    }

    let coerced = match value {
        SpecValue::Text(text) => {
            let lowered = text.to_ascii_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                true
            } else if FALSY.contains(&lowered.as_str()) {
                false
            } else {
                return None;
            }
        }
        SpecValue::Number(number) if *number == 1.0 => true,
        SpecValue::Number(number) if *number == 0.0 => false,
        _ => return None,
    };

    Some((SpecValue::Bool(coerced), ChangeReason::BooleanCoerced))
}

fn unit_step(
    field: &str,
    value: &SpecValue,
    tables: &NormalizationTables,
) -> Option<(SpecValue, ChangeReason)> {
    let rule = tables.units.get(field)?;
    let SpecValue::Text(text) = value else {
        return None;
    };

    let (number, suffix) = split_numeric(text)?;
    if suffix.is_empty() || suffix == rule.canonical.to_ascii_lowercase() {
        return Some((
            SpecValue::Number(round_canonical(number)),
            ChangeReason::NumericParsed {
                unit: rule.canonical.clone(),
            },
        ));
    }

    let factor = rule.factors.get(&suffix)?;
    Some((
        SpecValue::Number(round_canonical(number * factor)),
        ChangeReason::UnitConverted {
            from: suffix,
            to: rule.canonical.clone(),
        },
    ))
}

fn alias_step(
    field: &str,
    value: &SpecValue,
    tables: &NormalizationTables,
) -> Option<(SpecValue, ChangeReason)> {
    let table = tables.aliases.get(field)?;
    let canonical = |text: &str| -> String {
        table
            .get(&text.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| text.to_string())
    };

    match value {
        SpecValue::Text(text) if !value.is_placeholder() => {
            Some((SpecValue::Text(canonical(text)), ChangeReason::CanonicalAlias))
        }
        SpecValue::List(items) => Some((
            SpecValue::List(items.iter().map(|item| canonical(item)).collect()),
            ChangeReason::CanonicalAlias,
        )),
        _ => None,
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `"9.5 cm"` into `(9.5, "cm")`. Commas grouping digits in threes are
/// thousands separators; otherwise a lone comma is the decimal mark.
fn split_numeric(text: &str) -> Option<(f64, String)> {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|(index, c)| {
            let sign = *index == 0 && (*c == '-' || *c == '+');
            !(c.is_ascii_digit() || *c == '.' || *c == ',' || sign)
        })
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());

    let (digits, rest) = trimmed.split_at(end);
    let grouped = digits
        .split(',')
        .skip(1)
        .all(|group| group.len() == 3 && !group.contains('.'));
    let digits = if digits.contains(',') && grouped {
        digits.replace(',', "")
    } else if digits.contains('.') {
        digits.to_string()
    } else {
        digits.replace(',', ".")
    };
    let number = digits.parse::<f64>().ok()?;
    if !number.is_finite() {
        return None;
    }

    Some((number, rest.trim().to_ascii_lowercase()))
}

pub(crate) fn round_canonical(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
