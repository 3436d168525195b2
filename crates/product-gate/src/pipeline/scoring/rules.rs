use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Criterion, CriterionScores, CRITERIA, SCORE_MAX, SCORE_MIN};
use crate::pipeline::domain::{SpecMap, SpecValue};
use crate::pipeline::normalizer::round_canonical;

/// Declarative predicate over normalized specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Equals { field: String, value: SpecValue },
    AtLeast { field: String, threshold: f64 },
    AtMost { field: String, threshold: f64 },
    IsTrue { field: String },
    Present { field: String },
    Contains { field: String, item: String },
    All { of: Vec<Condition> },
    Any { of: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn equals(field: &str, value: &str) -> Self {
        Self::Equals {
            field: field.to_string(),
            value: SpecValue::text(value),
        }
    }

    pub fn at_least(field: &str, threshold: f64) -> Self {
        Self::AtLeast {
            field: field.to_string(),
            threshold,
        }
    }

    pub fn at_most(field: &str, threshold: f64) -> Self {
        Self::AtMost {
            field: field.to_string(),
            threshold,
        }
    }

    pub fn is_true(field: &str) -> Self {
        Self::IsTrue {
            field: field.to_string(),
        }
    }

    pub fn present(field: &str) -> Self {
        Self::Present {
            field: field.to_string(),
        }
    }

    pub fn contains(field: &str, item: &str) -> Self {
        Self::Contains {
            field: field.to_string(),
            item: item.to_string(),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not {
            condition: Box::new(self),
        }
    }

    /// Reads specs only; never another rule's output.
    pub fn evaluate(&self, specs: &SpecMap) -> bool {
        match self {
            Condition::Equals { field, value } => specs
                .get(field)
                .is_some_and(|actual| actual.is_present() && actual == value),
            Condition::AtLeast { field, threshold } => number(specs, field)
                .is_some_and(|value| value >= *threshold),
            Condition::AtMost { field, threshold } => number(specs, field)
                .is_some_and(|value| value <= *threshold),
            Condition::IsTrue { field } => {
                specs.get(field).and_then(SpecValue::as_bool) == Some(true)
            }
            Condition::Present { field } => specs.get(field).is_some_and(SpecValue::is_present),
            Condition::Contains { field, item } => match specs.get(field) {
                Some(SpecValue::List(items)) => items.iter().any(|entry| entry == item),
                Some(SpecValue::Text(text)) => text == item,
                _ => false,
            },
            Condition::All { of } => of.iter().all(|condition| condition.evaluate(specs)),
            Condition::Any { of } => of.iter().any(|condition| condition.evaluate(specs)),
            Condition::Not { condition } => !condition.evaluate(specs),
        }
    }
}

fn number(specs: &SpecMap, field: &str) -> Option<f64> {
    specs.get(field).and_then(SpecValue::as_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub criterion: Criterion,
    pub delta: f64,
}

/// `condition(specs) -> delta on one criterion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub condition: Condition,
    pub modifier: Modifier,
}

impl Rule {
    pub fn new(id: &str, condition: Condition, criterion: Criterion, delta: f64) -> Self {
        Self {
            id: id.to_string(),
            condition,
            modifier: Modifier { criterion, delta },
        }
    }
}

/// Audit entry for a rule whose condition held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredRule {
    pub id: String,
    pub criterion: Criterion,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub scores: CriterionScores,
    pub fired: Vec<FiredRule>,
    pub clamped: Vec<Criterion>,
}

/// Single pass over the rule table: sum the deltas of every rule that holds,
/// then clamp each criterion to the score bounds.
///
/// Deltas are summed per criterion in sorted order so the totals do not
/// depend on how the table is ordered.
pub fn apply_rules(baseline: &CriterionScores, specs: &SpecMap, rules: &[Rule]) -> RuleOutcome {
    let mut deltas: [Vec<f64>; CRITERIA] = Default::default();
    let mut fired = Vec::new();

    for rule in rules {
        if rule.condition.evaluate(specs) {
            deltas[rule.modifier.criterion.index()].push(rule.modifier.delta);
            fired.push(FiredRule {
                id: rule.id.clone(),
                criterion: rule.modifier.criterion,
                delta: rule.modifier.delta,
            });
        }
    }

    let mut scores = *baseline;
    let mut clamped = Vec::new();
    for criterion in Criterion::ALL {
        let slot = &mut deltas[criterion.index()];
        slot.sort_by(f64::total_cmp);
        let raw = baseline.get(criterion) + slot.iter().sum::<f64>();
        let bounded = raw.clamp(SCORE_MIN, SCORE_MAX);
        if bounded != raw {
            clamped.push(criterion);
        }
        scores.set(criterion, round_canonical(bounded));
    }

    RuleOutcome {
        scores,
        fired,
        clamped,
    }
}

/// Reject tables with duplicate ids or non-finite deltas.
pub fn validate_rules(rules: &[Rule]) -> Result<(), (String, String)> {
    let mut seen = BTreeSet::new();
    for rule in rules {
        if rule.id.trim().is_empty() {
            return Err((rule.id.clone(), "rule id is empty".to_string()));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err((rule.id.clone(), "rule id is declared twice".to_string()));
        }
        if !rule.modifier.delta.is_finite() {
            return Err((rule.id.clone(), "delta must be finite".to_string()));
        }
    }
    Ok(())
}
