mod rules;

pub use rules::{apply_rules, validate_rules, Condition, FiredRule, Modifier, Rule, RuleOutcome};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalizer::round_canonical;

pub const CRITERIA: usize = 10;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// One of the ten fixed score slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
    C9,
    C10,
}

impl Criterion {
    pub const ALL: [Criterion; CRITERIA] = [
        Criterion::C1,
        Criterion::C2,
        Criterion::C3,
        Criterion::C4,
        Criterion::C5,
        Criterion::C6,
        Criterion::C7,
        Criterion::C8,
        Criterion::C9,
        Criterion::C10,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> &'static str {
        match self {
            Criterion::C1 => "c1",
            Criterion::C2 => "c2",
            Criterion::C3 => "c3",
            Criterion::C4 => "c4",
            Criterion::C5 => "c5",
            Criterion::C6 => "c6",
            Criterion::C7 => "c7",
            Criterion::C8 => "c8",
            Criterion::C9 => "c9",
            Criterion::C10 => "c10",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|criterion| criterion.label() == label)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed-arity criterion values, serialized as `{"c1": .., "c10": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, f64>", try_from = "BTreeMap<String, f64>")]
pub struct CriterionScores([f64; CRITERIA]);

impl CriterionScores {
    pub const fn new(values: [f64; CRITERIA]) -> Self {
        Self(values)
    }

    pub const fn uniform(value: f64) -> Self {
        Self([value; CRITERIA])
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0[criterion.index()]
    }

    pub fn set(&mut self, criterion: Criterion, value: f64) {
        self.0[criterion.index()] = value;
    }

    pub fn values(&self) -> &[f64; CRITERIA] {
        &self.0
    }

    pub fn within_bounds(&self) -> bool {
        self.0
            .iter()
            .all(|value| value.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(value))
    }
}

impl From<CriterionScores> for BTreeMap<String, f64> {
    fn from(scores: CriterionScores) -> Self {
        Criterion::ALL
            .into_iter()
            .map(|criterion| (criterion.label().to_string(), scores.get(criterion)))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for CriterionScores {
    type Error = String;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut scores = [0.0; CRITERIA];
        let mut seen = 0;
        for (label, value) in map {
            let criterion = Criterion::from_label(&label)
                .ok_or_else(|| format!("unknown criterion '{label}'"))?;
            scores[criterion.index()] = value;
            seen += 1;
        }
        if seen != CRITERIA {
            return Err(format!("expected {CRITERIA} criteria, found {seen}"));
        }
        Ok(Self(scores))
    }
}

/// Per-category criterion weights. Must sum to 1.0 within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights(CriterionScores);

impl CriterionWeights {
    pub const fn new(values: [f64; CRITERIA]) -> Self {
        Self(CriterionScores::new(values))
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0.get(criterion)
    }

    pub fn sum(&self) -> f64 {
        self.0.values().iter().sum()
    }

    pub fn validate(&self) -> Result<(), WeightProblem> {
        if let Some(criterion) = Criterion::ALL
            .into_iter()
            .find(|criterion| !self.get(*criterion).is_finite() || self.get(*criterion) < 0.0)
        {
            return Err(WeightProblem::Negative(criterion));
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WeightProblem::Sum(sum));
        }
        Ok(())
    }

    /// Weighted aggregate of a score vector.
    pub fn overall(&self, scores: &CriterionScores) -> f64 {
        let total: f64 = Criterion::ALL
            .into_iter()
            .map(|criterion| self.get(criterion) * scores.get(criterion))
            .sum();
        round_canonical(total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightProblem {
    Negative(Criterion),
    Sum(f64),
}

/// Derived criterion scores, weighted aggregate, and boolean fact tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub criteria: CriterionScores,
    pub overall: f64,
    pub tags: BTreeMap<String, bool>,
}
