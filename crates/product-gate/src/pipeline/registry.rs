use std::collections::BTreeMap;

use serde::Serialize;

use super::contract::{CompletenessContract, Tier};
use super::domain::{CategoryId, SpecMap, Violation};
use super::normalizer::NormalizationTables;
use super::scoring::{
    apply_rules, validate_rules, Criterion, CriterionScores, CriterionWeights, Rule, RuleOutcome,
    ScoreVector, WeightProblem, SCORE_MAX, SCORE_MIN,
};

/// Configuration failures: the deployment is wrong, not the record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown category '{0}'")]
    UnknownCategory(CategoryId),
    #[error("category '{0}' is registered twice")]
    DuplicateCategory(CategoryId),
    #[error("weights for '{category}' sum to {sum:.4}, expected 1.0")]
    WeightSum { category: CategoryId, sum: f64 },
    #[error("weight {criterion} for '{category}' must be a non-negative number")]
    NegativeWeight {
        category: CategoryId,
        criterion: Criterion,
    },
    #[error("baseline {criterion} for '{category}' is {value}, outside 0..=10")]
    BaselineOutOfBounds {
        category: CategoryId,
        criterion: Criterion,
        value: f64,
    },
    #[error("contract for '{category}' marks evidence on fields it never requires: {}", .fields.join(", "))]
    ContractInvariant {
        category: CategoryId,
        fields: Vec<String>,
    },
    #[error("bundle '{bundle}' carries a contract for '{contract}'")]
    ContractCategoryMismatch {
        bundle: CategoryId,
        contract: CategoryId,
    },
    #[error("normalization tables for '{category}' are malformed: {reason}")]
    NormalizationTable { category: CategoryId, reason: String },
    #[error("rule '{rule}' for '{category}' is malformed: {reason}")]
    RuleTable {
        category: CategoryId,
        rule: String,
        reason: String,
    },
}

impl RegistryError {
    pub const fn kind(&self) -> &'static str {
        "CONFIG_ERROR"
    }
}

pub type SchemaFn = fn(&SpecMap) -> Vec<Violation>;
pub type TagFn = fn(&SpecMap) -> BTreeMap<String, bool>;

/// Capability record for one category: schema, tags, and score inputs.
#[derive(Debug, Clone)]
pub struct CategoryBundle {
    pub id: CategoryId,
    pub label: &'static str,
    pub contract: CompletenessContract,
    pub normalization: NormalizationTables,
    pub weights: CriterionWeights,
    pub baseline: CriterionScores,
    pub rules: Vec<Rule>,
    pub schema: SchemaFn,
    pub tags: TagFn,
    /// tag -> keywords consulted only by the legacy fallback path
    pub legacy_keywords: Vec<(&'static str, &'static [&'static str])>,
}

/// Scores derived for one spec map.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub vector: ScoreVector,
    pub rules: RuleOutcome,
}

impl CategoryBundle {
    pub fn tier(&self) -> Tier {
        self.contract.tier
    }

    pub fn check_schema(&self, specs: &SpecMap) -> Vec<Violation> {
        (self.schema)(specs)
    }

    pub fn derive_tags(&self, specs: &SpecMap) -> BTreeMap<String, bool> {
        (self.tags)(specs)
    }

    pub fn score(&self, specs: &SpecMap) -> CategoryScore {
        let rules = apply_rules(&self.baseline, specs, &self.rules);
        let vector = ScoreVector {
            criteria: rules.scores,
            overall: self.weights.overall(&rules.scores),
            tags: self.derive_tags(specs),
        };
        CategoryScore { vector, rules }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.contract.category != self.id {
            return Err(RegistryError::ContractCategoryMismatch {
                bundle: self.id.clone(),
                contract: self.contract.category.clone(),
            });
        }

        let uncovered = self.contract.uncovered_evidence_fields();
        if !uncovered.is_empty() {
            return Err(RegistryError::ContractInvariant {
                category: self.id.clone(),
                fields: uncovered,
            });
        }

        match self.weights.validate() {
            Ok(()) => {}
            Err(WeightProblem::Negative(criterion)) => {
                return Err(RegistryError::NegativeWeight {
                    category: self.id.clone(),
                    criterion,
                })
            }
            Err(WeightProblem::Sum(sum)) => {
                return Err(RegistryError::WeightSum {
                    category: self.id.clone(),
                    sum,
                })
            }
        }

        for criterion in Criterion::ALL {
            let value = self.baseline.get(criterion);
            if !value.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(RegistryError::BaselineOutOfBounds {
                    category: self.id.clone(),
                    criterion,
                    value,
                });
            }
        }

        self.normalization
            .validate()
            .map_err(|reason| RegistryError::NormalizationTable {
                category: self.id.clone(),
                reason,
            })?;

        validate_rules(&self.rules).map_err(|(rule, reason)| RegistryError::RuleTable {
            category: self.id.clone(),
            rule,
            reason,
        })
    }
}

/// Listing entry for registry introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: CategoryId,
    pub label: &'static str,
    pub tier: Tier,
    pub placeholder_autofill: bool,
}

/// Read-only lookup table of category bundles, validated on construction.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    bundles: BTreeMap<CategoryId, CategoryBundle>,
}

impl CategoryRegistry {
    /// Registry of the built-in categories.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_bundles(super::categories::standard_bundles())
    }

    pub fn from_bundles(
        bundles: impl IntoIterator<Item = CategoryBundle>,
    ) -> Result<Self, RegistryError> {
        let mut table = BTreeMap::new();
        for bundle in bundles {
            bundle.validate()?;
            if table.contains_key(&bundle.id) {
                return Err(RegistryError::DuplicateCategory(bundle.id));
            }
            table.insert(bundle.id.clone(), bundle);
        }
        Ok(Self { bundles: table })
    }

    pub fn lookup(&self, id: &CategoryId) -> Result<&CategoryBundle, RegistryError> {
        self.bundles
            .get(id)
            .ok_or_else(|| RegistryError::UnknownCategory(id.clone()))
    }

    pub fn list(&self) -> Vec<CategoryId> {
        self.bundles.keys().cloned().collect()
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        self.bundles
            .values()
            .map(|bundle| CategorySummary {
                id: bundle.id.clone(),
                label: bundle.label,
                tier: bundle.tier(),
                placeholder_autofill: bundle.contract.placeholder_autofill,
            })
            .collect()
    }
}
