use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::contract::{check_completeness, Tier};
use super::decision::{decide, Decision, DecisionInputs, Verdict};
use super::domain::{
    CategoryId, EnergyFacts, PriceInfo, ProductIdentity, RawInput, RecordId, SourceRef, SpecMap,
};
use super::evidence::check_evidence;
use super::legacy::{fallback_record, LegacyRecord};
use super::normalizer::{normalize, NormalizationChange};
use super::registry::{CategoryRegistry, RegistryError};
use super::scoring::{FiredRule, ScoreVector};
use super::structure::{check_envelope, StructuralError};

/// Failures that abort before any field-level analysis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] RegistryError),
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
}

impl PipelineError {
    pub const fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "CONFIG_ERROR",
            PipelineError::Structural(_) => "STRUCTURAL_ERROR",
        }
    }

    /// Structural failures are rejections; configuration failures are distinct.
    pub const fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 3,
            PipelineError::Structural(_) => 2,
        }
    }
}

/// Normalized, scored record emitted on WRITE or by the legacy path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    pub id: RecordId,
    pub category: CategoryId,
    pub product: ProductIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergyFacts>,
    pub specs: SpecMap,
    pub tags: BTreeMap<String, bool>,
    pub scores: ScoreVector,
    /// Fields holding the placeholder token; each still needs a sourced value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholders: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub normalization: Vec<NormalizationChange>,
    /// Set only by the legacy heuristic path; never on verified output.
    pub is_fallback: bool,
}

/// Full, reproducible result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub record_id: RecordId,
    pub category: CategoryId,
    pub tier: Tier,
    pub decision: Decision,
    pub exit_code: i32,
    pub normalization: Vec<NormalizationChange>,
    pub fired_rules: Vec<FiredRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ScoredRecord>,
}

impl PipelineOutcome {
    pub fn verdict(&self) -> Verdict {
        self.decision.verdict
    }
}

/// Where an authored record ended up: the full gate, or the legacy path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "camelCase")]
pub enum Submission {
    Evaluated(PipelineOutcome),
    Fallback(ScoredRecord),
}

impl Submission {
    pub fn outcome(&self) -> Option<&PipelineOutcome> {
        match self {
            Submission::Evaluated(outcome) => Some(outcome),
            Submission::Fallback(_) => None,
        }
    }

    /// The record to persist, if any: WRITE output or a fallback record.
    pub fn record(&self) -> Option<&ScoredRecord> {
        match self {
            Submission::Evaluated(outcome) => outcome.record.as_ref(),
            Submission::Fallback(record) => Some(record),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Submission::Evaluated(outcome) => outcome.verdict().label(),
            Submission::Fallback(_) => "FALLBACK",
        }
    }

    /// Fallback records are accepted, so they share the WRITE status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Submission::Evaluated(outcome) => outcome.exit_code,
            Submission::Fallback(_) => 0,
        }
    }
}

/// Stateless validator composing every pipeline stage for one record.
#[derive(Debug, Clone)]
pub struct QualityGate {
    registry: Arc<CategoryRegistry>,
}

impl QualityGate {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self { registry }
    }

    pub fn standard() -> Result<Self, RegistryError> {
        Ok(Self::new(Arc::new(CategoryRegistry::standard()?)))
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Run normalization, schema, completeness, evidence, and scoring, then decide.
    pub fn evaluate(&self, raw: &RawInput) -> Result<PipelineOutcome, PipelineError> {
        let bundle = self.registry.lookup(&raw.category).map_err(|err| {
            warn!(record = %raw.id, category = %raw.category, "unknown category");
            err
        })?;
        check_envelope(raw)?;

        let normalized = normalize(&raw.specs, &bundle.normalization);
        debug!(record = %raw.id, changes = normalized.changes.len(), "normalized specs");

        let schema_violations = bundle.check_schema(&normalized.specs);
        let mut completeness = check_completeness(&bundle.contract, &normalized.specs);
        completeness.result.errors.extend(schema_violations);

        let evidence = check_evidence(
            &completeness.specs,
            &raw.evidence,
            &bundle.contract.evidence_required_fields,
            &bundle.contract.evidence_recommended_fields,
        );

        let score = bundle.score(&completeness.specs);

        let decision = decide(&DecisionInputs {
            changes: &normalized.changes,
            completeness: &completeness.result,
            evidence: &evidence,
            rules: &score.rules,
        });

        let record = (decision.verdict == Verdict::Write).then(|| ScoredRecord {
            id: raw.id.clone(),
            category: raw.category.clone(),
            product: raw.product.clone(),
            price: Some(raw.price.clone()),
            sources: raw.sources.clone(),
            energy: raw.energy.clone(),
            specs: completeness.specs.clone(),
            tags: score.vector.tags.clone(),
            scores: score.vector.clone(),
            placeholders: completeness.result.autofilled.clone(),
            normalization: normalized.changes.clone(),
            is_fallback: false,
        });

        match decision.verdict {
            Verdict::Reject => warn!(record = %raw.id, summary = %decision.summary(), "record rejected"),
            verdict => info!(record = %raw.id, verdict = verdict.label(), "record evaluated"),
        }

        Ok(PipelineOutcome {
            record_id: raw.id.clone(),
            category: raw.category.clone(),
            tier: bundle.tier(),
            exit_code: decision.exit_code(),
            decision,
            normalization: normalized.changes,
            fired_rules: score.rules.fired,
            record,
        })
    }

    /// Route one record. Spec-less records carrying a legacy description take
    /// the fallback path and never reach the decision engine.
    pub fn admit(&self, raw: &RawInput) -> Result<Submission, PipelineError> {
        let Some(legacy) = LegacyRecord::from_raw(raw) else {
            return self.evaluate(raw).map(Submission::Evaluated);
        };
        self.registry.lookup(&raw.category)?;
        check_envelope(raw)?;
        Ok(Submission::Fallback(self.fallback(&legacy)?))
    }

    /// Compatibility path for legacy records without structured specs.
    pub fn fallback(&self, legacy: &LegacyRecord) -> Result<ScoredRecord, RegistryError> {
        let bundle = self.registry.lookup(&legacy.category)?;
        info!(record = %legacy.id, "building fallback record from legacy description");
        Ok(fallback_record(bundle, legacy))
    }
}
