//! Product record quality gate.
//!
//! Authored records flow through a fixed sequence of pure stages: registry lookup,
//! envelope check, normalization, category schema, completeness, evidence, and
//! rule scoring. The decision engine turns the accumulated findings into a
//! WRITE, REPAIR, or REJECT verdict. Persistence happens only in
//! [`RecordService`], after the verdict is known.

pub mod categories;
pub mod contract;
pub mod decision;
pub mod domain;
pub mod evidence;
pub mod gate;
pub mod golden;
pub mod legacy;
pub mod normalizer;
pub mod registry;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod structure;
pub mod sweep;

#[cfg(test)]
mod tests;

pub use contract::{check_completeness, CompletenessContract, CompletenessResult, Tier};
pub use decision::{decide, Decision, DecisionInputs, Verdict};
pub use domain::{
    AuthoringMeta, CategoryId, EnergyFacts, EvidenceEntry, EvidenceMap, PriceInfo,
    ProductIdentity, RawInput, RecordId, Severity, SourceRef, SpecMap, SpecValue, Violation,
    ViolationKind, PLACEHOLDER_TOKEN,
};
pub use evidence::{check_evidence, repair_instructions, repair_prompt, EvidenceResult};
pub use gate::{PipelineError, PipelineOutcome, QualityGate, ScoredRecord, Submission};
pub use golden::{Drift, DriftReport, GoldenError, GoldenFile, GoldenSet, GoldenSnapshot};
pub use legacy::{fallback_record, LegacyRecord};
pub use normalizer::{normalize, NormalizationChange, NormalizationOutcome, NormalizationTables};
pub use registry::{CategoryBundle, CategoryRegistry, CategorySummary, RegistryError};
pub use router::gate_router;
pub use scoring::{Criterion, CriterionScores, CriterionWeights, Rule, ScoreVector};
pub use service::{RecordService, RecordServiceError};
pub use store::{RecordStore, RecordView, StoreError};
pub use structure::{parse_shape, StructuralError};
pub use sweep::{
    sweep, sweep_inputs, sweep_inputs_with_threads, sweep_with_threads, SweepEntry, SweepError,
    SweepInput, SweepReport,
};
