use serde::{Deserialize, Serialize};

use super::contract::CompletenessResult;
use super::domain::{Violation, ViolationKind, PLACEHOLDER_TOKEN};
use super::evidence::{self, EvidenceResult};
use super::normalizer::NormalizationChange;
use super::scoring::RuleOutcome;

/// Three-way outcome of the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Write,
    Repair,
    Reject,
}

impl Verdict {
    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Write => "WRITE",
            Verdict::Repair => "REPAIR",
            Verdict::Reject => "REJECT",
        }
    }

    /// Process status convention: 0 write, 1 repair, 2 reject.
    pub const fn exit_code(self) -> i32 {
        match self {
            Verdict::Write => 0,
            Verdict::Repair => 1,
            Verdict::Reject => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub verdict: Verdict,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_prompt: Option<String>,
}

impl Decision {
    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }

    pub fn summary(&self) -> String {
        match self.verdict {
            Verdict::Write => "record accepted".to_string(),
            Verdict::Repair => format!("repair needed on {} field(s)", self.violations.len()),
            Verdict::Reject => {
                let blocking = self.violations.iter().filter(|v| v.is_blocking()).count();
                format!("rejected with {blocking} blocking violation(s)")
            }
        }
    }
}

/// Everything the decision engine is allowed to look at.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInputs<'a> {
    pub changes: &'a [NormalizationChange],
    pub completeness: &'a CompletenessResult,
    pub evidence: &'a EvidenceResult,
    pub rules: &'a RuleOutcome,
}

/// Pure transition from stage results to a verdict.
///
/// Only completeness and evidence results decide the verdict; normalization
/// and rule output flow through to the record unchanged.
pub fn decide(inputs: &DecisionInputs<'_>) -> Decision {
    let violations = collect_violations(inputs.completeness, inputs.evidence);

    let verdict = if violations.iter().any(Violation::is_blocking) {
        Verdict::Reject
    } else if violations.is_empty() {
        Verdict::Write
    } else {
        Verdict::Repair
    };

    tracing::debug!(
        verdict = verdict.label(),
        violations = violations.len(),
        normalized = inputs.changes.len(),
        fired_rules = inputs.rules.fired.len(),
        "decision reached"
    );

    let repair_prompt = match verdict {
        Verdict::Write => None,
        Verdict::Repair | Verdict::Reject => Some(render_prompt(verdict, &violations, inputs.evidence)),
    };

    Decision {
        verdict,
        violations,
        repair_prompt,
    }
}

fn collect_violations(completeness: &CompletenessResult, evidence: &EvidenceResult) -> Vec<Violation> {
    let mut violations = completeness.errors.clone();

    violations.extend(evidence.missing_fields.iter().map(|field| {
        Violation::error(field.clone(), ViolationKind::MissingEvidence)
            .with_detail("evidence-critical value has no citation")
    }));

    violations.extend(completeness.warnings.iter().cloned());

    violations.extend(evidence.advisory_missing.iter().map(|field| {
        Violation::warning(field.clone(), ViolationKind::MissingEvidence)
            .with_detail("citation recommended")
    }));

    violations.extend(completeness.autofilled.iter().map(|field| {
        Violation::warning(field.clone(), ViolationKind::PlaceholderValue)
            .with_detail("filled with a placeholder; needs a real value")
    }));

    violations
}

fn render_prompt(verdict: Verdict, violations: &[Violation], evidence: &EvidenceResult) -> String {
    let mut sections = Vec::new();

    sections.push(match verdict {
        Verdict::Reject => {
            "The record was rejected. Fix the blocking items below and resubmit.".to_string()
        }
        _ => "The record needs targeted repairs before it can be written.".to_string(),
    });

    let value_fixes: Vec<String> = violations
        .iter()
        .filter_map(|violation| {
            let instruction = match violation.kind {
                ViolationKind::MissingRequiredField => {
                    "provide a value; this field is required".to_string()
                }
                ViolationKind::MissingRecommendedField => {
                    "provide a value; this field is recommended".to_string()
                }
                ViolationKind::InvalidFieldValue => format!(
                    "correct the value ({})",
                    violation.detail.as_deref().unwrap_or("value failed the schema")
                ),
                ViolationKind::PlaceholderValue => {
                    format!("replace the placeholder \"{PLACEHOLDER_TOKEN}\" with a sourced value")
                }
                ViolationKind::MissingEvidence => return None,
            };
            Some(format!("- {}: {instruction}", violation.field))
        })
        .collect();

    if !value_fixes.is_empty() {
        let mut section = vec!["Value fixes:".to_string()];
        section.extend(value_fixes);
        sections.push(section.join("\n"));
    }

    if let Some(evidence_section) = evidence::repair_prompt(evidence) {
        sections.push(evidence_section);
    }

    sections.join("\n\n")
}
