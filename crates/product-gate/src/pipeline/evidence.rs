use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{EvidenceMap, SpecMap, SpecValue};

/// Outcome of the evidence gate.
///
/// `ok` reflects evidence-critical fields only; `advisory_missing` lists
/// fields where evidence is recommended but not blocking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceResult {
    pub ok: bool,
    pub missing_fields: Vec<String>,
    pub advisory_missing: Vec<String>,
}

/// Require a citation for every present value of an evidence-bearing field.
///
/// Absent fields trigger nothing here; presence is the completeness
/// checker's concern.
pub fn check_evidence(
    specs: &SpecMap,
    evidence: &EvidenceMap,
    critical: &BTreeSet<String>,
    recommended: &BTreeSet<String>,
) -> EvidenceResult {
    let missing_fields = unsubstantiated(specs, evidence, critical.iter());
    let advisory_missing = unsubstantiated(
        specs,
        evidence,
        recommended.iter().filter(|field| !critical.contains(*field)),
    );

    EvidenceResult {
        ok: missing_fields.is_empty(),
        missing_fields,
        advisory_missing,
    }
}

fn unsubstantiated<'a>(
    specs: &SpecMap,
    evidence: &EvidenceMap,
    fields: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    fields
        .filter(|field| specs.get(*field).is_some_and(SpecValue::is_present))
        .filter(|field| {
            !evidence
                .get(*field)
                .is_some_and(|entry| entry.has_citation())
        })
        .cloned()
        .collect()
}

/// The citation shape an author must supply for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceShape {
    pub source: String,
    pub quote: String,
    pub confidence: String,
}

impl Default for EvidenceShape {
    fn default() -> Self {
        Self {
            source: "<id of a declared source>".to_string(),
            quote: "<verbatim text from that source stating the value>".to_string(),
            confidence: "<number between 0 and 1>".to_string(),
        }
    }
}

/// Machine-actionable instruction for one missing citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRepair {
    pub field: String,
    pub blocking: bool,
    pub expected: EvidenceShape,
}

impl EvidenceRepair {
    pub fn render(&self) -> String {
        let urgency = if self.blocking {
            "required before the record can be written"
        } else {
            "recommended"
        };
        format!(
            "- {}: add evidence[\"{}\"] = {{ \"source\": \"{}\", \"quote\": \"{}\", \"confidence\": {} }} ({urgency})",
            self.field,
            self.field,
            self.expected.source,
            self.expected.quote,
            self.expected.confidence,
        )
    }
}

/// List exactly the fields whose evidence is missing, blocking ones first.
pub fn repair_instructions(result: &EvidenceResult) -> Vec<EvidenceRepair> {
    let blocking = result.missing_fields.iter().map(|field| (field, true));
    let advisory = result.advisory_missing.iter().map(|field| (field, false));

    blocking
        .chain(advisory)
        .map(|(field, blocking)| EvidenceRepair {
            field: field.clone(),
            blocking,
            expected: EvidenceShape::default(),
        })
        .collect()
}

/// Render the evidence section of a repair prompt, if anything is missing.
pub fn repair_prompt(result: &EvidenceResult) -> Option<String> {
    let repairs = repair_instructions(result);
    if repairs.is_empty() {
        return None;
    }

    let mut lines = vec!["Evidence fixes:".to_string()];
    lines.extend(repairs.iter().map(EvidenceRepair::render));
    Some(lines.join("\n"))
}
