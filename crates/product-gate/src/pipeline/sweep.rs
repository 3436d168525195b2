use std::io::Write;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use serde_json::Value;

use super::decision::Verdict;
use super::domain::{CategoryId, RawInput, RecordId};
use super::gate::{PipelineError, QualityGate, Submission};
use super::structure::parse_shape;

/// Per-record line of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepEntry {
    pub record_id: RecordId,
    pub category: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    pub exit_code: i32,
    pub violations: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SweepEntry {
    fn label(&self) -> &'static str {
        if self.is_fallback {
            "FALLBACK"
        } else {
            self.verdict.map(Verdict::label).unwrap_or("")
        }
    }
}

/// One batch item as loaded by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepInput {
    Record(RawInput),
    /// Could not be turned into a record; reported, never evaluated.
    Unreadable {
        record_id: RecordId,
        category: CategoryId,
        exit_code: i32,
        failure: String,
    },
}

impl SweepInput {
    /// Parse one JSON document. Text that is not JSON exits 3; JSON that does
    /// not have the record shape is a structural failure and exits 2.
    pub fn from_json(label: &str, text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => return Self::unreadable(label, 3, format!("INPUT_ERROR: {err}")),
        };
        let record_id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(label)
            .to_string();
        let category = value
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match parse_shape::<RawInput>(value) {
            Ok(raw) => Self::Record(raw),
            Err(err) => {
                let err = PipelineError::from(err);
                Self::Unreadable {
                    record_id: RecordId(record_id),
                    category: CategoryId::new(category),
                    exit_code: err.exit_code(),
                    failure: format!("{}: {err}", err.kind()),
                }
            }
        }
    }

    pub fn unreadable(label: &str, exit_code: i32, failure: String) -> Self {
        Self::Unreadable {
            record_id: RecordId(label.to_string()),
            category: CategoryId::new(""),
            exit_code,
            failure,
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    record_id: &'a str,
    category: &'a str,
    verdict: &'a str,
    exit_code: i32,
    violations: usize,
    failure: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<SweepEntry>,
    pub writes: usize,
    pub repairs: usize,
    pub rejects: usize,
    pub fallbacks: usize,
    pub failures: usize,
}

impl SweepReport {
    fn from_entries(entries: Vec<SweepEntry>) -> Self {
        let count = |verdict| {
            entries
                .iter()
                .filter(|entry| entry.verdict == Some(verdict))
                .count()
        };
        Self {
            generated_at: Utc::now(),
            writes: count(Verdict::Write),
            repairs: count(Verdict::Repair),
            rejects: count(Verdict::Reject),
            fallbacks: entries.iter().filter(|entry| entry.is_fallback).count(),
            failures: entries.iter().filter(|entry| entry.failure.is_some()).count(),
            entries,
        }
    }

    /// Worst status across the batch; an empty sweep succeeds.
    pub fn exit_code(&self) -> i32 {
        self.entries
            .iter()
            .map(|entry| entry.exit_code)
            .max()
            .unwrap_or(0)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            csv.serialize(CsvRow {
                record_id: &entry.record_id.0,
                category: entry.category.as_str(),
                verdict: entry.label(),
                exit_code: entry.exit_code,
                violations: entry.violations,
                failure: entry.failure.as_deref().unwrap_or(""),
            })?;
        }
        csv.flush()?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("failed to build sweep worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

fn evaluate_entry(gate: &QualityGate, raw: &RawInput) -> SweepEntry {
    match gate.admit(raw) {
        Ok(Submission::Evaluated(outcome)) => SweepEntry {
            record_id: outcome.record_id,
            category: outcome.category,
            verdict: Some(outcome.decision.verdict),
            exit_code: outcome.exit_code,
            violations: outcome.decision.violations.len(),
            is_fallback: false,
            failure: None,
        },
        Ok(Submission::Fallback(record)) => SweepEntry {
            record_id: record.id,
            category: record.category,
            verdict: None,
            exit_code: 0,
            violations: 0,
            is_fallback: true,
            failure: None,
        },
        Err(err) => SweepEntry {
            record_id: raw.id.clone(),
            category: raw.category.clone(),
            verdict: None,
            exit_code: err.exit_code(),
            violations: 0,
            is_fallback: false,
            failure: Some(format!("{}: {err}", err.kind())),
        },
    }
}

fn input_entry(gate: &QualityGate, input: &SweepInput) -> SweepEntry {
    match input {
        SweepInput::Record(raw) => evaluate_entry(gate, raw),
        SweepInput::Unreadable {
            record_id,
            category,
            exit_code,
            failure,
        } => SweepEntry {
            record_id: record_id.clone(),
            category: category.clone(),
            verdict: None,
            exit_code: *exit_code,
            violations: 0,
            is_fallback: false,
            failure: Some(failure.clone()),
        },
    }
}

fn run_batch<T, F>(items: &[T], entry: F) -> SweepReport
where
    T: Sync,
    F: Fn(&T) -> SweepEntry + Sync + Send,
{
    let entries: Vec<SweepEntry> = items.par_iter().map(entry).collect();
    let report = SweepReport::from_entries(entries);
    info!(
        records = report.entries.len(),
        writes = report.writes,
        repairs = report.repairs,
        rejects = report.rejects,
        fallbacks = report.fallbacks,
        failures = report.failures,
        "sweep complete"
    );
    report
}

fn dedicated_pool(threads: usize) -> Result<rayon::ThreadPool, SweepError> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// Validate a batch in parallel on the global pool. Entries keep input order.
pub fn sweep(gate: &QualityGate, inputs: &[RawInput]) -> SweepReport {
    run_batch(inputs, |raw| evaluate_entry(gate, raw))
}

/// Same as [`sweep`], on a dedicated pool; `threads == 0` defers to the rayon default.
pub fn sweep_with_threads(
    gate: &QualityGate,
    inputs: &[RawInput],
    threads: usize,
) -> Result<SweepReport, SweepError> {
    Ok(dedicated_pool(threads)?.install(|| sweep(gate, inputs)))
}

/// Sweep over loaded items; unreadable ones become failure entries in place.
pub fn sweep_inputs(gate: &QualityGate, inputs: &[SweepInput]) -> SweepReport {
    run_batch(inputs, |input| input_entry(gate, input))
}

pub fn sweep_inputs_with_threads(
    gate: &QualityGate,
    inputs: &[SweepInput],
    threads: usize,
) -> Result<SweepReport, SweepError> {
    Ok(dedicated_pool(threads)?.install(|| sweep_inputs(gate, inputs)))
}
