use std::sync::Arc;

use tracing::info;

use super::decision::Verdict;
use super::domain::{RawInput, RecordId};
use super::gate::{PipelineError, QualityGate, ScoredRecord, Submission};
use super::legacy::LegacyRecord;
use super::registry::RegistryError;
use super::store::{RecordStore, StoreError};

/// Service composing the quality gate with a record store.
pub struct RecordService<S> {
    gate: QualityGate,
    store: Arc<S>,
}

impl<S> RecordService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(gate: QualityGate, store: Arc<S>) -> Self {
        Self { gate, store }
    }

    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    /// Route a record through the gate and persist WRITE output or a
    /// legacy fallback record. REPAIR and REJECT are never stored.
    pub fn submit(&self, raw: &RawInput) -> Result<Submission, RecordServiceError> {
        let submission = self.gate.admit(raw)?;
        let written = match &submission {
            Submission::Evaluated(outcome) if outcome.verdict() != Verdict::Write => None,
            other => other.record(),
        };
        if let Some(record) = written {
            self.store.insert(record.clone())?;
            info!(record = %record.id, fallback = record.is_fallback, "record written");
        }
        Ok(submission)
    }

    /// Build and persist a fallback record for a legacy description.
    pub fn submit_legacy(
        &self,
        legacy: &LegacyRecord,
    ) -> Result<ScoredRecord, RecordServiceError> {
        let record = self.gate.fallback(legacy)?;
        let stored = self.store.insert(record)?;
        Ok(stored)
    }

    pub fn list(&self, limit: usize) -> Result<Vec<ScoredRecord>, RecordServiceError> {
        Ok(self.store.list(limit)?)
    }

    pub fn get(&self, id: &RecordId) -> Result<ScoredRecord, RecordServiceError> {
        let record = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordServiceError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RegistryError> for RecordServiceError {
    fn from(value: RegistryError) -> Self {
        Self::Pipeline(PipelineError::Config(value))
    }
}
