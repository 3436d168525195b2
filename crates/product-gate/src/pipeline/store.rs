use serde::Serialize;

use super::decision::Verdict;
use super::domain::{CategoryId, RecordId};
use super::gate::ScoredRecord;

/// Storage abstraction for written records so the service can be exercised in isolation.
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: ScoredRecord) -> Result<ScoredRecord, StoreError>;
    fn fetch(&self, id: &RecordId) -> Result<Option<ScoredRecord>, StoreError>;
    fn list(&self, limit: usize) -> Result<Vec<ScoredRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Compact, client-facing view of a stored record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub record_id: RecordId,
    pub category: CategoryId,
    pub verdict: &'static str,
    pub overall: f64,
    pub is_fallback: bool,
}

impl ScoredRecord {
    pub fn view(&self) -> RecordView {
        RecordView {
            record_id: self.id.clone(),
            category: self.category.clone(),
            verdict: if self.is_fallback {
                "FALLBACK"
            } else {
                Verdict::Write.label()
            },
            overall: self.scores.overall,
            is_fallback: self.is_fallback,
        }
    }
}
