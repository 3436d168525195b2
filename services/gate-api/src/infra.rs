use metrics_exporter_prometheus::PrometheusHandle;
use product_gate::pipeline::{RecordId, RecordStore, ScoredRecord, StoreError};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store for written records, kept in insertion order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecordStore {
    records: Arc<Mutex<Vec<ScoredRecord>>>,
}

impl InMemoryRecordStore {
    fn guard(&self) -> Result<MutexGuard<'_, Vec<ScoredRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("record store mutex poisoned".to_string()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, record: ScoredRecord) -> Result<ScoredRecord, StoreError> {
        let mut guard = self.guard()?;
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<ScoredRecord>, StoreError> {
        let guard = self.guard()?;
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    /// Most recently written first.
    fn list(&self, limit: usize) -> Result<Vec<ScoredRecord>, StoreError> {
        let guard = self.guard()?;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}
