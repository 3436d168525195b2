use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::pipeline::categories::{AIR_PURIFIER, ROBOT_VACUUM, SMART_PLUG};
use crate::pipeline::domain::{
    AuthoringMeta, CategoryId, EvidenceEntry, EvidenceMap, PriceInfo, ProductIdentity, RawInput,
    RecordId, SourceRef, SpecMap, SpecValue,
};
use crate::pipeline::gate::{QualityGate, ScoredRecord};
use crate::pipeline::registry::CategoryRegistry;
use crate::pipeline::service::RecordService;
use crate::pipeline::store::{RecordStore, StoreError};

pub(super) fn registry() -> Arc<CategoryRegistry> {
    Arc::new(CategoryRegistry::standard().expect("standard registry is valid"))
}

pub(super) fn gate() -> QualityGate {
    QualityGate::new(registry())
}

pub(super) fn specs(entries: &[(&str, SpecValue)]) -> SpecMap {
    entries
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

pub(super) fn text(value: &str) -> SpecValue {
    SpecValue::text(value)
}

pub(super) fn cite(quote: &str) -> EvidenceEntry {
    EvidenceEntry {
        source: "src-1".to_string(),
        quote: quote.to_string(),
        confidence: Some(0.9),
    }
}

pub(super) fn evidence(fields: &[&str]) -> EvidenceMap {
    fields
        .iter()
        .map(|field| (field.to_string(), cite(&format!("{field} per datasheet"))))
        .collect()
}

fn envelope(id: &str, category: &str, specs: SpecMap, evidence: EvidenceMap) -> RawInput {
    RawInput {
        id: RecordId(id.to_string()),
        category: CategoryId::new(category),
        product: ProductIdentity {
            brand: "Acme".to_string(),
            model: "X1".to_string(),
            title: Some("Acme X1".to_string()),
        },
        price: PriceInfo {
            amount: 399.0,
            currency: "EUR".to_string(),
            observed_on: NaiveDate::from_ymd_opt(2026, 9, 1),
        },
        sources: vec![SourceRef {
            id: "src-1".to_string(),
            url: "https://example.test/datasheet".to_string(),
            retrieved_at: None,
        }],
        energy: None,
        specs,
        evidence,
        authoring: AuthoringMeta {
            author: "catalog-bot".to_string(),
            agent: None,
            created_at: None,
            revision: Some(1),
        },
        legacy_description: None,
    }
}

/// Fully compliant robot vacuum authored with mixed spellings and units.
pub(super) fn robot_vacuum_input() -> RawInput {
    envelope(
        "rv-001",
        ROBOT_VACUUM,
        specs(&[
            ("heightCm", text("9.2 cm")),
            ("navigationType", text("LiDAR")),
            ("suctionPa", text("5000 Pa")),
            ("batteryMinutes", text(" 180  min ")),
            ("noiseDb", SpecValue::Number(58.0)),
            ("dustbinMl", text("0.45 L")),
            ("mopping", text("yes")),
        ]),
        evidence(&["navigationType", "suctionPa", "batteryMinutes"]),
    )
}

/// Air purifier with every product field cited but no mock fields.
pub(super) fn air_purifier_input() -> RawInput {
    envelope(
        "ap-001",
        AIR_PURIFIER,
        specs(&[
            ("cadrM3h", text("250 cfm")),
            ("roomSizeM2", SpecValue::Number(48.0)),
            ("filterType", text("True HEPA")),
        ]),
        evidence(&["cadrM3h", "filterType"]),
    )
}

/// Stub-tier smart plug that omits its product-required protocol.
pub(super) fn smart_plug_input() -> RawInput {
    envelope(
        "sp-001",
        SMART_PLUG,
        specs(&[
            ("maxLoadWatts", text("3.68 kW")),
            ("energyMonitoring", text("on")),
        ]),
        evidence(&["maxLoadWatts"]),
    )
}

pub(super) fn input_for(category: &str, specs: SpecMap, evidence: EvidenceMap) -> RawInput {
    envelope("custom-001", category, specs, evidence)
}

pub(super) fn build_service() -> (RecordService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = RecordService::new(gate(), store.clone());
    (service, store)
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<BTreeMap<RecordId, ScoredRecord>>>,
}

impl MemoryStore {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: ScoredRecord) -> Result<ScoredRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<ScoredRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<ScoredRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().take(limit).cloned().collect())
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn insert(&self, _record: ScoredRecord) -> Result<ScoredRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RecordId) -> Result<Option<ScoredRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _limit: usize) -> Result<Vec<ScoredRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
