use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CategoryId, PriceInfo, ProductIdentity, RawInput, RecordId, SpecMap};
use super::gate::ScoredRecord;
use super::registry::CategoryBundle;
use super::scoring::ScoreVector;

/// Pre-pipeline record: free-text description, no structured specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub id: RecordId,
    pub category: CategoryId,
    pub product: ProductIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceInfo>,
    pub description: String,
}

impl LegacyRecord {
    /// Only raw inputs with no specs and a non-empty description qualify.
    pub fn from_raw(raw: &RawInput) -> Option<Self> {
        if !raw.specs.is_empty() {
            return None;
        }
        let description = raw.legacy_description.as_deref()?.trim();
        if description.is_empty() {
            return None;
        }
        Some(Self {
            id: raw.id.clone(),
            category: raw.category.clone(),
            product: raw.product.clone(),
            price: Some(raw.price.clone()),
            description: description.to_string(),
        })
    }
}

/// Heuristic record built from keyword matches and the baseline scores.
///
/// The output is always flagged `is_fallback` and carries no specs.
pub fn fallback_record(bundle: &CategoryBundle, legacy: &LegacyRecord) -> ScoredRecord {
    let haystack = legacy.description.to_lowercase();
    let tags: BTreeMap<String, bool> = bundle
        .legacy_keywords
        .iter()
        .map(|(tag, keywords)| {
            let hit = keywords.iter().any(|keyword| haystack.contains(keyword));
            (tag.to_string(), hit)
        })
        .collect();

    let scores = ScoreVector {
        criteria: bundle.baseline,
        overall: bundle.weights.overall(&bundle.baseline),
        tags: tags.clone(),
    };

    ScoredRecord {
        id: legacy.id.clone(),
        category: legacy.category.clone(),
        product: legacy.product.clone(),
        price: legacy.price.clone(),
        sources: Vec::new(),
        energy: None,
        specs: SpecMap::new(),
        tags,
        scores,
        placeholders: Vec::new(),
        normalization: Vec::new(),
        is_fallback: true,
    }
}
