use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{CategoryId, RecordId, SpecMap};
use super::normalizer::normalize;
use super::registry::{CategoryBundle, CategoryRegistry, RegistryError};
use super::scoring::{Criterion, CriterionScores};

/// Absolute tolerance for score comparisons.
pub const DRIFT_TOLERANCE: f64 = 1e-6;

/// Stored expected output for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenSnapshot {
    pub id: RecordId,
    pub specs: SpecMap,
    pub tags: BTreeMap<String, bool>,
    pub scores: CriterionScores,
}

/// One snapshot file: every snapshot for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenFile {
    pub category: CategoryId,
    pub snapshots: Vec<GoldenSnapshot>,
}

#[derive(Debug, thiserror::Error)]
pub enum GoldenError {
    #[error("failed to read golden snapshots at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed golden file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] RegistryError),
}

/// A single divergence between stored and recomputed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drift {
    pub record_id: RecordId,
    /// `tags.<name>` or `scores.<criterion>`
    pub path: String,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub category: CategoryId,
    pub checked: usize,
    pub drifts: Vec<Drift>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty()
    }
}

/// Golden snapshots grouped by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoldenSet {
    files: BTreeMap<CategoryId, Vec<GoldenSnapshot>>,
}

impl GoldenSet {
    pub fn from_files(files: impl IntoIterator<Item = GoldenFile>) -> Self {
        let mut set = Self::default();
        for file in files {
            set.files
                .entry(file.category)
                .or_default()
                .extend(file.snapshots);
        }
        set
    }

    /// Load every `*.json` file in `dir`, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<Self, GoldenError> {
        let io_error = |source| GoldenError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = fs::read_to_string(&path).map_err(|source| GoldenError::Io {
                path: path.clone(),
                source,
            })?;
            let file: GoldenFile = serde_json::from_str(&contents)
                .map_err(|source| GoldenError::Json { path: path.clone(), source })?;
            debug!(path = %path.display(), snapshots = file.snapshots.len(), "loaded golden file");
            files.push(file);
        }
        Ok(Self::from_files(files))
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.files.keys()
    }

    pub fn snapshots(&self, category: &CategoryId) -> &[GoldenSnapshot] {
        self.files.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check every category in the set; an unknown category is a configuration error.
    pub fn check_all(&self, registry: &CategoryRegistry) -> Result<Vec<DriftReport>, GoldenError> {
        self.files
            .iter()
            .map(|(category, snapshots)| {
                let bundle = registry.lookup(category)?;
                Ok(check(bundle, snapshots))
            })
            .collect()
    }
}

/// Recompute tags and scores from each snapshot's specs and diff them.
pub fn check(bundle: &CategoryBundle, snapshots: &[GoldenSnapshot]) -> DriftReport {
    let mut drifts = Vec::new();

    for snapshot in snapshots {
        let specs = normalize(&snapshot.specs, &bundle.normalization).specs;
        let computed = bundle.score(&specs);

        let tag_names: BTreeSet<&String> = snapshot
            .tags
            .keys()
            .chain(computed.vector.tags.keys())
            .collect();
        for name in tag_names {
            let expected = snapshot.tags.get(name);
            let actual = computed.vector.tags.get(name);
            if expected != actual {
                drifts.push(Drift {
                    record_id: snapshot.id.clone(),
                    path: format!("tags.{name}"),
                    expected: serde_json::json!(expected),
                    actual: serde_json::json!(actual),
                });
            }
        }

        for criterion in Criterion::ALL {
            let expected = snapshot.scores.get(criterion);
            let actual = computed.vector.criteria.get(criterion);
            if (expected - actual).abs() > DRIFT_TOLERANCE {
                drifts.push(Drift {
                    record_id: snapshot.id.clone(),
                    path: format!("scores.{criterion}"),
                    expected: serde_json::json!(expected),
                    actual: serde_json::json!(actual),
                });
            }
        }
    }

    if !drifts.is_empty() {
        warn!(category = %bundle.id, drifts = drifts.len(), "golden set drift detected");
    }

    DriftReport {
        category: bundle.id.clone(),
        checked: snapshots.len(),
        drifts,
    }
}
