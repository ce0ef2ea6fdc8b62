//! In-memory catalog index: exact identifier map plus a vector index.

use std::collections::HashMap;
use std::sync::Arc;

use strsim::jaro_winkler;
use tokio::sync::RwLock;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::domain::catalog::CatalogRecord;
use crate::error::{DuplicateIdentifierError, EmptyCatalogError, IndexError};
use crate::processing::normalize::IdentifierNormalizer;

/// Over-fetch factor for the approximate search before the stable re-sort.
const CANDIDATE_MULTIPLIER: usize = 4;

/// A catalog record paired with its similarity to a query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredRecord<'a> {
    pub record: &'a CatalogRecord,
    pub score: f32,
}

/// Immutable catalog index. Rebuild by constructing a new instance.
pub struct CatalogIndex {
    records: Vec<CatalogRecord>,
    normalized: Vec<String>,
    by_identifier: HashMap<String, usize>,
    vectors: Option<Index>,
    dimensions: usize,
    normalizer: IdentifierNormalizer,
    duplicates: Vec<DuplicateIdentifierError>,
}

impl CatalogIndex {
    /// Build the exact map and the vector index from `records`.
    ///
    /// Duplicate identifiers are logged and dropped, the first occurrence
    /// wins. Inconsistent embedding dimensions abort the build.
    pub fn build(
        records: Vec<CatalogRecord>,
        normalizer: IdentifierNormalizer,
    ) -> Result<Self, IndexError> {
        let mut kept: Vec<CatalogRecord> = Vec::with_capacity(records.len());
        let mut normalized_ids = Vec::with_capacity(records.len());
        let mut by_identifier: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for record in records {
            let normalized = normalizer.normalize(&record.identifier);
            if normalized.is_empty() {
                log::warn!("Skipping catalog record with blank identifier: {}", record.name);
                continue;
            }
            if let Some(&position) = by_identifier.get(&normalized) {
                let kept_record = &kept[position];
                let error = DuplicateIdentifierError {
                    normalized,
                    kept: kept_record.identifier.clone(),
                    dropped: record.identifier.clone(),
                };
                log::warn!("{error}");
                duplicates.push(error);
                continue;
            }
            by_identifier.insert(normalized.clone(), kept.len());
            normalized_ids.push(normalized);
            kept.push(record);
        }

        let dimensions = kept.first().map(|record| record.embedding.len()).unwrap_or(0);
        for record in &kept {
            if record.embedding.len() != dimensions || dimensions == 0 {
                return Err(IndexError::DimensionMismatch {
                    identifier: record.identifier.clone(),
                    expected: dimensions,
                    actual: record.embedding.len(),
                });
            }
        }

        let vectors = if kept.is_empty() {
            log::warn!("{}", EmptyCatalogError);
            None
        } else {
            Some(build_vector_index(&kept, dimensions)?)
        };

        log::info!(
            "Built catalog index: records={}, duplicates_dropped={}, dimensions={dimensions}",
            kept.len(),
            duplicates.len()
        );

        Ok(Self {
            records: kept,
            normalized: normalized_ids,
            by_identifier,
            vectors,
            dimensions,
            normalizer,
            duplicates,
        })
    }

    /// Index with no records; every lookup misses.
    pub fn empty(normalizer: IdentifierNormalizer) -> Self {
        Self {
            records: Vec::new(),
            normalized: Vec::new(),
            by_identifier: HashMap::new(),
            vectors: None,
            dimensions: 0,
            normalizer,
            duplicates: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn normalizer(&self) -> &IdentifierNormalizer {
        &self.normalizer
    }

    pub fn duplicates(&self) -> &[DuplicateIdentifierError] {
        &self.duplicates
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Normalize `identifier` and return the record registered under it.
    pub fn lookup_exact(&self, identifier: &str) -> Option<&CatalogRecord> {
        let normalized = self.normalizer.normalize(identifier);
        self.by_identifier
            .get(&normalized)
            .map(|&position| &self.records[position])
    }

    /// Return up to `k` records by descending cosine similarity to
    /// `embedding`; equal scores keep catalog order.
    pub fn lookup_semantic(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredRecord<'_>>, IndexError> {
        let Some(vectors) = &self.vectors else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                identifier: "<query>".to_string(),
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let fetch = k.saturating_mul(CANDIDATE_MULTIPLIER).min(self.records.len());
        let neighbors = vectors
            .search(embedding, fetch)
            .map_err(|error| IndexError::Usearch(error.to_string()))?;

        let mut scored: Vec<(usize, f32)> = neighbors
            .keys
            .iter()
            .zip(neighbors.distances.iter())
            .filter_map(|(&key, &distance)| {
                let position = usize::try_from(key).ok()?;
                (position < self.records.len())
                    .then(|| (position, (1.0 - distance).clamp(0.0, 1.0)))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredRecord {
                record: &self.records[position],
                score,
            })
            .collect())
    }

    /// Closest catalog identifier by string similarity alone.
    ///
    /// Compares normalized identifiers with Jaro-Winkler; the earliest record
    /// wins on equal similarity.
    pub fn closest_identifier(&self, identifier: &str) -> Option<(&CatalogRecord, f32)> {
        let query = self.normalizer.normalize(identifier);
        if query.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f32)> = None;
        for (position, candidate) in self.normalized.iter().enumerate() {
            let similarity = jaro_winkler(&query, candidate) as f32;
            if best.is_none_or(|(_, score)| similarity > score) {
                best = Some((position, similarity));
            }
        }

        best.map(|(position, similarity)| (&self.records[position], similarity))
    }

    /// Normalized identifier of `record` as stored in the exact map.
    pub fn normalized_identifier(&self, record: &CatalogRecord) -> String {
        self.normalizer.normalize(&record.identifier)
    }
}

fn build_vector_index(records: &[CatalogRecord], dimensions: usize) -> Result<Index, IndexError> {
    let index = Index::new(&IndexOptions {
        dimensions,
        metric: MetricKind::Cos,
        quantization: ScalarKind::F32,
        ..Default::default()
    })
    .map_err(|error| IndexError::Usearch(error.to_string()))?;

    index
        .reserve(records.len())
        .map_err(|error| IndexError::Usearch(error.to_string()))?;

    for (position, record) in records.iter().enumerate() {
        index
            .add(position as u64, record.embedding.as_slice())
            .map_err(|error| IndexError::Usearch(error.to_string()))?;
    }

    Ok(index)
}

/// Shared handle to the current index snapshot.
///
/// Readers take an `Arc` snapshot and keep it for the whole batch; a rebuild
/// publishes a new index without disturbing readers holding the old one.
pub struct CatalogHandle {
    current: RwLock<Arc<CatalogIndex>>,
}

impl CatalogHandle {
    pub fn new(index: CatalogIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub async fn snapshot(&self) -> Arc<CatalogIndex> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the published index, returning the previous one.
    pub async fn publish(&self, index: CatalogIndex) -> Arc<CatalogIndex> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, Arc::new(index))
    }
}
