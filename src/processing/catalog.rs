use thiserror::Error;

use crate::domain::catalog::{CatalogEntry, CatalogRecord};
use crate::error::{EmbeddingError, IndexError};
use crate::processing::embedding::{EmbeddingProvider, record_embedding_text};
use crate::processing::index::CatalogIndex;
use crate::processing::normalize::IdentifierNormalizer;
use crate::repository::errors::RepositoryError;
use crate::repository::{CatalogReader, CatalogWriter};

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to embed catalog: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("failed to build catalog index: {0}")]
    Index(#[from] IndexError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLoadStats {
    pub entries_loaded: usize,
    pub embeddings_cached: usize,
    pub embeddings_generated: usize,
    pub embeddings_not_persisted: usize,
}

/// Attach embeddings to `entries`, generating the missing ones in one batch.
///
/// A cached embedding counts as missing unless it was produced by the
/// provider's model. Returns the records in input order together with the
/// positions whose embedding was freshly generated.
async fn resolve_embeddings(
    provider: &dyn EmbeddingProvider,
    mut entries: Vec<CatalogEntry>,
) -> Result<(Vec<CatalogRecord>, Vec<usize>), EmbeddingError> {
    let model = provider.model_id();
    let mut stale = 0;
    for entry in &mut entries {
        if entry.embedding.is_some() && !entry.is_cached_for(model) {
            entry.embedding = None;
            stale += 1;
        }
    }
    if stale > 0 {
        log::warn!("Discarding {stale} cached embeddings not produced by {model}");
    }

    let missing: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.embedding.is_none())
        .map(|(position, _)| position)
        .collect();

    let texts = missing
        .iter()
        .map(|&position| {
            let entry = &entries[position];
            record_embedding_text(&entry.identifier, &entry.name, entry.description.as_deref())
        })
        .collect::<Vec<_>>();

    let generated = if texts.is_empty() {
        Vec::new()
    } else {
        provider.embed_documents(texts).await?
    };
    if generated.len() != missing.len() {
        return Err(EmbeddingError::Provider(format!(
            "expected {} catalog embeddings, got {}",
            missing.len(),
            generated.len()
        )));
    }

    let mut records = Vec::with_capacity(entries.len());
    let mut fresh = Vec::with_capacity(generated.len());
    let mut generated = missing.into_iter().zip(generated);
    for (position, mut entry) in entries.into_iter().enumerate() {
        let embedding = match entry.embedding.take() {
            Some(embedding) => embedding,
            None => match generated.next() {
                Some((expected, embedding)) if expected == position => {
                    fresh.push(position);
                    embedding
                }
                _ => {
                    return Err(EmbeddingError::Provider(format!(
                        "embedding for catalog entry {} is missing",
                        entry.identifier
                    )));
                }
            },
        };
        records.push(entry.into_record(embedding));
    }

    Ok((records, fresh))
}

/// Turn catalog entries into indexable records without persisting anything.
pub async fn embed_entries(
    provider: &dyn EmbeddingProvider,
    entries: Vec<CatalogEntry>,
) -> Result<Vec<CatalogRecord>, EmbeddingError> {
    resolve_embeddings(provider, entries)
        .await
        .map(|(records, _)| records)
}

/// Read the catalog, reuse cached embeddings and persist newly generated
/// ones.
///
/// A failure to persist an embedding only costs a regeneration on the next
/// load, so it is logged and counted rather than returned.
pub async fn load_catalog_records<R>(
    repo: &R,
    provider: &dyn EmbeddingProvider,
) -> Result<(Vec<CatalogRecord>, CatalogLoadStats), CatalogLoadError>
where
    R: CatalogReader + CatalogWriter,
{
    let mut stats = CatalogLoadStats::default();

    let entries = repo.list_catalog()?;
    stats.entries_loaded = entries.len();

    let (records, fresh) = resolve_embeddings(provider, entries).await?;
    stats.embeddings_generated = fresh.len();
    stats.embeddings_cached = records.len() - fresh.len();

    for position in fresh {
        let record = &records[position];
        if let Err(error) =
            repo.set_catalog_embedding(&record.identifier, provider.model_id(), &record.embedding)
        {
            stats.embeddings_not_persisted += 1;
            log::warn!(
                "Failed to persist embedding for catalog entry {}: {error}",
                record.identifier
            );
        }
    }

    Ok((records, stats))
}

/// Load the catalog and build a fresh index from it.
pub async fn build_catalog_index<R>(
    repo: &R,
    provider: &dyn EmbeddingProvider,
    normalizer: IdentifierNormalizer,
) -> Result<CatalogIndex, CatalogLoadError>
where
    R: CatalogReader + CatalogWriter,
{
    let (records, stats) = load_catalog_records(repo, provider).await?;

    log::info!(
        "Loaded catalog: entries_loaded={}, embeddings_cached={}, embeddings_generated={}, embeddings_not_persisted={}",
        stats.entries_loaded,
        stats.embeddings_cached,
        stats.embeddings_generated,
        stats.embeddings_not_persisted
    );

    Ok(CatalogIndex::build(records, normalizer)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::processing::testing::{FailingProvider, KeywordProvider};
    use crate::repository::errors::RepositoryResult;

    #[derive(Default)]
    struct FakeCatalogRepo {
        entries: Vec<CatalogEntry>,
        fail_writes: bool,
        persisted: Mutex<Vec<(String, String, usize)>>,
    }

    impl CatalogReader for FakeCatalogRepo {
        fn list_catalog(&self) -> RepositoryResult<Vec<CatalogEntry>> {
            Ok(self.entries.clone())
        }
    }

    impl CatalogWriter for FakeCatalogRepo {
        fn set_catalog_embedding(
            &self,
            identifier: &str,
            model: &str,
            embedding: &[f32],
        ) -> RepositoryResult<usize> {
            if self.fail_writes {
                return Err(RepositoryError::ValidationError(
                    "injected write failure".to_string(),
                ));
            }
            let mut persisted = self.persisted.lock().expect("persisted mutex poisoned");
            persisted.push((identifier.to_string(), model.to_string(), embedding.len()));
            Ok(1)
        }
    }

    impl FakeCatalogRepo {
        fn persisted_identifiers(&self) -> Vec<String> {
            self.persisted
                .lock()
                .expect("persisted mutex poisoned")
                .iter()
                .map(|(identifier, _, _)| identifier.clone())
                .collect()
        }
    }

    fn entry(identifier: &str, embedding: Option<Vec<f32>>) -> CatalogEntry {
        let embedding_model = embedding.as_ref().map(|_| "keyword-products".to_string());
        CatalogEntry {
            identifier: identifier.to_string(),
            name: format!("Duro Seal {identifier}"),
            description: None,
            embedding,
            embedding_model,
        }
    }

    #[tokio::test]
    async fn only_missing_embeddings_are_generated_and_persisted() {
        let cached = vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let repo = FakeCatalogRepo {
            entries: vec![
                entry("A-1", None),
                entry("B-2", Some(cached.clone())),
                entry("C-3", None),
            ],
            ..Default::default()
        };

        let (records, stats) = load_catalog_records(&repo, &KeywordProvider::products())
            .await
            .expect("catalog loads");

        assert_eq!(stats.entries_loaded, 3);
        assert_eq!(stats.embeddings_cached, 1);
        assert_eq!(stats.embeddings_generated, 2);
        assert_eq!(records[1].embedding, cached);
        assert_eq!(
            records.iter().map(|r| r.identifier.as_str()).collect::<Vec<_>>(),
            vec!["A-1", "B-2", "C-3"]
        );
        assert_eq!(repo.persisted_identifiers(), vec!["A-1", "C-3"]);
    }

    #[tokio::test]
    async fn embeddings_from_another_model_are_regenerated() {
        let mut stale = entry("B-2", Some(vec![1.0, 0.0, 0.0]));
        stale.embedding_model = Some("multilingual-e5-large".to_string());
        let mut untagged = entry("C-3", Some(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
        untagged.embedding_model = None;
        let repo = FakeCatalogRepo {
            entries: vec![entry("A-1", None), stale, untagged],
            ..Default::default()
        };

        let index = build_catalog_index(
            &repo,
            &KeywordProvider::products(),
            IdentifierNormalizer::default(),
        )
        .await
        .expect("stale embeddings are replaced, not indexed");

        assert_eq!(index.len(), 3);
        assert!(index.records().iter().all(|record| record.embedding.len() == 6));
        assert_eq!(
            *repo.persisted.lock().expect("persisted mutex poisoned"),
            vec![
                ("A-1".to_string(), "keyword-products".to_string(), 6),
                ("B-2".to_string(), "keyword-products".to_string(), 6),
                ("C-3".to_string(), "keyword-products".to_string(), 6),
            ]
        );
        let query = KeywordProvider::products()
            .embed_query("duro seal".to_string())
            .await
            .expect("keyword query");
        assert!(index.lookup_semantic(&query, 1).is_ok());
    }

    #[tokio::test]
    async fn persist_failure_is_counted_not_fatal() {
        let repo = FakeCatalogRepo {
            entries: vec![entry("A-1", None)],
            fail_writes: true,
            ..Default::default()
        };

        let (records, stats) = load_catalog_records(&repo, &KeywordProvider::products())
            .await
            .expect("catalog loads");

        assert_eq!(records.len(), 1);
        assert_eq!(stats.embeddings_not_persisted, 1);
    }

    #[tokio::test]
    async fn fully_cached_catalog_never_calls_provider() {
        let mut cached = entry("A-1", Some(vec![1.0, 0.0]));
        cached.embedding_model = Some("failing".to_string());
        let repo = FakeCatalogRepo {
            entries: vec![cached],
            ..Default::default()
        };

        let index = build_catalog_index(&repo, &FailingProvider, IdentifierNormalizer::default())
            .await
            .expect("cached embeddings are enough");

        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_aborts_catalog_load() {
        let repo = FakeCatalogRepo {
            entries: vec![entry("A-1", None)],
            ..Default::default()
        };

        let result =
            build_catalog_index(&repo, &FailingProvider, IdentifierNormalizer::default()).await;

        assert!(matches!(result, Err(CatalogLoadError::Embedding(_))));
    }
}
