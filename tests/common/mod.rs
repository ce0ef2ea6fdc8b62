//! Helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_matcher::db::{DbPool, establish_connection_pool};
use catalog_matcher::error::EmbeddingError;
use catalog_matcher::models::catalog::NewCatalogProduct;
use catalog_matcher::processing::embedding::{EmbeddingProvider, normalize_embedding};
use catalog_matcher::repository::DieselRepository;
use tempfile::TempDir;

/// Temporary database used in integration tests, removed on drop.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
        let path = dir.path().join("catalog.db");
        let pool = establish_connection_pool(path.to_str().expect("utf-8 temp path"))
            .expect("Failed to establish SQLite connection.");
        let repo = DieselRepository::new(pool.clone());
        repo.ensure_schema().expect("Failed to create schema.");
        TestDb { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn product(identifier: &str, name: &str, description: Option<&str>) -> NewCatalogProduct {
    NewCatalogProduct {
        identifier: identifier.to_string(),
        name: name.to_string(),
        description: description.map(str::to_string),
    }
}

/// Embeds text as presence flags of product keywords plus a constant term.
///
/// Copy of the unit-test provider in `src/processing/testing.rs`, which is
/// not compiled into the library. Keep the keyword list, vector layout and
/// model id of both in sync.
pub struct KeywordProvider;

impl KeywordProvider {
    const KEYWORDS: [&'static str; 5] = ["cushion", "685", "33m", "duro", "seal"];

    fn vector(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = Self::KEYWORDS
            .iter()
            .map(|keyword| if text.contains(keyword) { 1.0 } else { 0.0 })
            .collect();
        vector.push(0.1);
        normalize_embedding(&vector)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn model_id(&self) -> &str {
        "keyword-products"
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| Self::vector(text)).collect())
    }

    async fn embed_query(&self, text: String) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::vector(&text))
    }
}
