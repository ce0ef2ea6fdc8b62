//! Deterministic embedding providers for unit tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::processing::embedding::{EmbeddingProvider, normalize_embedding};

/// Embeds text as a bag of known keywords plus a small constant component.
///
/// `tests/common/mod.rs` carries a copy for the integration tests; keep the
/// keyword list and the vector layout of both in sync.
pub struct KeywordProvider {
    keywords: Vec<&'static str>,
}

impl KeywordProvider {
    pub fn products() -> Self {
        Self {
            keywords: vec!["cushion", "685", "33m", "duro", "seal"],
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
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
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }

    async fn embed_query(&self, text: String) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector(&text))
    }
}

pub struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn embed_documents(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Provider("injected failure".to_string()))
    }

    async fn embed_query(&self, _text: String) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Provider("injected failure".to_string()))
    }
}

pub struct SlowProvider(pub Duration);

#[async_trait]
impl EmbeddingProvider for SlowProvider {
    fn model_id(&self) -> &str {
        "slow"
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        tokio::time::sleep(self.0).await;
        Ok(texts.iter().map(|_| vec![1.0]).collect())
    }

    async fn embed_query(&self, _text: String) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::sleep(self.0).await;
        Ok(vec![1.0])
    }
}
