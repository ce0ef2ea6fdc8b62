use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::domain::line_item::LineItem;
use crate::error::EmbeddingError;

/// Build the text embedded for a catalog record.
///
/// The identifier is repeated under the `Identifier` and `Product code`
/// labels and once more bare, ahead of name and description, so that a query
/// quoting the literal code outweighs records that only share a description.
pub fn record_embedding_text(identifier: &str, name: &str, description: Option<&str>) -> String {
    let identifier = identifier.trim();
    let name = name.trim();
    let description = description.map(str::trim).unwrap_or("");

    let mut parts = Vec::with_capacity(5);
    if !identifier.is_empty() {
        parts.push(format!("Identifier: {identifier}"));
        parts.push(format!("Product code: {identifier}"));
        parts.push(format!("{identifier} {identifier}"));
    }
    if !name.is_empty() {
        parts.push(format!("Name: {name}"));
    }
    if !description.is_empty() {
        parts.push(format!("Description: {description}"));
    }

    parts.join("\n")
}

/// Build the query text for a line item: description, then identifier.
///
/// Returns `None` when the description is blank; an identifier alone is
/// never embedded.
pub fn query_embedding_text(item: &LineItem) -> Option<String> {
    let description = item.description()?;
    Some(match item.identifier() {
        Some(identifier) => format!("{description} {identifier}"),
        None => description.to_string(),
    })
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Source of text embeddings for catalog records and queries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name of the model behind this provider, stored next to cached
    /// embeddings so vectors from another model are never reused.
    fn model_id(&self) -> &str;

    /// Embed catalog record texts, one vector per input in input order.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: String) -> Result<Vec<f32>, EmbeddingError>;
}

/// Run [`EmbeddingProvider::embed_query`] bounded by `timeout`.
pub async fn embed_query_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: String,
    timeout: Duration,
) -> Result<Vec<f32>, EmbeddingError> {
    match tokio::time::timeout(timeout, provider.embed_query(text)).await {
        Ok(result) => result,
        Err(_) => Err(EmbeddingError::Timeout(timeout)),
    }
}

/// Local ONNX embedding model served by `fastembed`.
///
/// Inference is CPU bound and runs on the blocking thread pool.
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_id: String,
    prefixes: Option<(&'static str, &'static str)>,
}

impl FastEmbedProvider {
    /// Load the named model, downloading it on first use.
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let model = parse_model_name(model_name)?;
        // E5 models are trained with "passage: " / "query: " prefixes.
        let prefixes = matches!(
            model,
            EmbeddingModel::MultilingualE5Small
                | EmbeddingModel::MultilingualE5Base
                | EmbeddingModel::MultilingualE5Large
        )
        .then_some(("passage: ", "query: "));

        let embedder = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|error| EmbeddingError::Provider(error.to_string()))?;

        log::info!("Loaded embedding model {model_name}");

        Ok(Self {
            model: Arc::new(Mutex::new(embedder)),
            model_id: model_name.trim().to_ascii_lowercase(),
            prefixes,
        })
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let expected = texts.len();
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbeddingError::Provider("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|error| EmbeddingError::Provider(error.to_string()))
        })
        .await
        .map_err(|error| EmbeddingError::Provider(format!("embedding task failed: {error}")))??;

        if embeddings.len() != expected {
            return Err(EmbeddingError::Provider(format!(
                "expected {expected} embeddings, got {}",
                embeddings.len()
            )));
        }

        Ok(embeddings
            .iter()
            .map(|embedding| normalize_embedding(embedding))
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let texts: Vec<String> = match self.prefixes {
            Some((passage, _)) => texts.into_iter().map(|text| format!("{passage}{text}")).collect(),
            None => texts,
        };
        self.embed(texts).await
    }

    async fn embed_query(&self, text: String) -> Result<Vec<f32>, EmbeddingError> {
        let text = match self.prefixes {
            Some((_, query)) => format!("{query}{text}"),
            None => text,
        };
        self.embed(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyResponse)
    }
}

fn parse_model_name(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        "multilingual-e5-base" => Ok(EmbeddingModel::MultilingualE5Base),
        "multilingual-e5-large" => Ok(EmbeddingModel::MultilingualE5Large),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(EmbeddingError::Provider(format!(
            "unsupported embedding model: {other}"
        ))),
    }
}
