use serde::Serialize;

/// A canonical catalog product ready to be indexed.
///
/// The embedding is computed once from
/// [`record_embedding_text`](crate::processing::embedding::record_embedding_text)
/// and never changes while the record lives inside an index.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRecord {
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Catalog row as stored by the catalog source, embedding still optional.
///
/// `embedding_model` names the model that produced the cached embedding.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub embedding_model: Option<String>,
}

impl CatalogEntry {
    /// Whether the cached embedding was produced by `model`.
    pub fn is_cached_for(&self, model: &str) -> bool {
        self.embedding.is_some() && self.embedding_model.as_deref() == Some(model)
    }

    /// Attach an embedding, turning the entry into an indexable record.
    pub fn into_record(self, embedding: Vec<f32>) -> CatalogRecord {
        CatalogRecord {
            identifier: self.identifier,
            name: self.name,
            description: self.description,
            embedding,
        }
    }
}
