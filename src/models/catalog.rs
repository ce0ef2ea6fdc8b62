use bytemuck::{cast_slice, pod_collect_to_vec};
use diesel::prelude::*;

use crate::domain::catalog::CatalogEntry;
use crate::schema::catalog_products;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = catalog_products)]
pub struct CatalogProduct {
    pub id: i32,
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub embedding: Option<Vec<u8>>,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = catalog_products)]
pub struct NewCatalogProduct {
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<CatalogProduct> for CatalogEntry {
    fn from(row: CatalogProduct) -> Self {
        Self {
            identifier: row.identifier,
            name: row.name,
            description: row.description,
            embedding: row.embedding.as_deref().and_then(embedding_from_blob),
            embedding_model: row.embedding_model,
        }
    }
}

/// Serialize an embedding into the blob layout stored in `catalog_products`.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    cast_slice(embedding).to_vec()
}

/// Inverse of [`embedding_to_blob`]. Empty or truncated blobs decode to
/// `None`. SQLite blobs carry no alignment guarantee, so the bytes are copied.
pub fn embedding_from_blob(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.is_empty() || blob.len() % size_of::<f32>() != 0 {
        return None;
    }
    Some(pod_collect_to_vec::<u8, f32>(blob))
}
