use crate::db::{DbConnection, DbPool};
use crate::domain::catalog::CatalogEntry;
use crate::domain::match_result::MatchResult;

pub mod catalog;
pub mod errors;
pub mod line_item_match;

use errors::RepositoryResult;

pub trait CatalogReader {
    fn list_catalog(&self) -> RepositoryResult<Vec<CatalogEntry>>;
}

pub trait CatalogWriter {
    /// Cache `embedding`, produced by `model`, on the catalog row.
    fn set_catalog_embedding(
        &self,
        identifier: &str,
        model: &str,
        embedding: &[f32],
    ) -> RepositoryResult<usize>;
}

pub trait MatchResultWriter {
    fn save_matches(&self, batch_reference: &str, results: &[MatchResult])
    -> RepositoryResult<usize>;
}

/// Diesel-backed repository over the shared SQLite pool.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}
