use diesel::prelude::*;

use crate::domain::catalog::CatalogEntry;
use crate::models::catalog::{CatalogProduct, NewCatalogProduct, embedding_to_blob};
use crate::repository::errors::RepositoryResult;
use crate::repository::{CatalogReader, CatalogWriter, DieselRepository};

impl CatalogReader for DieselRepository {
    fn list_catalog(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        use crate::schema::catalog_products;

        let mut conn = self.conn()?;

        // Row order is insertion order; index tie-breaks depend on it.
        let rows = catalog_products::table
            .order(catalog_products::id.asc())
            .select(CatalogProduct::as_select())
            .load::<CatalogProduct>(&mut conn)?;

        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }
}

impl CatalogWriter for DieselRepository {
    fn set_catalog_embedding(
        &self,
        identifier: &str,
        model: &str,
        embedding: &[f32],
    ) -> RepositoryResult<usize> {
        use crate::schema::catalog_products;

        let mut conn = self.conn()?;
        let blob = embedding_to_blob(embedding);

        let affected = diesel::update(
            catalog_products::table.filter(catalog_products::identifier.eq(identifier)),
        )
        .set((
            catalog_products::embedding.eq(blob),
            catalog_products::embedding_model.eq(model),
        ))
        .execute(&mut conn)?;

        Ok(affected)
    }
}

impl DieselRepository {
    /// Insert catalog rows, used by seeding tools and tests.
    pub fn insert_catalog(&self, products: &[NewCatalogProduct]) -> RepositoryResult<usize> {
        use crate::schema::catalog_products;

        if products.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let inserted = diesel::insert_into(catalog_products::table)
            .values(products)
            .execute(&mut conn)?;

        Ok(inserted)
    }

    /// Create missing tables.
    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        crate::db::ensure_schema(&mut conn)?;
        Ok(())
    }
}
