use crate::processing::catalog::build_catalog_index;
use crate::processing::embedding::EmbeddingProvider;
use crate::processing::index::CatalogHandle;
use crate::processing::normalize::IdentifierNormalizer;
use crate::repository::{CatalogReader, CatalogWriter};

/// Rebuild the catalog index from the repository and publish it.
///
/// The new index is built completely before the swap; on failure the
/// previously published index stays in service.
pub async fn process_rebuild_message<R>(
    handle: &CatalogHandle,
    repo: &R,
    provider: &dyn EmbeddingProvider,
    normalizer: IdentifierNormalizer,
) -> bool
where
    R: CatalogReader + CatalogWriter,
{
    log::info!("Received catalog rebuild");

    match build_catalog_index(repo, provider, normalizer).await {
        Ok(index) => {
            let records = index.len();
            let previous = handle.publish(index).await;
            log::info!(
                "Finished catalog rebuild: records={records}, previous_records={}",
                previous.len()
            );
            true
        }
        Err(e) => {
            log::error!("Catalog rebuild failed, keeping current index: {e}");
            false
        }
    }
}
