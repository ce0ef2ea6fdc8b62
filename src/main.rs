use std::sync::Arc;

use catalog_matcher::db::establish_connection_pool;
use catalog_matcher::models::config::ServerConfig;
use catalog_matcher::processing::ZMQMessage;
use catalog_matcher::processing::catalog::build_catalog_index;
use catalog_matcher::processing::embedding::{EmbeddingProvider, FastEmbedProvider};
use catalog_matcher::processing::index::CatalogHandle;
use catalog_matcher::processing::matcher::Matcher;
use catalog_matcher::processing::matching::process_match_message;
use catalog_matcher::processing::normalize::IdentifierNormalizer;
use catalog_matcher::processing::rebuild::process_rebuild_message;
use catalog_matcher::repository::DieselRepository;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = Arc::new(DieselRepository::new(pool));
    if let Err(e) = repo.ensure_schema() {
        log::error!("Failed to prepare database schema: {e}");
        std::process::exit(1);
    }

    let provider: Arc<dyn EmbeddingProvider> =
        match FastEmbedProvider::new(&config.embedding_model) {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                log::error!("Failed to initialize embedding provider: {e}");
                std::process::exit(1);
            }
        };

    let normalizer = IdentifierNormalizer::new(config.normalization);
    let index = match build_catalog_index(repo.as_ref(), provider.as_ref(), normalizer).await {
        Ok(index) => index,
        Err(e) => {
            log::error!("Failed to build catalog index: {e}");
            std::process::exit(1);
        }
    };
    let handle = Arc::new(CatalogHandle::new(index));
    let settings = Arc::new(config.matcher.clone());

    let context = zmq::Context::new();
    let responder = match context.socket(zmq::PULL) {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("Cannot create zmq socket: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = responder.bind(&config.zmq_address) {
        log::error!("Cannot bind to zmq address {}: {e}", config.zmq_address);
        std::process::exit(1);
    }
    log::info!("Listening for line item batches on {}", config.zmq_address);

    loop {
        let msg = match responder.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to receive message: {e}");
                continue;
            }
        };
        match serde_json::from_slice::<ZMQMessage>(&msg) {
            Ok(parsed) => {
                let handle = Arc::clone(&handle);
                let repo = Arc::clone(&repo);
                let provider = Arc::clone(&provider);
                let settings = Arc::clone(&settings);
                tokio::spawn(async move {
                    match parsed {
                        ZMQMessage::Match(batch) => {
                            let matcher =
                                Matcher::new(handle.snapshot().await, provider, (*settings).clone());
                            process_match_message(batch, &matcher, repo.as_ref()).await;
                        }
                        ZMQMessage::RebuildCatalog => {
                            process_rebuild_message(
                                &handle,
                                repo.as_ref(),
                                provider.as_ref(),
                                normalizer,
                            )
                            .await;
                        }
                    }
                });
            }
            Err(e) => log::error!("Failed to parse JSON: {e}"),
        }
    }
}
