use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::catalog::domain::CatalogStore;
use crate::catalog::domain::service::CatalogStoreImpl;
use crate::core::domain::Configuration;
use crate::core::logger::Logger;

pub fn create_catalog_store(config: &Configuration, logger: Arc<dyn Logger>,
                            shutdown: CancellationToken) -> Box<dyn CatalogStore> {
    Box::new(CatalogStoreImpl::new(config, logger, shutdown))
}
