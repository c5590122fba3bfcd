use std::sync::Arc;

use anyhow::Result;
use simtrack_core::DialPlan;
use simtrack_goip::GoipClient;
use simtrack_provider::ProviderClient;
use simtrack_service::{
    HistoryService, ProvisionService, ReconcileService, RegistryService, RetryPolicy,
};
use simtrack_storage::StorageBackend;

use crate::config::Config;

pub(crate) mod ops;
pub(crate) mod serve;

/// The wired-up service graph every command starts from.
pub(crate) struct Services {
    pub reconcile: Arc<ReconcileService>,
    pub provision: Arc<ProvisionService>,
    pub history: Arc<HistoryService>,
    pub registry: Arc<RegistryService>,
}

pub(crate) async fn build_services(config: &Config) -> Result<Services> {
    let storage = match config.database_url {
        Some(ref url) => Arc::new(StorageBackend::new_postgres(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            Arc::new(StorageBackend::new_memory())
        },
    };

    let provider = Arc::new(ProviderClient::new(
        config.provider_url.clone(),
        config.provider_key.clone(),
    )?);
    let goip = Arc::new(GoipClient::new(
        config.goip_url.clone(),
        config.goip_user.clone(),
        config.goip_password.clone(),
    )?);

    let reconcile = Arc::new(ReconcileService::new(
        Arc::clone(&storage),
        Arc::clone(&provider),
        goip,
        DialPlan::new(config.country_code.clone()),
        config.country_id.clone(),
        RetryPolicy::default(),
    ));
    let provision =
        Arc::new(ProvisionService::new(Arc::clone(&storage), provider, config.country_id.clone()));

    Ok(Services {
        reconcile,
        provision,
        history: Arc::new(HistoryService::new(Arc::clone(&storage))),
        registry: Arc::new(RegistryService::new(storage)),
    })
}
