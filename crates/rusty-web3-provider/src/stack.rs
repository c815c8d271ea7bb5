use std::sync::Arc;

use rusty_web3_provider_adapters::{AdapterConfig, HostBridgeChannel, HttpUpstreamFactory};
use rusty_web3_provider_core::{Provider, ProviderError, ProviderSettings, UpstreamFactory};

use crate::host::HostHandle;

pub struct ProviderStack {
    pub provider: Arc<Provider>,
    pub host: HostHandle,
}

impl ProviderStack {
    pub fn http(settings: &ProviderSettings, config: AdapterConfig) -> Result<Self, ProviderError> {
        Self::with_upstream(settings, Arc::new(HttpUpstreamFactory::new(config)))
    }

    pub fn with_upstream(
        settings: &ProviderSettings,
        factory: Arc<dyn UpstreamFactory>,
    ) -> Result<Self, ProviderError> {
        let (bridge, deliveries) = HostBridgeChannel::pair();
        let provider = Arc::new(Provider::new(factory, Arc::new(bridge)));
        provider.configure(settings)?;
        let host = HostHandle::new(Arc::clone(&provider), deliveries);
        Ok(Self { provider, host })
    }
}
