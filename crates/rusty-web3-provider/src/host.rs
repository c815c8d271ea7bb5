use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tracing::info;

use rusty_web3_provider_core::{
    BridgeDelivery, Provider, ProviderError, ProviderSettings, RequestId,
};

// The host application's side of the signing bridge: receives deliveries,
// settles them against the provider, and pushes account/network updates.
pub struct HostHandle {
    provider: Arc<Provider>,
    deliveries: Mutex<UnboundedReceiver<BridgeDelivery>>,
}

impl HostHandle {
    pub(crate) fn new(provider: Arc<Provider>, deliveries: UnboundedReceiver<BridgeDelivery>) -> Self {
        Self {
            provider,
            deliveries: Mutex::new(deliveries),
        }
    }

    pub async fn next_request(&self) -> Option<BridgeDelivery> {
        self.deliveries.lock().await.recv().await
    }

    pub fn respond(&self, id: &RequestId, result: Value) {
        self.provider.handle_host_response(id, Ok(result));
    }

    pub fn fail(&self, id: &RequestId, error: ProviderError) {
        self.provider.handle_host_response(id, Err(error));
    }

    pub fn approve_accounts(
        &self,
        request: &BridgeDelivery,
        address: &str,
    ) -> Result<(), ProviderError> {
        if request.name != "requestAccounts" {
            return Err(ProviderError::Validation(format!(
                "cannot approve accounts for handler {}",
                request.name
            )));
        }
        self.provider.update_address(address)?;
        info!(id = %request.id, "account request approved");
        self.respond(&request.id, json!([address.to_lowercase()]));
        Ok(())
    }

    pub fn switch_network(&self, settings: &ProviderSettings) -> Result<(), ProviderError> {
        self.provider.reconfigure(settings)
    }
}
