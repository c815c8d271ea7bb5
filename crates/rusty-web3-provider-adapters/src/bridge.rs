use tokio::sync::mpsc;

use rusty_web3_provider_core::{BridgeDelivery, BridgePort, ProviderError};

// Channel-backed host transport: deliveries are fire-and-forget, completions
// come back through the provider's host-response entry point.
#[derive(Debug, Clone)]
pub struct HostBridgeChannel {
    sender: mpsc::UnboundedSender<BridgeDelivery>,
}

impl HostBridgeChannel {
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<BridgeDelivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl BridgePort for HostBridgeChannel {
    fn deliver(&self, delivery: BridgeDelivery) -> Result<(), ProviderError> {
        self.sender
            .send(delivery)
            .map_err(|e| ProviderError::Transport(format!("host bridge channel closed: {e}")))
    }
}
