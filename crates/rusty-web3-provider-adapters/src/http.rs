use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use rusty_web3_provider_core::{
    CallEnvelope, ProviderError, RpcPort, Upstream, UpstreamFactory,
};

use crate::config::AdapterConfig;
use crate::filters::FilterManager;

#[derive(Debug, Clone)]
pub struct HttpRpcAdapter {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRpcAdapter {
    pub fn new(endpoint: &str, config: &AdapterConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build rpc http client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.to_owned(),
            client,
        })
    }
}

#[async_trait]
impl RpcPort for HttpRpcAdapter {
    async fn call(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        debug!(method = %envelope.method, id = %envelope.id, "forwarding to upstream node");
        let response = self
            .client
            .post(&self.endpoint)
            .json(envelope)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("rpc request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("rpc json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "rpc status {status}: {body}"
            )));
        }
        if let Some(error) = body.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32603);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("upstream error")
                .to_owned();
            return Err(ProviderError::Rpc { code, message });
        }
        // Full response body; the caller's normalization unwraps the result.
        Ok(body)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpUpstreamFactory {
    config: AdapterConfig,
}

impl HttpUpstreamFactory {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }
}

impl UpstreamFactory for HttpUpstreamFactory {
    fn build(&self, rpc_url: &str) -> Result<Upstream, ProviderError> {
        let rpc: Arc<dyn RpcPort> = Arc::new(HttpRpcAdapter::new(rpc_url, &self.config)?);
        let filters = Arc::new(FilterManager::new(Arc::clone(&rpc), self.config.clone()));
        Ok(Upstream { rpc, filters })
    }
}
