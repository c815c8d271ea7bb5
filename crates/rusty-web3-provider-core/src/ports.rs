use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{BridgeDelivery, CallEnvelope};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("provider is not ready")]
    NotReady,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("call dropped before completion")]
    Dropped,
}

#[async_trait]
pub trait RpcPort: Send + Sync {
    async fn call(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError>;
}

#[async_trait]
pub trait FilterPort: Send + Sync {
    async fn new_filter(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError>;
    async fn new_block_filter(&self) -> Result<Value, ProviderError>;
    async fn new_pending_transaction_filter(&self) -> Result<Value, ProviderError>;
    async fn uninstall_filter(&self, filter_id: &Value) -> Result<Value, ProviderError>;
    async fn get_filter_changes(&self, filter_id: &Value) -> Result<Value, ProviderError>;
    async fn get_filter_logs(&self, filter_id: &Value) -> Result<Value, ProviderError>;
}

pub trait BridgePort: Send + Sync {
    fn deliver(&self, delivery: BridgeDelivery) -> Result<(), ProviderError>;
}

#[derive(Clone)]
pub struct Upstream {
    pub rpc: Arc<dyn RpcPort>,
    pub filters: Arc<dyn FilterPort>,
}

pub trait UpstreamFactory: Send + Sync {
    fn build(&self, rpc_url: &str) -> Result<Upstream, ProviderError>;
}
