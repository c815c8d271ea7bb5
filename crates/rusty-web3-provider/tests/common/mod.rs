#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_web3_provider_core::{
    CallEnvelope, FilterPort, ProviderError, ProviderSettings, RpcPort, Upstream, UpstreamFactory,
};

pub fn settings(chain_id: u64, address: &str, rpc_url: &str) -> ProviderSettings {
    ProviderSettings {
        chain_id,
        address: address.to_owned(),
        rpc_url: rpc_url.to_owned(),
    }
}

// Upstream stub that labels every answer with the endpoint it was built for,
// so tests can tell which network instance served a call.
pub struct LabelledRpc {
    pub endpoint: String,
    pub calls: Mutex<Vec<CallEnvelope>>,
}

#[async_trait]
impl RpcPort for LabelledRpc {
    async fn call(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(envelope.clone());
        Ok(json!({
            "jsonrpc": "2.0",
            "id": envelope.id,
            "result": format!("served-by:{}", self.endpoint),
        }))
    }
}

pub struct StubFilters;

#[async_trait]
impl FilterPort for StubFilters {
    async fn new_filter(&self, _envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        Ok(json!("0x1"))
    }

    async fn new_block_filter(&self) -> Result<Value, ProviderError> {
        Ok(json!("0x2"))
    }

    async fn new_pending_transaction_filter(&self) -> Result<Value, ProviderError> {
        Ok(json!("0x3"))
    }

    async fn uninstall_filter(&self, _filter_id: &Value) -> Result<Value, ProviderError> {
        Ok(json!(true))
    }

    async fn get_filter_changes(&self, _filter_id: &Value) -> Result<Value, ProviderError> {
        Ok(json!([]))
    }

    async fn get_filter_logs(&self, _filter_id: &Value) -> Result<Value, ProviderError> {
        Ok(json!([]))
    }
}

#[derive(Default)]
pub struct LabelledFactory {
    pub built: Mutex<Vec<Arc<LabelledRpc>>>,
}

impl UpstreamFactory for LabelledFactory {
    fn build(&self, rpc_url: &str) -> Result<Upstream, ProviderError> {
        let rpc = Arc::new(LabelledRpc {
            endpoint: rpc_url.to_owned(),
            calls: Mutex::new(Vec::new()),
        });
        self.built.lock().expect("built lock").push(Arc::clone(&rpc));
        Ok(Upstream {
            rpc,
            filters: Arc::new(StubFilters),
        })
    }
}
