#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use rusty_web3_provider_core::{
    BridgeDelivery, BridgePort, CallEnvelope, FilterPort, Provider, ProviderError,
    ProviderSettings, RpcPort, Upstream, UpstreamFactory,
};

pub fn settings(chain_id: u64, address: &str) -> ProviderSettings {
    ProviderSettings {
        chain_id,
        address: address.to_owned(),
        rpc_url: "http://localhost:8545".to_owned(),
    }
}

type ReplyFn = dyn Fn(&CallEnvelope) -> Result<Value, ProviderError> + Send + Sync;

pub struct MockRpc {
    pub calls: Mutex<Vec<CallEnvelope>>,
    reply: Box<ReplyFn>,
}

impl MockRpc {
    pub fn with(
        reply: impl Fn(&CallEnvelope) -> Result<Value, ProviderError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    // Replies with a full JSON-RPC body, the shape a real HTTP transport hands back.
    pub fn full_body(label: &str) -> Arc<Self> {
        let label = label.to_owned();
        Self::with(move |envelope| {
            Ok(json!({ "jsonrpc": "2.0", "id": envelope.id, "result": label }))
        })
    }

    pub fn recorded(&self) -> Vec<CallEnvelope> {
        self.calls.lock().expect("rpc calls lock").clone()
    }
}

#[async_trait]
impl RpcPort for MockRpc {
    async fn call(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .expect("rpc calls lock")
            .push(envelope.clone());
        (self.reply)(envelope)
    }
}

// Waits for a permit before answering, so a test can reconfigure the provider
// while a call against this upstream is still in flight.
pub struct GatedRpc {
    pub label: String,
    pub gate: Semaphore,
}

impl GatedRpc {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_owned(),
            gate: Semaphore::new(0),
        })
    }
}

#[async_trait]
impl RpcPort for GatedRpc {
    async fn call(&self, _envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProviderError::Transport(format!("gate closed: {e}")))?;
        Ok(json!(self.label))
    }
}

#[derive(Default)]
pub struct MockFilters {
    pub ops: Mutex<Vec<String>>,
}

impl MockFilters {
    fn record(&self, op: String) {
        self.ops.lock().expect("filter ops lock").push(op);
    }

    pub fn recorded(&self) -> Vec<String> {
        self.ops.lock().expect("filter ops lock").clone()
    }
}

#[async_trait]
impl FilterPort for MockFilters {
    async fn new_filter(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        self.record(format!("new_filter:{}", envelope.params));
        Ok(json!("0x1"))
    }

    async fn new_block_filter(&self) -> Result<Value, ProviderError> {
        self.record("new_block_filter".to_owned());
        Ok(json!("0x2"))
    }

    async fn new_pending_transaction_filter(&self) -> Result<Value, ProviderError> {
        self.record("new_pending_transaction_filter".to_owned());
        Ok(json!("0x3"))
    }

    async fn uninstall_filter(&self, filter_id: &Value) -> Result<Value, ProviderError> {
        self.record(format!("uninstall_filter:{filter_id}"));
        Ok(json!(true))
    }

    async fn get_filter_changes(&self, filter_id: &Value) -> Result<Value, ProviderError> {
        self.record(format!("get_filter_changes:{filter_id}"));
        Ok(json!([]))
    }

    async fn get_filter_logs(&self, filter_id: &Value) -> Result<Value, ProviderError> {
        self.record(format!("get_filter_logs:{filter_id}"));
        Ok(json!([]))
    }
}

pub struct MockBridge {
    pub deliveries: Mutex<Vec<BridgeDelivery>>,
    closed: bool,
}

impl MockBridge {
    pub fn open() -> Arc<Self> {
        Arc::new(Self {
            deliveries: Mutex::new(Vec::new()),
            closed: false,
        })
    }

    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            deliveries: Mutex::new(Vec::new()),
            closed: true,
        })
    }

    pub fn recorded(&self) -> Vec<BridgeDelivery> {
        self.deliveries.lock().expect("bridge lock").clone()
    }
}

impl BridgePort for MockBridge {
    fn deliver(&self, delivery: BridgeDelivery) -> Result<(), ProviderError> {
        if self.closed {
            return Err(ProviderError::Transport(
                "host bridge unavailable".to_owned(),
            ));
        }
        self.deliveries.lock().expect("bridge lock").push(delivery);
        Ok(())
    }
}

pub struct StaticFactory {
    upstream: Upstream,
    pub builds: AtomicUsize,
}

impl StaticFactory {
    pub fn new(rpc: Arc<dyn RpcPort>, filters: Arc<dyn FilterPort>) -> Arc<Self> {
        Arc::new(Self {
            upstream: Upstream { rpc, filters },
            builds: AtomicUsize::new(0),
        })
    }
}

impl UpstreamFactory for StaticFactory {
    fn build(&self, _rpc_url: &str) -> Result<Upstream, ProviderError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.upstream.clone())
    }
}

pub struct SequenceFactory {
    upstreams: Mutex<VecDeque<Upstream>>,
}

impl SequenceFactory {
    pub fn new(upstreams: Vec<Upstream>) -> Arc<Self> {
        Arc::new(Self {
            upstreams: Mutex::new(upstreams.into()),
        })
    }
}

impl UpstreamFactory for SequenceFactory {
    fn build(&self, _rpc_url: &str) -> Result<Upstream, ProviderError> {
        self.upstreams
            .lock()
            .expect("factory lock")
            .pop_front()
            .ok_or_else(|| ProviderError::Transport("factory exhausted".to_owned()))
    }
}

pub fn upstream(rpc: Arc<dyn RpcPort>) -> Upstream {
    Upstream {
        rpc,
        filters: Arc::new(MockFilters::default()),
    }
}

pub struct Harness {
    pub provider: Arc<Provider>,
    pub rpc: Arc<MockRpc>,
    pub filters: Arc<MockFilters>,
    pub bridge: Arc<MockBridge>,
}

pub fn harness(chain_id: u64, address: &str) -> Harness {
    let rpc = MockRpc::full_body("remote");
    let filters = Arc::new(MockFilters::default());
    let bridge = MockBridge::open();
    let factory = StaticFactory::new(
        Arc::clone(&rpc) as Arc<dyn RpcPort>,
        Arc::clone(&filters) as Arc<dyn FilterPort>,
    );
    let provider = Arc::new(Provider::new(factory, Arc::clone(&bridge) as Arc<dyn BridgePort>));
    provider
        .configure(&settings(chain_id, address))
        .expect("configure provider");
    Harness {
        provider,
        rpc,
        filters,
        bridge,
    }
}

pub async fn wait_for_deliveries(bridge: &MockBridge, count: usize) {
    for _ in 0..200 {
        if bridge.recorded().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("bridge delivery {count} did not arrive");
}
