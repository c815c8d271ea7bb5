use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::dispatch::{classify, BridgeMethod, FilterOp, LocalQuery, MethodRoute};
use crate::domain::{
    next_request_id, BridgeDelivery, CallEnvelope, CallRequest, ProviderSettings, RequestId,
    ResponseEnvelope,
};
use crate::events::{EventEmitter, ProviderEvent, ProviderEventKind};
use crate::pending::PendingCalls;
use crate::ports::{BridgePort, ProviderError, Upstream, UpstreamFactory};

#[derive(Default)]
struct ProviderState {
    chain_id: u64,
    address: String,
    ready: bool,
    upstream: Option<Arc<Upstream>>,
}

// A dispatched call works against the state captured at dispatch time, so a
// reconfigure mid-flight cannot redirect it to the new upstream instance.
struct Snapshot {
    chain_id: u64,
    address: String,
    ready: bool,
    upstream: Option<Arc<Upstream>>,
}

pub struct Provider {
    state: Mutex<ProviderState>,
    pending: PendingCalls,
    events: EventEmitter,
    factory: Arc<dyn UpstreamFactory>,
    bridge: Arc<dyn BridgePort>,
}

impl Provider {
    pub fn new(factory: Arc<dyn UpstreamFactory>, bridge: Arc<dyn BridgePort>) -> Self {
        Self {
            state: Mutex::new(ProviderState::default()),
            pending: PendingCalls::default(),
            events: EventEmitter::default(),
            factory,
            bridge,
        }
    }

    pub fn configure(&self, settings: &ProviderSettings) -> Result<(), ProviderError> {
        let upstream = Arc::new(self.factory.build(&settings.rpc_url)?);
        {
            let mut state = self.state_mut()?;
            state.chain_id = settings.chain_id;
            state.address = settings.address.to_lowercase();
            state.ready = !state.address.is_empty();
            state.upstream = Some(upstream);
        }
        info!(chain_id = settings.chain_id, "provider configured");
        self.events.emit(&ProviderEvent::Connect);
        Ok(())
    }

    pub fn update_address(&self, address: &str) -> Result<(), ProviderError> {
        let accounts = {
            let mut state = self.state_mut()?;
            state.address = address.to_lowercase();
            state.ready = !state.address.is_empty();
            if state.ready {
                vec![state.address.clone()]
            } else {
                Vec::new()
            }
        };
        self.events.emit(&ProviderEvent::AccountsChanged { accounts });
        Ok(())
    }

    // Replaces the upstream wholesale; calls dispatched against the previous
    // instance keep their own Arc and settle independently.
    pub fn reconfigure(&self, settings: &ProviderSettings) -> Result<(), ProviderError> {
        self.update_address(&settings.address)?;
        let upstream = Arc::new(self.factory.build(&settings.rpc_url)?);
        {
            let mut state = self.state_mut()?;
            state.chain_id = settings.chain_id;
            state.upstream = Some(upstream);
        }
        info!(chain_id = settings.chain_id, "provider reconfigured");
        self.events.emit(&ProviderEvent::NetworkChanged {
            chain_id: settings.chain_id,
        });
        Ok(())
    }

    pub async fn call(
        &self,
        method: &str,
        params: Value,
        id: Option<RequestId>,
    ) -> Result<ResponseEnvelope, ProviderError> {
        let id = id.unwrap_or_else(next_request_id);
        // Malformed input fails here, before anything is registered.
        let envelope = CallEnvelope::new(method, params, id)?;
        let snapshot = self.snapshot()?;
        let receiver = self.pending.register(&envelope.id)?;

        let route = classify(&envelope.method);
        debug!(method = %envelope.method, id = %envelope.id, ?route, "dispatching call");
        match route {
            MethodRoute::Local(query) => {
                let value = local_answer(query, &snapshot);
                self.pending.resolve(&envelope.id, value);
            }
            MethodRoute::Bridge(method) => self.dispatch_bridge(method, &envelope, &snapshot),
            MethodRoute::Filter(op) => self.dispatch_filter(op, &envelope, &snapshot).await,
            MethodRoute::Passthrough => self.dispatch_remote(&envelope, &snapshot).await,
        }

        receiver.await.map_err(|_| ProviderError::Dropped)?
    }

    pub async fn call_with_callback<F>(&self, request: CallRequest, callback: F)
    where
        F: FnOnce(Result<ResponseEnvelope, ProviderError>),
    {
        callback(self.call_request(request).await);
    }

    // Every request is dispatched before any completion is awaited; the
    // callback sees either the ordered responses or the first error in
    // request order.
    pub async fn call_batch<F>(&self, requests: Vec<CallRequest>, callback: F)
    where
        F: FnOnce(Result<Vec<ResponseEnvelope>, ProviderError>),
    {
        let settled =
            futures::future::join_all(requests.into_iter().map(|r| self.call_request(r))).await;
        let mut responses = Vec::with_capacity(settled.len());
        let mut first_error = None;
        for outcome in settled {
            match outcome {
                Ok(response) => responses.push(response),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        callback(match first_error {
            Some(error) => Err(error),
            None => Ok(responses),
        });
    }

    pub async fn request_accounts(&self) -> Result<Value, ProviderError> {
        let response = self.call("eth_requestAccounts", json!([]), None).await?;
        Ok(response.result)
    }

    // Inbound completion path for host-originated bridge responses. Unknown
    // or already settled ids are ignored, which makes duplicate and late
    // deliveries safe.
    pub fn handle_host_response(&self, id: &RequestId, outcome: Result<Value, ProviderError>) {
        match outcome {
            Ok(value) => self.pending.resolve(id, value),
            Err(error) => self.pending.reject(id, error),
        }
    }

    pub fn on(
        &self,
        kind: ProviderEventKind,
        handler: impl Fn(&ProviderEvent) + Send + Sync + 'static,
    ) {
        self.events.on(kind, handler);
    }

    pub fn emit_close(&self, code: i64, reason: &str) {
        self.events.emit(&ProviderEvent::Close {
            code,
            reason: reason.to_owned(),
        });
    }

    pub fn emit_notification(&self, payload: Value) {
        self.events.emit(&ProviderEvent::Notification { payload });
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    async fn call_request(&self, request: CallRequest) -> Result<ResponseEnvelope, ProviderError> {
        self.call(&request.method, request.params, request.id).await
    }

    fn dispatch_bridge(&self, method: BridgeMethod, envelope: &CallEnvelope, snapshot: &Snapshot) {
        if !snapshot.ready && method != BridgeMethod::RequestAccounts {
            self.pending.reject(&envelope.id, ProviderError::NotReady);
            return;
        }
        let payload = match method.host_payload(&envelope.params) {
            Ok(payload) => payload,
            Err(error) => {
                self.pending.reject(&envelope.id, error);
                return;
            }
        };
        let delivery = BridgeDelivery {
            name: method.handler_name().to_owned(),
            object: payload,
            id: envelope.id.clone(),
        };
        // Fire-and-forget: the host answers out-of-band through
        // handle_host_response, or never.
        if let Err(error) = self.bridge.deliver(delivery) {
            self.pending.reject(&envelope.id, error);
        }
    }

    async fn dispatch_filter(&self, op: FilterOp, envelope: &CallEnvelope, snapshot: &Snapshot) {
        let Some(upstream) = snapshot.upstream.as_ref() else {
            self.pending.reject(
                &envelope.id,
                ProviderError::Transport("provider not configured".to_owned()),
            );
            return;
        };
        let outcome = match op {
            FilterOp::New => upstream.filters.new_filter(envelope).await,
            FilterOp::NewBlock => upstream.filters.new_block_filter().await,
            FilterOp::NewPendingTransaction => {
                upstream.filters.new_pending_transaction_filter().await
            }
            FilterOp::Uninstall | FilterOp::Changes | FilterOp::Logs => {
                match envelope.params.get(0) {
                    None => Err(ProviderError::Validation(
                        "missing filter id in params[0]".to_owned(),
                    )),
                    Some(filter_id) => match op {
                        FilterOp::Uninstall => upstream.filters.uninstall_filter(filter_id).await,
                        FilterOp::Changes => upstream.filters.get_filter_changes(filter_id).await,
                        _ => upstream.filters.get_filter_logs(filter_id).await,
                    },
                }
            }
        };
        match outcome {
            Ok(value) => self.pending.resolve(&envelope.id, value),
            Err(error) => self.pending.reject(&envelope.id, error),
        }
    }

    async fn dispatch_remote(&self, envelope: &CallEnvelope, snapshot: &Snapshot) {
        let Some(upstream) = snapshot.upstream.as_ref() else {
            self.pending.reject(
                &envelope.id,
                ProviderError::Transport("provider not configured".to_owned()),
            );
            return;
        };
        match upstream.rpc.call(envelope).await {
            Ok(value) => self.pending.resolve(&envelope.id, value),
            Err(error) => self.pending.reject(&envelope.id, error),
        }
    }

    fn snapshot(&self) -> Result<Snapshot, ProviderError> {
        let state = self.state_mut()?;
        Ok(Snapshot {
            chain_id: state.chain_id,
            address: state.address.clone(),
            ready: state.ready,
            upstream: state.upstream.clone(),
        })
    }

    fn state_mut(&self) -> Result<MutexGuard<'_, ProviderState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Transport(format!("provider state lock poisoned: {e}")))
    }
}

fn local_answer(query: LocalQuery, snapshot: &Snapshot) -> Value {
    match query {
        LocalQuery::Accounts => {
            if snapshot.ready {
                json!([snapshot.address])
            } else {
                json!([])
            }
        }
        LocalQuery::Coinbase => json!(snapshot.address),
        LocalQuery::NetVersion => {
            if snapshot.chain_id == 0 {
                Value::Null
            } else {
                json!(snapshot.chain_id.to_string())
            }
        }
        LocalQuery::ChainId => json!(format!("0x{:x}", snapshot.chain_id)),
    }
}
