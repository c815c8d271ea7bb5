use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::U64;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use rusty_web3_provider_core::{
    next_request_id, normalize_result, CallEnvelope, FilterPort, ProviderError, RpcPort,
};

use crate::config::AdapterConfig;

#[derive(Debug, Clone)]
enum FilterKind {
    Log { criteria: Map<String, Value> },
    Block,
    PendingTransaction,
}

#[derive(Debug, Clone)]
struct FilterRecord {
    kind: FilterKind,
    cursor: u64,
}

// In-process filter registry polling an upstream node. Installed filters are
// never expired, the same accepted-growth posture as the pending-call table.
pub struct FilterManager {
    rpc: Arc<dyn RpcPort>,
    config: AdapterConfig,
    next_id: AtomicU64,
    records: Mutex<HashMap<String, FilterRecord>>,
}

impl FilterManager {
    pub fn new(rpc: Arc<dyn RpcPort>, config: AdapterConfig) -> Self {
        Self {
            rpc,
            config,
            next_id: AtomicU64::new(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    fn allocate_id(&self) -> String {
        format!("0x{:x}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn install(&self, kind: FilterKind, cursor: u64) -> Result<Value, ProviderError> {
        let id = self.allocate_id();
        debug!(filter_id = %id, cursor, "installing filter");
        self.lock()?.insert(id.clone(), FilterRecord { kind, cursor });
        Ok(json!(id))
    }

    fn lookup(&self, id: &str) -> Result<FilterRecord, ProviderError> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::Validation("filter not found".to_owned()))
    }

    // The record may have been uninstalled while the poll was in flight; the
    // collected changes are still returned to the caller.
    fn advance_cursor(&self, id: &str, to: u64) -> Result<(), ProviderError> {
        if let Some(record) = self.lock()?.get_mut(id) {
            record.cursor = record.cursor.max(to);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, FilterRecord>>, ProviderError> {
        self.records
            .lock()
            .map_err(|e| ProviderError::Transport(format!("filter registry lock poisoned: {e}")))
    }

    async fn rpc_query(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let envelope = CallEnvelope::new(method, params, next_request_id())?;
        let raw = self.rpc.call(&envelope).await?;
        Ok(normalize_result(raw))
    }

    async fn current_block(&self) -> Result<u64, ProviderError> {
        let value = self.rpc_query("eth_blockNumber", json!([])).await?;
        quantity_to_u64(&value)
    }
}

#[async_trait]
impl FilterPort for FilterManager {
    async fn new_filter(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        let criteria = envelope
            .params
            .get(0)
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                ProviderError::Validation("filter criteria must be an object".to_owned())
            })?;
        let cursor = self.current_block().await?;
        self.install(FilterKind::Log { criteria }, cursor)
    }

    async fn new_block_filter(&self) -> Result<Value, ProviderError> {
        let cursor = self.current_block().await?;
        self.install(FilterKind::Block, cursor)
    }

    async fn new_pending_transaction_filter(&self) -> Result<Value, ProviderError> {
        self.install(FilterKind::PendingTransaction, 0)
    }

    async fn uninstall_filter(&self, filter_id: &Value) -> Result<Value, ProviderError> {
        let id = filter_id_str(filter_id)?;
        Ok(json!(self.lock()?.remove(&id).is_some()))
    }

    async fn get_filter_changes(&self, filter_id: &Value) -> Result<Value, ProviderError> {
        let id = filter_id_str(filter_id)?;
        let record = self.lookup(&id)?;
        match record.kind {
            FilterKind::Log { criteria } => {
                let latest = self.current_block().await?;
                if latest <= record.cursor {
                    return Ok(json!([]));
                }
                let mut query = criteria;
                query.insert("fromBlock".to_owned(), quantity(record.cursor + 1));
                query.insert("toBlock".to_owned(), quantity(latest));
                let logs = self.rpc_query("eth_getLogs", json!([query])).await?;
                self.advance_cursor(&id, latest)?;
                Ok(logs)
            }
            FilterKind::Block => {
                let latest = self.current_block().await?;
                let to = latest.min(record.cursor.saturating_add(self.config.filter_poll_max_blocks));
                let mut hashes = Vec::new();
                for number in record.cursor + 1..=to {
                    let block = self
                        .rpc_query("eth_getBlockByNumber", json!([quantity(number), false]))
                        .await?;
                    match block.get("hash") {
                        Some(hash) if !hash.is_null() => hashes.push(hash.clone()),
                        _ => {}
                    }
                }
                self.advance_cursor(&id, to)?;
                Ok(Value::Array(hashes))
            }
            FilterKind::PendingTransaction => Err(ProviderError::NotImplemented(
                "pending transaction filter polling",
            )),
        }
    }

    async fn get_filter_logs(&self, filter_id: &Value) -> Result<Value, ProviderError> {
        let id = filter_id_str(filter_id)?;
        let record = self.lookup(&id)?;
        match record.kind {
            FilterKind::Log { criteria } => {
                // Original criteria, original range: this is not a poll and
                // does not move the cursor.
                self.rpc_query("eth_getLogs", json!([criteria])).await
            }
            _ => Err(ProviderError::Validation(
                "filter logs are only available for log filters".to_owned(),
            )),
        }
    }
}

fn filter_id_str(filter_id: &Value) -> Result<String, ProviderError> {
    filter_id
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ProviderError::Validation("filter id must be a string".to_owned()))
}

fn quantity(number: u64) -> Value {
    json!(format!("0x{number:x}"))
}

fn quantity_to_u64(value: &Value) -> Result<u64, ProviderError> {
    let raw = value.as_str().ok_or_else(|| {
        ProviderError::Transport(format!("block quantity must be a hex string, got {value}"))
    })?;
    let parsed = U64::from_str(raw)
        .map_err(|e| ProviderError::Transport(format!("invalid block quantity {raw}: {e}")))?;
    Ok(parsed.to::<u64>())
}
