use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::ProviderError;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    Text(String),
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

// Process-wide fetch-add counter: a value is handed out at most once, so a
// generated id can never collide with any other outstanding generated id.
pub fn next_request_id() -> RequestId {
    RequestId::Number(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    pub params: Value,
}

impl CallEnvelope {
    pub fn new(
        method: impl Into<String>,
        params: Value,
        id: RequestId,
    ) -> Result<Self, ProviderError> {
        let method = method.into();
        if method.is_empty() {
            return Err(ProviderError::Validation(
                "method must be a non-empty string".to_owned(),
            ));
        }
        if !params.is_array() {
            return Err(ProviderError::Validation(
                "params must be an array".to_owned(),
            ));
        }
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            method,
            params,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

impl ResponseEnvelope {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result,
        }
    }
}

// Upstream transports hand back full JSON-RPC response bodies; detect that
// shape and unwrap the inner result so it is not wrapped a second time.
pub fn normalize_result(raw: Value) -> Value {
    match raw {
        Value::Object(ref map) if map.contains_key("jsonrpc") && map.contains_key("result") => {
            map["result"].clone()
        }
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeDelivery {
    pub name: String,
    pub object: Value,
    pub id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub chain_id: u64,
    pub address: String,
    pub rpc_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub method: String,
    #[serde(default = "empty_params")]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

fn empty_params() -> Value {
    Value::Array(Vec::new())
}
