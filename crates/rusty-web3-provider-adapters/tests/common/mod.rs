#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use rusty_web3_provider_core::{CallEnvelope, ProviderError, RpcPort};

// Scripted upstream: canned replies are queued per method and handed out in
// order; an unscripted method is a transport error.
#[derive(Default)]
pub struct ScriptedRpc {
    pub calls: Mutex<Vec<CallEnvelope>>,
    replies: Mutex<HashMap<String, VecDeque<Value>>>,
}

impl ScriptedRpc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, method: &str, reply: Value) {
        self.replies
            .lock()
            .expect("script lock")
            .entry(method.to_owned())
            .or_default()
            .push_back(reply);
    }

    pub fn recorded(&self) -> Vec<CallEnvelope> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<CallEnvelope> {
        self.recorded()
            .into_iter()
            .filter(|e| e.method == method)
            .collect()
    }
}

#[async_trait]
impl RpcPort for ScriptedRpc {
    async fn call(&self, envelope: &CallEnvelope) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(envelope.clone());
        self.replies
            .lock()
            .expect("script lock")
            .get_mut(&envelope.method)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                ProviderError::Transport(format!("unscripted method: {}", envelope.method))
            })
    }
}
