use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::{normalize_result, RequestId, ResponseEnvelope};
use crate::ports::ProviderError;

pub type CallOutcome = Result<ResponseEnvelope, ProviderError>;

#[derive(Default)]
pub struct PendingCalls {
    entries: Mutex<HashMap<RequestId, oneshot::Sender<CallOutcome>>>,
}

impl PendingCalls {
    pub fn register(&self, id: &RequestId) -> Result<oneshot::Receiver<CallOutcome>, ProviderError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| ProviderError::Transport(format!("pending table lock poisoned: {e}")))?;
        if entries.contains_key(id) {
            return Err(ProviderError::Validation(format!(
                "request id already in flight: {id}"
            )));
        }
        let (sender, receiver) = oneshot::channel();
        entries.insert(id.clone(), sender);
        Ok(receiver)
    }

    pub fn resolve(&self, id: &RequestId, value: Value) {
        let envelope = ResponseEnvelope::new(id.clone(), normalize_result(value));
        self.complete(id, Ok(envelope));
    }

    pub fn reject(&self, id: &RequestId, error: ProviderError) {
        self.complete(id, Err(error));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Removing the entry before sending is what makes a second resolve or
    // reject for the same id a no-op: there is nothing left to complete.
    fn complete(&self, id: &RequestId, outcome: CallOutcome) {
        let sender = match self.entries.lock() {
            Ok(mut entries) => entries.remove(id),
            Err(e) => {
                warn!(%id, "pending table lock poisoned during completion: {e}");
                return;
            }
        };
        match sender {
            Some(sender) => {
                if sender.send(outcome).is_err() {
                    warn!(%id, "caller went away before completion");
                }
            }
            None => {
                debug!(%id, "completion for unknown or already settled id ignored");
            }
        }
    }
}
