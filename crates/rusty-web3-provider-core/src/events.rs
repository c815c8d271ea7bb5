use std::sync::Mutex;

use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEventKind {
    Connect,
    Close,
    NetworkChanged,
    AccountsChanged,
    Notification,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Connect,
    Close { code: i64, reason: String },
    NetworkChanged { chain_id: u64 },
    AccountsChanged { accounts: Vec<String> },
    Notification { payload: Value },
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            Self::Connect => ProviderEventKind::Connect,
            Self::Close { .. } => ProviderEventKind::Close,
            Self::NetworkChanged { .. } => ProviderEventKind::NetworkChanged,
            Self::AccountsChanged { .. } => ProviderEventKind::AccountsChanged,
            Self::Notification { .. } => ProviderEventKind::Notification,
        }
    }
}

type Handler = Box<dyn Fn(&ProviderEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventEmitter {
    handlers: Mutex<Vec<(ProviderEventKind, Handler)>>,
}

impl EventEmitter {
    pub fn on(
        &self,
        kind: ProviderEventKind,
        handler: impl Fn(&ProviderEvent) + Send + Sync + 'static,
    ) {
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.push((kind, Box::new(handler))),
            Err(e) => warn!("event handler registry lock poisoned: {e}"),
        }
    }

    // Synchronous delivery in registration order; no replay to late subscribers.
    pub fn emit(&self, event: &ProviderEvent) {
        let handlers = match self.handlers.lock() {
            Ok(handlers) => handlers,
            Err(e) => {
                warn!("event handler registry lock poisoned: {e}");
                return;
            }
        };
        let kind = event.kind();
        for (registered, handler) in handlers.iter() {
            if *registered == kind {
                handler(event);
            }
        }
    }
}
