use serde_json::{json, Value};

use crate::ports::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalQuery {
    Accounts,
    Coinbase,
    NetVersion,
    ChainId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMethod {
    SignMessage,
    SignPersonalMessage,
    EcRecover,
    SignTypedMessage,
    SignTransaction,
    RequestAccounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    New,
    NewBlock,
    NewPendingTransaction,
    Uninstall,
    Changes,
    Logs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRoute {
    Local(LocalQuery),
    Bridge(BridgeMethod),
    Filter(FilterOp),
    Passthrough,
}

// Unknown methods fall through to the upstream node, never to an error.
pub fn classify(method: &str) -> MethodRoute {
    match method {
        "eth_accounts" => MethodRoute::Local(LocalQuery::Accounts),
        "eth_coinbase" => MethodRoute::Local(LocalQuery::Coinbase),
        "net_version" => MethodRoute::Local(LocalQuery::NetVersion),
        "eth_chainId" => MethodRoute::Local(LocalQuery::ChainId),
        "eth_sign" => MethodRoute::Bridge(BridgeMethod::SignMessage),
        "personal_sign" => MethodRoute::Bridge(BridgeMethod::SignPersonalMessage),
        "personal_ecRecover" => MethodRoute::Bridge(BridgeMethod::EcRecover),
        "eth_signTypedData" | "eth_signTypedData_v3" => {
            MethodRoute::Bridge(BridgeMethod::SignTypedMessage)
        }
        "eth_sendTransaction" => MethodRoute::Bridge(BridgeMethod::SignTransaction),
        "eth_requestAccounts" => MethodRoute::Bridge(BridgeMethod::RequestAccounts),
        "eth_newFilter" => MethodRoute::Filter(FilterOp::New),
        "eth_newBlockFilter" => MethodRoute::Filter(FilterOp::NewBlock),
        "eth_newPendingTransactionFilter" => MethodRoute::Filter(FilterOp::NewPendingTransaction),
        "eth_uninstallFilter" => MethodRoute::Filter(FilterOp::Uninstall),
        "eth_getFilterChanges" => MethodRoute::Filter(FilterOp::Changes),
        "eth_getFilterLogs" => MethodRoute::Filter(FilterOp::Logs),
        _ => MethodRoute::Passthrough,
    }
}

impl BridgeMethod {
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::SignMessage => "signMessage",
            Self::SignPersonalMessage => "signPersonalMessage",
            Self::EcRecover => "ecRecover",
            Self::SignTypedMessage => "signTypedMessage",
            Self::SignTransaction => "signTransaction",
            Self::RequestAccounts => "requestAccounts",
        }
    }

    pub fn host_payload(self, params: &Value) -> Result<Value, ProviderError> {
        let param = |index: usize| {
            params.get(index).cloned().ok_or_else(|| {
                ProviderError::Validation(format!(
                    "missing params[{index}] for {}",
                    self.handler_name()
                ))
            })
        };
        match self {
            Self::SignMessage => Ok(json!({ "data": param(1)? })),
            Self::SignPersonalMessage => Ok(json!({ "data": param(0)? })),
            Self::EcRecover => Ok(json!({ "signature": param(1)?, "message": param(0)? })),
            Self::SignTypedMessage => Ok(json!({ "data": param(1)? })),
            Self::SignTransaction => {
                let tx = param(0)?;
                if !tx.is_object() {
                    return Err(ProviderError::Validation(
                        "transaction payload must be an object".to_owned(),
                    ));
                }
                Ok(tx)
            }
            Self::RequestAccounts => Ok(json!({})),
        }
    }
}
