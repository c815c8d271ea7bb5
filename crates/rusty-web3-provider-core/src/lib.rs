pub mod dispatch;
pub mod domain;
pub mod events;
pub mod pending;
pub mod ports;
pub mod provider;

pub use dispatch::{classify, BridgeMethod, FilterOp, LocalQuery, MethodRoute};
pub use domain::{
    next_request_id, normalize_result, BridgeDelivery, CallEnvelope, CallRequest,
    ProviderSettings, RequestId, ResponseEnvelope, JSONRPC_VERSION,
};
pub use events::{EventEmitter, ProviderEvent, ProviderEventKind};
pub use pending::{CallOutcome, PendingCalls};
pub use ports::{BridgePort, FilterPort, ProviderError, RpcPort, Upstream, UpstreamFactory};
pub use provider::Provider;
