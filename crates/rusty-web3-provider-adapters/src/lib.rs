pub mod bridge;
pub mod config;
pub mod filters;
pub mod http;

pub use bridge::HostBridgeChannel;
pub use config::AdapterConfig;
pub use filters::FilterManager;
pub use http::{HttpRpcAdapter, HttpUpstreamFactory};
