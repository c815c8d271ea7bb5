#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub request_timeout_ms: u64,
    pub filter_poll_max_blocks: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
            filter_poll_max_blocks: 1_000,
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_u64("RUSTY_WEB3_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = v;
        }
        if let Some(v) = env_u64("RUSTY_WEB3_FILTER_POLL_MAX_BLOCKS") {
            config.filter_poll_max_blocks = v;
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
