pub mod host;
pub mod stack;

pub use host::HostHandle;
pub use stack::ProviderStack;
