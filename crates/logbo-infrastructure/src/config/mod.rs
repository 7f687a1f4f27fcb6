mod timeouts;

pub use timeouts::{BackoffConfig, RetryConfig, TimeoutConfig};
