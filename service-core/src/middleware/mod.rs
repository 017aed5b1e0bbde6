pub mod bearer_auth;
pub mod metrics;
pub mod security_headers;
pub mod tracing;
