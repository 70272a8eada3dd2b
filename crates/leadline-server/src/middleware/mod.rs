pub(crate) mod rate_limit;
pub(crate) mod request_tracing;
pub(crate) mod security;
