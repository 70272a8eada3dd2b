pub(crate) mod metrics;
pub(crate) mod rate_limiter;
