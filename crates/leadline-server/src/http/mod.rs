pub(crate) mod handlers;
pub(crate) mod portal;
pub(crate) mod request_tracing;
pub(crate) mod response;
pub(crate) mod submissions;
