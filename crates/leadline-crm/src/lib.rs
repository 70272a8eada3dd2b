#![forbid(unsafe_code)]
//! Outbound side of lead intake: CRM record mapping, OAuth login, HTTP and
//! relay sinks, and the dispatcher that falls back to mock receipts.

mod auth;
mod config;
mod dispatcher;
mod error;
mod http_sink;
mod mock;
mod record;
mod relay;
mod retry;
mod sink;

pub use auth::{AccessToken, CrmAuthenticator, TOKEN_PATH};
pub use config::{validate_http_url, CrmConfig, CrmMode, RelayConfig, Secret};
pub use dispatcher::{
    BreakerConfig, DispatchOutcome, FallbackCause, LeadDispatcher, RelayResult,
    CIRCUIT_OPEN_REASON,
};
pub use error::{CrmError, CrmErrorCode};
pub use http_sink::HttpCrmSink;
pub use mock::{MockSink, RecordingSink};
pub use record::{CrmLeadRecord, LEAD_SOURCE_CONTACT, LEAD_SOURCE_QUOTE, LEAD_STATUS_NEW};
pub use relay::{
    relay_signature, RelayEnvelope, WebhookRelaySink, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use retry::{BackoffPolicy, RetryPolicy};
pub use sink::{LeadSink, SinkMode, SinkReceipt};

pub const CRATE_NAME: &str = "leadline-crm";
