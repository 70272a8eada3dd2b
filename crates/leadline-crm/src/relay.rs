// SPDX-License-Identifier: Apache-2.0

use crate::config::{validate_http_url, RelayConfig, Secret};
use crate::error::{CrmError, CrmErrorCode};
use crate::sink::{LeadSink, SinkReceipt};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use leadline_model::Submission;
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, instrument};

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-leadline-timestamp";
pub const SIGNATURE_HEADER: &str = "x-leadline-signature";

#[derive(Debug, Serialize)]
pub struct RelayEnvelope<'a> {
    pub kind: &'static str,
    pub submission_id: &'a str,
    pub received_at_ms: u64,
    pub payload: Value,
}

impl<'a> RelayEnvelope<'a> {
    pub fn from_submission(submission: &'a Submission) -> Result<Self, CrmError> {
        let payload = match submission {
            Submission::Quote(lead) => serde_json::to_value(lead),
            Submission::Contact(message) => serde_json::to_value(message),
        }
        .map_err(|e| CrmError::new(CrmErrorCode::Internal, format!("relay payload: {e}")))?;
        Ok(Self {
            kind: submission.kind().as_str(),
            submission_id: submission.id().as_str(),
            received_at_ms: submission.received_at_ms(),
            payload,
        })
    }
}

/// `hex(HMAC-SHA256(secret, "{timestamp}\n{body}"))`
pub fn relay_signature(secret: &Secret, timestamp: u64, body: &[u8]) -> Result<String, CrmError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
        .map_err(|e| CrmError::new(CrmErrorCode::Config, e.to_string()))?;
    mac.update(format!("{timestamp}\n").as_bytes());
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Fans submissions out to an automation webhook.
pub struct WebhookRelaySink {
    client: reqwest::Client,
    url: String,
    secret: Option<Secret>,
}

impl WebhookRelaySink {
    pub fn new(url: &str, cfg: &RelayConfig) -> Result<Self, CrmError> {
        validate_http_url("relay url", url)?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| CrmError::new(CrmErrorCode::Config, format!("relay client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
            secret: cfg.secret.clone().filter(|s| !s.is_empty()),
        })
    }

    /// Builds a relay from config; `None` when no relay url is set.
    pub fn from_config(cfg: &RelayConfig) -> Result<Option<Self>, CrmError> {
        cfg.url.as_deref().map(|url| Self::new(url, cfg)).transpose()
    }
}

#[async_trait]
impl LeadSink for WebhookRelaySink {
    fn sink_tag(&self) -> &'static str {
        "webhook_relay"
    }

    #[instrument(name = "relay_submit", skip_all, fields(submission_id = %submission.id()))]
    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, CrmError> {
        let envelope = RelayEnvelope::from_submission(submission)?;
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| CrmError::new(CrmErrorCode::Internal, format!("relay body: {e}")))?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut req = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(TIMESTAMP_HEADER, timestamp.to_string());
        if let Some(secret) = &self.secret {
            req = req.header(SIGNATURE_HEADER, relay_signature(secret, timestamp, &body)?);
        }
        let resp = req
            .body(body)
            .send()
            .await
            .map_err(|e| CrmError::from_transport("relay request failed", &e))?;
        let status = resp.status();
        if status.is_success() {
            info!(status = status.as_u16(), "relay delivered");
            return Ok(SinkReceipt::live(submission.id().as_str()));
        }
        let code = if status.is_client_error() {
            CrmErrorCode::Rejected
        } else {
            CrmErrorCode::Network
        };
        Err(CrmError::new(code, format!("relay returned status {status}")))
    }
}
