// SPDX-License-Identifier: Apache-2.0

use crate::auth::{AccessToken, CrmAuthenticator};
use crate::config::{validate_http_url, CrmConfig};
use crate::error::{CrmError, CrmErrorCode};
use crate::record::CrmLeadRecord;
use crate::retry::{BackoffPolicy, RetryPolicy};
use crate::sink::{LeadSink, SinkReceipt};
use async_trait::async_trait;
use leadline_core::redact::mask_email;
use leadline_model::Submission;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

const ERROR_BODY_MAX_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<Value>,
}

/// Posts lead records to the CRM data API.
pub struct HttpCrmSink {
    client: reqwest::Client,
    auth: CrmAuthenticator,
    api_version: String,
    retry: RetryPolicy,
}

impl HttpCrmSink {
    pub fn new(cfg: CrmConfig) -> Result<Self, CrmError> {
        validate_http_url("crm login url", &cfg.login_url)?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CrmError::new(CrmErrorCode::Config, format!("crm client: {e}")))?;
        Ok(Self {
            client,
            api_version: cfg.api_version.clone(),
            retry: cfg.retry.clone(),
            auth: CrmAuthenticator::new(cfg),
        })
    }

    fn lead_url(&self, token: &AccessToken) -> String {
        format!(
            "{}/services/data/{}/sobjects/Lead",
            token.instance_url, self.api_version
        )
    }

    async fn post_record(
        &self,
        token: &AccessToken,
        record: &CrmLeadRecord,
    ) -> Result<SinkReceipt, CrmError> {
        let url = self.lead_url(token);
        validate_http_url("crm instance url", &url)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
            .map_err(|e| CrmError::new(CrmErrorCode::Auth, format!("invalid access token: {e}")))?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let req = self
                .client
                .post(&url)
                .header(AUTHORIZATION, bearer.clone())
                .json(record);
            let last_error = match req.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: CreateResponse = resp.json().await.map_err(|e| {
                        CrmError::new(
                            CrmErrorCode::Internal,
                            format!("crm create response unreadable: {e}"),
                        )
                    })?;
                    return match body.id {
                        Some(id) if body.success => Ok(SinkReceipt::live(id)),
                        _ => Err(CrmError::new(
                            CrmErrorCode::Rejected,
                            format!("crm refused record: {}", Value::Array(body.errors)),
                        )),
                    };
                }
                Ok(resp) if resp.status().as_u16() == 401 => {
                    return Err(CrmError::new(
                        CrmErrorCode::Auth,
                        "crm rejected access token",
                    ));
                }
                Ok(resp) if resp.status().is_client_error() => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    let snippet: String = text.chars().take(ERROR_BODY_MAX_CHARS).collect();
                    return Err(CrmError::new(
                        CrmErrorCode::Rejected,
                        format!("crm returned status {status}: {snippet}"),
                    ));
                }
                Ok(resp) => CrmError::new(
                    CrmErrorCode::Network,
                    format!("crm returned status {}", resp.status()),
                ),
                Err(e) => CrmError::from_transport("crm request failed", &e),
            };
            if attempt >= self.retry.max_attempts {
                return Err(last_error);
            }
            warn!(attempt, error = %last_error, "crm create failed; retrying");
            tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
        }
    }
}

#[async_trait]
impl LeadSink for HttpCrmSink {
    fn sink_tag(&self) -> &'static str {
        "crm_http"
    }

    #[instrument(name = "crm_submit", skip_all, fields(submission_id = %submission.id()))]
    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, CrmError> {
        let record = CrmLeadRecord::from_submission(submission);
        let mut reauthenticated = false;
        loop {
            let token = self.auth.token(&self.client).await?;
            match self.post_record(&token, &record).await {
                Err(e) if e.code == CrmErrorCode::Auth && !reauthenticated => {
                    info!("crm token expired; logging in again");
                    self.auth.invalidate().await;
                    reauthenticated = true;
                }
                Ok(receipt) => {
                    info!(
                        record_id = %receipt.record_id,
                        email = %mask_email(submission.email().as_str()),
                        "crm record created"
                    );
                    return Ok(receipt);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
