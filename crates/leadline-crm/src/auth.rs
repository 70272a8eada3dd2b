// SPDX-License-Identifier: Apache-2.0

use crate::config::CrmConfig;
use crate::error::{CrmError, CrmErrorCode};
use serde::Deserialize;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

pub const TOKEN_PATH: &str = "/services/oauth2/token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub instance_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

struct CachedToken {
    token: AccessToken,
    fetched_at: Instant,
}

/// OAuth2 username-password flow against the CRM login host, with the
/// token cached for `token_ttl`.
pub struct CrmAuthenticator {
    cfg: CrmConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl CrmAuthenticator {
    #[must_use]
    pub fn new(cfg: CrmConfig) -> Self {
        Self {
            cfg,
            cached: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!("{}{TOKEN_PATH}", self.cfg.login_url.trim_end_matches('/'))
    }

    pub async fn token(&self, client: &reqwest::Client) -> Result<AccessToken, CrmError> {
        let mut lock = self.cached.lock().await;
        if let Some(cached) = lock.as_ref() {
            if cached.fetched_at.elapsed() < self.cfg.token_ttl {
                return Ok(cached.token.clone());
            }
        }
        let token = self.request_token(client).await?;
        *lock = Some(CachedToken {
            token: token.clone(),
            fetched_at: Instant::now(),
        });
        Ok(token)
    }

    /// Drops the cached token so the next call logs in again.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    #[instrument(name = "crm_oauth_token", skip_all)]
    async fn request_token(&self, client: &reqwest::Client) -> Result<AccessToken, CrmError> {
        let password = format!(
            "{}{}",
            self.cfg.password.expose(),
            self.cfg.security_token.expose()
        );
        let form = [
            ("grant_type", "password"),
            ("client_id", self.cfg.client_id.as_str()),
            ("client_secret", self.cfg.client_secret.expose()),
            ("username", self.cfg.username.as_str()),
            ("password", password.as_str()),
        ];
        let resp = client
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| CrmError::from_transport("crm login request failed", &e))?;
        let status = resp.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "crm login host unavailable");
            return Err(CrmError::new(
                CrmErrorCode::Network,
                format!("crm login returned status {status}"),
            ));
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "crm login rejected credentials");
            return Err(CrmError::new(
                CrmErrorCode::Auth,
                format!("crm login returned status {status}"),
            ));
        }
        let body: TokenResponse = resp.json().await.map_err(|e| {
            CrmError::new(CrmErrorCode::Auth, format!("crm login response unreadable: {e}"))
        })?;
        if body.access_token.is_empty() || body.instance_url.is_empty() {
            return Err(CrmError::new(
                CrmErrorCode::Auth,
                "crm login response missing token or instance url",
            ));
        }
        info!(instance_url = %body.instance_url, "crm login succeeded");
        Ok(AccessToken {
            access_token: body.access_token,
            instance_url: body.instance_url.trim_end_matches('/').to_string(),
        })
    }
}
