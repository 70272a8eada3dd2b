// SPDX-License-Identifier: Apache-2.0

use crate::error::{CrmError, CrmErrorCode};
use crate::retry::RetryPolicy;
use leadline_core::redact::mask_secret;
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// Credential that never shows up in `Debug` output or logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret({})", mask_secret(&self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmMode {
    /// CRM failures are returned to the caller.
    Live,
    /// The CRM is never called.
    Mock,
    /// CRM outages and auth failures degrade to a mock receipt.
    Auto,
}

impl CrmMode {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "live" => Some(Self::Live),
            "mock" => Some(Self::Mock),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
            Self::Auto => "auto",
        }
    }
}

pub fn validate_http_url(name: &str, raw: &str) -> Result<(), CrmError> {
    let parsed = reqwest::Url::parse(raw)
        .map_err(|e| CrmError::new(CrmErrorCode::Config, format!("{name} is not a url: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CrmError::new(
            CrmErrorCode::Config,
            format!("{name} must use http or https"),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(CrmError::new(
            CrmErrorCode::Config,
            format!("{name} is missing a host"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub mode: CrmMode,
    pub login_url: String,
    pub client_id: String,
    pub client_secret: Secret,
    pub username: String,
    pub password: Secret,
    pub security_token: Secret,
    pub api_version: String,
    pub timeout: Duration,
    pub token_ttl: Duration,
    pub retry: RetryPolicy,
    pub breaker_failure_threshold: u32,
    pub breaker_open_duration: Duration,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            mode: CrmMode::Auto,
            login_url: "https://login.salesforce.com".to_string(),
            client_id: String::new(),
            client_secret: Secret::default(),
            username: String::new(),
            password: Secret::default(),
            security_token: Secret::default(),
            api_version: "v59.0".to_string(),
            timeout: Duration::from_secs(3),
            token_ttl: Duration::from_secs(3600),
            retry: RetryPolicy::default(),
            breaker_failure_threshold: 5,
            breaker_open_duration: Duration::from_secs(30),
        }
    }
}

impl CrmConfig {
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty()
            && !self.client_secret.is_empty()
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
    }

    /// The mode the dispatcher actually runs in: without credentials there
    /// is nothing to call, so `auto` degrades to `mock`.
    #[must_use]
    pub fn effective_mode(&self) -> CrmMode {
        match self.mode {
            CrmMode::Auto if !self.has_credentials() => CrmMode::Mock,
            mode => mode,
        }
    }

    /// Longest one submission can spend in the CRM client: every attempt
    /// timing out plus the backoff between them.
    #[must_use]
    pub fn call_budget(&self) -> Duration {
        self.retry.worst_case(self.timeout)
    }

    pub fn validate(&self) -> Result<(), CrmError> {
        if self.mode == CrmMode::Live && !self.has_credentials() {
            return Err(CrmError::new(
                CrmErrorCode::Config,
                "live crm mode requires client id, client secret, username and password",
            ));
        }
        if self.effective_mode() != CrmMode::Mock {
            validate_http_url("crm login url", &self.login_url)?;
        }
        if self.timeout.is_zero() || self.token_ttl.is_zero() {
            return Err(CrmError::new(
                CrmErrorCode::Config,
                "crm timeout and token ttl must be > 0",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(CrmError::new(
                CrmErrorCode::Config,
                "crm retry attempts must be > 0",
            ));
        }
        if self.breaker_failure_threshold == 0 {
            return Err(CrmError::new(
                CrmErrorCode::Config,
                "crm breaker failure threshold must be > 0",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn redacted_summary(&self) -> Value {
        json!({
            "mode": self.mode.as_str(),
            "effective_mode": self.effective_mode().as_str(),
            "login_url": self.login_url,
            "client_id": mask_secret(&self.client_id),
            "client_secret": mask_secret(self.client_secret.expose()),
            "username": self.username,
            "password": mask_secret(self.password.expose()),
            "security_token": mask_secret(self.security_token.expose()),
            "api_version": self.api_version,
            "timeout_ms": self.timeout.as_millis() as u64,
            "token_ttl_ms": self.token_ttl.as_millis() as u64,
            "retry_attempts": self.retry.max_attempts,
            "retry_base_ms": self.retry.base_backoff_ms,
            "breaker_failure_threshold": self.breaker_failure_threshold,
            "breaker_open_ms": self.breaker_open_duration.as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: Option<String>,
    pub secret: Option<Secret>,
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            secret: None,
            timeout: Duration::from_secs(3),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), CrmError> {
        match (&self.url, &self.secret) {
            (Some(url), _) => validate_http_url("relay url", url)?,
            (None, Some(_)) => {
                return Err(CrmError::new(
                    CrmErrorCode::Config,
                    "relay secret is set but relay url is not",
                ))
            }
            (None, None) => {}
        }
        if self.timeout.is_zero() {
            return Err(CrmError::new(
                CrmErrorCode::Config,
                "relay timeout must be > 0",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn redacted_summary(&self) -> Value {
        json!({
            "url": self.url,
            "secret": self.secret.as_ref().map(|s| mask_secret(s.expose())),
            "timeout_ms": self.timeout.as_millis() as u64,
        })
    }
}
