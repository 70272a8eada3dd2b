// SPDX-License-Identifier: Apache-2.0

use leadline_model::ValidationErrors;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidJson,
    ValidationFailed,
    UnsupportedProduct,
    PayloadTooLarge,
    RateLimited,
    Unauthorized,
    NotFound,
    NotReady,
    UpstreamUnavailable,
    Timeout,
    Internal,
}

impl ApiErrorCode {
    pub const ALL: [ApiErrorCode; 11] = [
        ApiErrorCode::InvalidJson,
        ApiErrorCode::ValidationFailed,
        ApiErrorCode::UnsupportedProduct,
        ApiErrorCode::PayloadTooLarge,
        ApiErrorCode::RateLimited,
        ApiErrorCode::Unauthorized,
        ApiErrorCode::NotFound,
        ApiErrorCode::NotReady,
        ApiErrorCode::UpstreamUnavailable,
        ApiErrorCode::Timeout,
        ApiErrorCode::Internal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidJson => "invalid_json",
            Self::ValidationFailed => "validation_failed",
            Self::UnsupportedProduct => "unsupported_product",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::NotReady => "not_ready",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }
}

pub const UNKNOWN_REQUEST_ID: &str = "req-unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: UNKNOWN_REQUEST_ID.to_string(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_json(reason: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidJson,
            "request body is not a valid submission",
            json!({"reason": reason}),
        )
    }

    #[must_use]
    pub fn validation_failed(errors: &ValidationErrors) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors": errors}),
        )
    }

    #[must_use]
    pub fn field_error(field: &str, reason: &str) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors": [{"field": field, "reason": reason}]}),
        )
    }

    #[must_use]
    pub fn unsupported_product(raw: &str) -> Self {
        Self::new(
            ApiErrorCode::UnsupportedProduct,
            format!("unsupported product line: {raw}"),
            json!({"product": raw, "supported": leadline_model::ProductLine::ALL}),
        )
    }

    #[must_use]
    pub fn payload_too_large(limit_bytes: usize) -> Self {
        Self::new(
            ApiErrorCode::PayloadTooLarge,
            "request body too large",
            json!({"limit_bytes": limit_bytes}),
        )
    }

    #[must_use]
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            ApiErrorCode::RateLimited,
            "too many submissions, try again later",
            json!({"retry_after_secs": retry_after_secs}),
        )
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            ApiErrorCode::Unauthorized,
            "missing or invalid api key",
            json!({}),
        )
    }

    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{what} not found"),
            json!({}),
        )
    }

    #[must_use]
    pub fn not_ready() -> Self {
        Self::new(ApiErrorCode::NotReady, "service not ready", json!({}))
    }

    #[must_use]
    pub fn upstream_unavailable(reason: &str) -> Self {
        Self::new(
            ApiErrorCode::UpstreamUnavailable,
            "lead could not be delivered",
            json!({"reason": reason}),
        )
    }

    #[must_use]
    pub fn timeout(limit_ms: u64) -> Self {
        Self::new(
            ApiErrorCode::Timeout,
            "lead delivery timed out",
            json!({"timeout_ms": limit_ms}),
        )
    }

    #[must_use]
    pub fn internal(reason: &str) -> Self {
        Self::new(
            ApiErrorCode::Internal,
            "internal error",
            json!({"reason": reason}),
        )
    }

    /// Seconds advertised in `retry-after`, when the error carries one.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.details.get("retry_after_secs").and_then(Value::as_u64)
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiError>();
};
