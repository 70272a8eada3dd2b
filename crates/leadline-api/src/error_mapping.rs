// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

pub const API_ERROR_SCHEMA_REF: &str = "#/components/schemas/ApiError";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
    pub schema_ref: &'static str,
}

#[must_use]
pub const fn api_error_status(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::InvalidJson | ApiErrorCode::ValidationFailed => 400,
        ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::UnsupportedProduct => 422,
        ApiErrorCode::RateLimited => 429,
        ApiErrorCode::UpstreamUnavailable => 502,
        ApiErrorCode::NotReady => 503,
        ApiErrorCode::Timeout => 504,
        ApiErrorCode::Internal => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    ApiErrorMapping {
        status_code: api_error_status(error.code),
        schema_ref: API_ERROR_SCHEMA_REF,
    }
}
