// SPDX-License-Identifier: Apache-2.0

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use leadline_api::{api_error_status, ApiError};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status = StatusCode::from_u16(api_error_status(err.code))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let retry_after = err.retry_after_secs();
    let mut resp = (status, Json(json!({"error": err}))).into_response();
    if let Some(secs) = retry_after {
        if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
            resp.headers_mut().insert("retry-after", v);
        }
    }
    resp
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
