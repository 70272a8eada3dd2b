// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::{client_address, RequestId};
use crate::http::response::api_error_response;
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use leadline_api::ApiError;
use std::sync::atomic::Ordering;
use tracing::warn;

/// Per-client token bucket in front of the submission routes.
pub(crate) async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_address(&req, &state);
    let Err(wait) = state
        .limiter
        .check(&client, &state.api.rate_limit_per_ip)
        .await
    else {
        return next.run(req).await;
    };
    state.metrics.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    let retry_after = wait
        .as_secs()
        .saturating_add(u64::from(wait.subsec_nanos() > 0));
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    warn!(
        request_id = %request_id,
        client_ip = %client,
        retry_after_secs = retry_after.max(1),
        "submission rate limited"
    );
    let mut err = ApiError::rate_limited(retry_after.max(1));
    if !request_id.is_empty() {
        err = err.with_request_id(request_id);
    }
    api_error_response(err)
}
