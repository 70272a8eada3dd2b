// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::{extract_request_id, REQUEST_ID_HEADER};
use crate::AppState;
use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::Instrument;

pub(crate) async fn request_tracing_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let request_id = extract_request_id(request.headers(), &state);
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id.0,
        method = %method,
        route = %route,
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    state
        .metrics
        .observe_request(&route, &method, response.status().as_u16(), started.elapsed())
        .await;
    response
}
