// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::{client_address, RequestId};
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::info;

const ALLOWED_METHODS: &str = "POST,GET,OPTIONS";
const ALLOWED_HEADERS: &str = "content-type,x-api-key,x-request-id";

fn allowed_origin(state: &AppState, headers: &HeaderMap) -> Option<HeaderValue> {
    let origin = headers.get("origin")?.to_str().ok()?.trim();
    if origin.is_empty() || origin.len() > 256 {
        return None;
    }
    if !state.api.cors_allowed_origins.iter().any(|o| o == origin) {
        return None;
    }
    HeaderValue::from_str(origin).ok()
}

/// Browser forms are served from a separate marketing site, so only the
/// configured origins are echoed back.
pub(crate) async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = allowed_origin(&state, req.headers());
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(value) = origin {
            let headers = resp.headers_mut();
            headers.insert("access-control-allow-origin", value);
            headers.insert(
                "access-control-allow-methods",
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                "access-control-allow-headers",
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            headers.insert("access-control-max-age", HeaderValue::from_static("600"));
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(value) = origin {
        resp.headers_mut().insert("access-control-allow-origin", value);
        resp.headers_mut()
            .insert("vary", HeaderValue::from_static("origin"));
    }
    resp
}

pub(crate) async fn audit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.api.enable_audit_log {
        return next.run(req).await;
    }
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let client_ip = client_address(&req, &state);
    let resp = next.run(req).await;
    info!(
        target: "leadline_audit",
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        request_id = %request_id,
        client_ip = %client_ip,
        latency_ms = started.elapsed().as_millis() as u64,
        "audit"
    );
    resp
}
