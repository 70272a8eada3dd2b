// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestId;
use crate::http::response::api_error_response;
use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use leadline_api::{openapi_v1_spec, ApiError, ProductCatalogDto, VersionDto, API_VERSION};
use serde_json::json;
use std::sync::atomic::Ordering;

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub(crate) async fn readyz_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    if state.ready.load(Ordering::Relaxed) && state.accepting_requests.load(Ordering::Relaxed) {
        return Json(json!({"status": "ready"})).into_response();
    }
    api_error_response(ApiError::not_ready().with_request_id(request_id.0))
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = state.metrics.render_prometheus().await;
    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    resp
}

pub(crate) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(VersionDto {
        service: crate::CRATE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
        crm_mode: state.dispatcher.mode().as_str().to_string(),
    })
}

pub(crate) async fn openapi_handler() -> impl IntoResponse {
    Json(openapi_v1_spec())
}

pub(crate) async fn products_handler() -> impl IntoResponse {
    Json(ProductCatalogDto::build())
}

pub(crate) async fn not_found_handler(request_id: Option<Extension<RequestId>>) -> Response {
    let mut err = ApiError::not_found("route");
    if let Some(Extension(id)) = request_id {
        err = err.with_request_id(id.0);
    }
    api_error_response(err)
}
