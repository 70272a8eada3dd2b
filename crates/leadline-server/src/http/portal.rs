// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestId;
use crate::http::response::api_error_response;
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use leadline_api::{ApiError, BillingPlaceholderDto, PortalSummaryDto};
use leadline_model::ProductLine;
use std::collections::BTreeMap;
use tracing::warn;

pub(crate) const API_KEY_HEADER: &str = "x-api-key";

fn keys_match(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(presented) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    state
        .api
        .portal_api_keys
        .iter()
        .any(|k| keys_match(k, presented))
}

pub(crate) async fn portal_summary_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    if state.api.portal_api_keys.is_empty() {
        return api_error_response(ApiError::not_found("portal").with_request_id(request_id.0));
    }
    if !authorized(&state, &headers) {
        warn!(request_id = request_id.0.as_str(), "portal request rejected");
        return api_error_response(ApiError::unauthorized().with_request_id(request_id.0));
    }

    let mut leads_by_product: BTreeMap<String, u64> = ProductLine::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), 0))
        .collect();
    let mut contact_messages = 0;
    let mut mock_receipts = 0;
    for ((label, mode), n) in state.metrics.accepted_snapshot().await {
        if mode == "mock" {
            mock_receipts += n;
        }
        if label == "contact" {
            contact_messages += n;
        } else {
            *leads_by_product.entry(label).or_insert(0) += n;
        }
    }
    Json(PortalSummaryDto {
        leads_by_product,
        contact_messages,
        mock_receipts,
        crm_mode: state.dispatcher.mode().as_str().to_string(),
        billing: BillingPlaceholderDto::default(),
    })
    .into_response()
}
