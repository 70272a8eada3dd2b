// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestId;
use crate::http::response::{api_error_response, unix_millis};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use leadline_api::{
    parse_contact_payload, parse_lead_payload, parse_step_payload, ApiError, CrmReceiptDto,
    LeadAcceptedDto, ReceiptModeDto, RelayReceiptDto, StepValidationDto, ACCEPTED_STATUS,
};
use leadline_core::sha256_hex;
use leadline_crm::{CrmErrorCode, DispatchOutcome, SinkMode};
use leadline_model::{
    validate_contact_message, validate_lead, validate_step, ProductLine, Submission,
    SubmissionKind, ValidationContext, ValidationErrors, LEAD_ID_HEX_LEN,
};
use std::sync::atomic::Ordering;
use tracing::{info, warn};

const LEADS_ROUTE: &str = "/v1/leads";
const QUOTES_ROUTE: &str = "/v1/quotes/:product";
const CONTACT_ROUTE: &str = "/v1/contact";
const HONEYPOT_REASON: &str = "honeypot";

fn read_body(state: &AppState, body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(state.api.max_body_bytes)
        } else {
            ApiError::invalid_json(&rejection.body_text())
        }
    })
}

fn crm_receipt(outcome: &DispatchOutcome) -> CrmReceiptDto {
    CrmReceiptDto {
        mode: match outcome.crm.mode {
            SinkMode::Live => ReceiptModeDto::Live,
            SinkMode::Mock => ReceiptModeDto::Mock,
        },
        record_id: outcome.crm.record_id.clone(),
        fallback_reason: outcome.crm.fallback_reason.clone(),
    }
}

fn metric_label(product: Option<ProductLine>) -> &'static str {
    product.map_or("contact", ProductLine::as_str)
}

/// Bots that fill the hidden field get the same 201 a person would, with
/// nothing sent to the CRM.
fn honeypot_response(
    state: &AppState,
    kind: SubmissionKind,
    product: Option<ProductLine>,
    body: &[u8],
    request_id: &str,
) -> Response {
    state.metrics.honeypot_total.fetch_add(1, Ordering::Relaxed);
    let digest = sha256_hex(body);
    let prefix = match kind {
        SubmissionKind::Quote => "lead",
        SubmissionKind::Contact => "contact",
    };
    let hex: String = digest.chars().take(LEAD_ID_HEX_LEN).collect();
    let lead_id = format!("{prefix}-{hex}");
    info!(
        request_id,
        lead_id = lead_id.as_str(),
        kind = kind.as_str(),
        "honeypot tripped; submission dropped"
    );
    let dto = LeadAcceptedDto {
        crm: CrmReceiptDto {
            mode: ReceiptModeDto::Mock,
            record_id: format!("mock-{lead_id}"),
            fallback_reason: Some(HONEYPOT_REASON.to_string()),
        },
        lead_id,
        status: ACCEPTED_STATUS.to_string(),
        kind,
        product,
        received_at_ms: unix_millis(),
        relay: None,
    };
    (StatusCode::CREATED, Json(dto)).into_response()
}

async fn validation_failed(state: &AppState, route: &str, errors: &ValidationErrors) -> ApiError {
    state.metrics.observe_validation_failure(route).await;
    ApiError::validation_failed(errors)
}

async fn dispatch_and_respond(
    state: &AppState,
    submission: Submission,
    request_id: &str,
) -> Result<Response, ApiError> {
    let limit = state.api.request_timeout;
    let outcome = tokio::time::timeout(limit, state.dispatcher.dispatch(&submission))
        .await
        .map_err(|_| {
            warn!(request_id, submission_id = %submission.id(), "lead dispatch timed out");
            ApiError::timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
        })?
        .map_err(|err| {
            warn!(
                request_id,
                submission_id = %submission.id(),
                code = err.code.as_str(),
                error = %err,
                "lead dispatch failed"
            );
            match err.code {
                CrmErrorCode::Timeout => {
                    ApiError::timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
                }
                _ => ApiError::upstream_unavailable(&err.to_string()),
            }
        })?;

    let product = submission.product();
    state
        .metrics
        .observe_accepted(metric_label(product), outcome.crm.mode.as_str())
        .await;
    if let Some(cause) = outcome.fallback {
        state.metrics.observe_fallback(cause.as_str()).await;
    }
    let relay = outcome.relay.as_ref().map(|r| {
        if !r.delivered {
            state.metrics.relay_failures_total.fetch_add(1, Ordering::Relaxed);
        }
        RelayReceiptDto {
            delivered: r.delivered,
            error: r.error.clone(),
        }
    });
    let dto = LeadAcceptedDto {
        lead_id: submission.id().to_string(),
        status: ACCEPTED_STATUS.to_string(),
        kind: submission.kind(),
        product,
        received_at_ms: submission.received_at_ms(),
        crm: crm_receipt(&outcome),
        relay,
    };
    Ok((StatusCode::CREATED, Json(dto)).into_response())
}

async fn accept_quote(
    state: &AppState,
    route: &str,
    product_override: Option<&str>,
    body: Result<Bytes, BytesRejection>,
    request_id: &str,
) -> Result<Response, ApiError> {
    let bytes = read_body(state, body)?;
    let draft = parse_lead_payload(&bytes, product_override)?;
    if draft.is_honeypot_tripped() {
        let product = draft.product.as_deref().and_then(ProductLine::parse);
        return Ok(honeypot_response(
            state,
            SubmissionKind::Quote,
            product,
            &bytes,
            request_id,
        ));
    }
    let validated = match validate_lead(&draft, &ValidationContext::now()) {
        Ok(v) => v,
        Err(errors) => return Err(validation_failed(state, route, &errors).await),
    };
    let lead = validated
        .into_lead(unix_millis())
        .map_err(|e| ApiError::internal(&e.to_string()))?;
    dispatch_and_respond(state, Submission::Quote(lead), request_id).await
}

pub(crate) async fn submit_lead_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match accept_quote(&state, LEADS_ROUTE, None, body, &request_id.0).await {
        Ok(resp) => resp,
        Err(err) => api_error_response(err.with_request_id(request_id.0)),
    }
}

pub(crate) async fn submit_quote_handler(
    State(state): State<AppState>,
    Path(product): Path<String>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match accept_quote(&state, QUOTES_ROUTE, Some(&product), body, &request_id.0).await {
        Ok(resp) => resp,
        Err(err) => api_error_response(err.with_request_id(request_id.0)),
    }
}

async fn accept_contact(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
    request_id: &str,
) -> Result<Response, ApiError> {
    let bytes = read_body(state, body)?;
    let draft = parse_contact_payload(&bytes)?;
    if draft.is_honeypot_tripped() {
        return Ok(honeypot_response(
            state,
            SubmissionKind::Contact,
            None,
            &bytes,
            request_id,
        ));
    }
    let validated = match validate_contact_message(&draft) {
        Ok(v) => v,
        Err(errors) => return Err(validation_failed(state, CONTACT_ROUTE, &errors).await),
    };
    let message = validated
        .into_message(unix_millis())
        .map_err(|e| ApiError::internal(&e.to_string()))?;
    dispatch_and_respond(state, Submission::Contact(message), request_id).await
}

pub(crate) async fn submit_contact_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match accept_contact(&state, body, &request_id.0).await {
        Ok(resp) => resp,
        Err(err) => api_error_response(err.with_request_id(request_id.0)),
    }
}

/// Per-step feedback for the multi-step form. Field problems are a normal
/// answer here, so they come back as 200 with `valid: false`.
pub(crate) async fn validate_step_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let parsed = read_body(&state, body).and_then(|bytes| parse_step_payload(&bytes));
    let (step, draft) = match parsed {
        Ok(v) => v,
        Err(err) => return api_error_response(err.with_request_id(request_id.0)),
    };
    let result = validate_step(&draft, step, &ValidationContext::now());
    Json(StepValidationDto::from_result(step, result)).into_response()
}
