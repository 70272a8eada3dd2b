// SPDX-License-Identifier: Apache-2.0

use crate::dto::{ContactMessageDto, LeadSubmissionDto, StepValidationRequestDto};
use crate::errors::ApiError;
use leadline_model::{ContactMessageDraft, FormStep, LeadDraft, ProductLine};
use serde::de::DeserializeOwned;

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::invalid_json("request body is empty"));
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::invalid_json(&e.to_string()))
}

/// Resolves the product line from the URL path and the body. A path product
/// wins, but a body that names a different one is rejected.
fn resolve_product(
    body: Option<&str>,
    product_override: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let from_body = match body.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            Some(ProductLine::parse(raw).ok_or_else(|| ApiError::unsupported_product(raw))?)
        }
        None => None,
    };
    match product_override {
        Some(raw) => {
            let path = ProductLine::parse(raw).ok_or_else(|| ApiError::unsupported_product(raw))?;
            if from_body.is_some_and(|b| b != path) {
                return Err(ApiError::field_error(
                    "product",
                    &format!("does not match the `{path}` quote form"),
                ));
            }
            Ok(Some(path.as_str().to_string()))
        }
        None => Ok(from_body.map(|p| p.as_str().to_string())),
    }
}

pub fn parse_lead_payload(
    bytes: &[u8],
    product_override: Option<&str>,
) -> Result<LeadDraft, ApiError> {
    let dto: LeadSubmissionDto = decode(bytes)?;
    let product = resolve_product(dto.product.as_deref(), product_override)?;
    let mut draft = LeadDraft::from(dto);
    draft.product = product;
    Ok(draft)
}

pub fn parse_contact_payload(bytes: &[u8]) -> Result<ContactMessageDraft, ApiError> {
    let dto: ContactMessageDto = decode(bytes)?;
    Ok(dto.into())
}

pub fn parse_step_payload(bytes: &[u8]) -> Result<(FormStep, LeadDraft), ApiError> {
    let dto: StepValidationRequestDto = decode(bytes)?;
    let step = FormStep::parse(&dto.step).ok_or_else(|| {
        ApiError::field_error("step", "must be one of: contact, details, consent")
    })?;
    let product = resolve_product(dto.lead.product.as_deref(), None)?;
    let mut draft = LeadDraft::from(dto.lead);
    draft.product = product;
    Ok((step, draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiErrorCode;

    #[test]
    fn numbers_and_booleans_become_text() {
        let body = br#"{
            "product": "auto",
            "contact": {"zip_code": 94107, "phone": "4155550134"},
            "details": {"vehicle_year": 2019, "drivers": "2"},
            "consent": {"tcpa": true, "privacy_policy": "on"}
        }"#;
        let draft = parse_lead_payload(body, None).expect("draft");
        assert_eq!(draft.contact.zip_code.as_deref(), Some("94107"));
        assert_eq!(draft.details.vehicle_year.as_deref(), Some("2019"));
        assert_eq!(draft.consent.tcpa.as_deref(), Some("true"));
        assert_eq!(draft.consent.privacy_policy.as_deref(), Some("on"));
    }

    #[test]
    fn unknown_fields_are_invalid_json() {
        let err = parse_lead_payload(br#"{"contact": {"fax": "1"}}"#, None).expect_err("unknown");
        assert_eq!(err.code, ApiErrorCode::InvalidJson);
        let err = parse_lead_payload(b"   ", None).expect_err("empty");
        assert_eq!(err.code, ApiErrorCode::InvalidJson);
    }

    #[test]
    fn path_product_overrides_and_must_agree() {
        let draft = parse_lead_payload(br#"{}"#, Some("home-insurance")).expect("draft");
        assert_eq!(draft.product.as_deref(), Some("home"));
        let err =
            parse_lead_payload(br#"{"product": "auto"}"#, Some("home")).expect_err("mismatch");
        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
        let err = parse_lead_payload(br#"{}"#, Some("boat")).expect_err("unsupported");
        assert_eq!(err.code, ApiErrorCode::UnsupportedProduct);
    }

    #[test]
    fn honeypot_maps_from_website() {
        let draft = parse_contact_payload(br#"{"website": "http://spam.example"}"#).expect("draft");
        assert!(draft.is_honeypot_tripped());
    }

    #[test]
    fn step_must_be_known() {
        let (step, _) = parse_step_payload(br#"{"step": "Details", "lead": {}}"#).expect("step");
        assert_eq!(step, FormStep::Details);
        let err = parse_step_payload(br#"{"step": "payment"}"#).expect_err("step");
        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
    }
}
