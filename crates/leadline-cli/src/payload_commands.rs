// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, OutputMode};
use leadline_api::{
    parse_contact_payload, parse_lead_payload, sample_contact_payload, sample_lead_payload,
    ApiError,
};
use leadline_crm::CrmLeadRecord;
use leadline_model::{
    validate_contact_message, validate_lead, ProductLine, Submission, ValidatedContact,
    ValidatedLead, ValidationContext, ValidationErrors,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

enum Checked {
    Quote(ValidatedLead),
    Contact(ValidatedContact),
}

fn read_payload(file: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(file).map_err(|e| {
        let mut err = CliError::usage(&format!("cannot read {}: {e}", file.display()));
        err.machine = err.machine.with_detail("path", &file.display().to_string());
        err
    })
}

fn rejected(err: &ApiError) -> CliError {
    CliError::validation(err.code.as_str(), &err.message)
}

fn invalid_fields(errors: &ValidationErrors) -> CliError {
    let message = format!("validation failed: {errors}");
    let mut err = CliError::validation("validation_failed", &message);
    for field_error in errors.iter() {
        let entry = err.machine.details.entry(field_error.field.clone()).or_default();
        if !entry.is_empty() {
            entry.push_str("; ");
        }
        entry.push_str(&field_error.reason);
    }
    err
}

fn check_file(
    file: &Path,
    product: Option<ProductLine>,
    contact: bool,
) -> Result<Checked, CliError> {
    let bytes = read_payload(file)?;
    if contact {
        let draft = parse_contact_payload(&bytes).map_err(|e| rejected(&e))?;
        let validated = validate_contact_message(&draft).map_err(|e| invalid_fields(&e))?;
        return Ok(Checked::Contact(validated));
    }
    let draft =
        parse_lead_payload(&bytes, product.map(ProductLine::as_str)).map_err(|e| rejected(&e))?;
    let validated =
        validate_lead(&draft, &ValidationContext::now()).map_err(|e| invalid_fields(&e))?;
    Ok(Checked::Quote(validated))
}

pub(crate) fn run_validate(
    file: &Path,
    product: Option<ProductLine>,
    contact: bool,
    out: OutputMode,
) -> Result<(), CliError> {
    let report = match check_file(file, product, contact)? {
        Checked::Quote(lead) => json!({
            "valid": true,
            "kind": "quote",
            "product": lead.product,
            "summary": lead.details.summary(),
            "lead": lead,
        }),
        Checked::Contact(message) => json!({
            "valid": true,
            "kind": "contact",
            "message": message,
        }),
    };
    out.emit(&report)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

pub(crate) fn run_crm_record(
    file: &Path,
    product: Option<ProductLine>,
    contact: bool,
    out: OutputMode,
) -> Result<(), CliError> {
    let received_at_ms = now_ms();
    let submission = match check_file(file, product, contact)? {
        Checked::Quote(lead) => Submission::Quote(
            lead.into_lead(received_at_ms)
                .map_err(|e| CliError::internal(e.to_string()))?,
        ),
        Checked::Contact(message) => Submission::Contact(
            message
                .into_message(received_at_ms)
                .map_err(|e| CliError::internal(e.to_string()))?,
        ),
    };
    let record = CrmLeadRecord::from_submission(&submission);
    let value = serde_json::to_value(&record).map_err(|e| CliError::internal(e.to_string()))?;
    out.emit(&json!({
        "submission_id": submission.id().as_str(),
        "record": value,
    }))
}

pub(crate) fn run_sample(
    product: Option<ProductLine>,
    contact: bool,
    out: OutputMode,
) -> Result<(), CliError> {
    match (product, contact) {
        (Some(product), _) => out.emit(&sample_lead_payload(product)),
        (None, true) => out.emit(&sample_contact_payload()),
        (None, false) => Err(CliError::usage("sample needs --product <line> or --contact")),
    }
}
