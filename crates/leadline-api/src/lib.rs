#![forbid(unsafe_code)]

pub mod dto;
mod error_mapping;
mod errors;
pub mod openapi;
mod payload;
pub mod responses;
mod samples;

pub use error_mapping::{api_error_status, map_error, ApiErrorMapping, API_ERROR_SCHEMA_REF};
pub use errors::{ApiError, ApiErrorCode, UNKNOWN_REQUEST_ID};
pub use openapi::openapi_v1_spec;
pub use payload::{parse_contact_payload, parse_lead_payload, parse_step_payload};
pub use responses::{
    BillingPlaceholderDto, CrmReceiptDto, LeadAcceptedDto, PortalSummaryDto, ProductCatalogDto,
    ReceiptModeDto, RelayReceiptDto, StepValidationDto, VersionDto, ACCEPTED_STATUS,
};
pub use samples::{sample_contact_payload, sample_lead_payload};

pub const CRATE_NAME: &str = "leadline-api";
pub const API_VERSION: &str = "v1";
