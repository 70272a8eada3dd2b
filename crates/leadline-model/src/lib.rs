#![forbid(unsafe_code)]
//! Lead domain model: product lines, contact and detail types, multi-step
//! form metadata and the validation that turns raw form input into a `Lead`.

mod contact;
mod details;
mod form;
mod lead;
mod product;
mod validation;

pub use contact::{
    ContactInfo, EmailAddress, PersonName, PhoneNumber, UsState, ValidationError, ZipCode,
    EMAIL_MAX_LEN, NAME_MAX_LEN, US_STATE_CODES,
};
pub use details::{
    AutoDetails, BenefitPeriod, CoverageLevel, DisabilityDetails, HealthCoverageType,
    HealthDetails, HomeDetails, LifeDetails, LifeTerm, Occupancy, ProductDetails, PropertyType,
    WaitingPeriod,
};
pub use form::{detail_fields, form_fields, FieldKind, FieldSpec, FormStep};
pub use lead::{
    Attribution, Consent, ContactMessage, Lead, LeadId, Submission, SubmissionKind,
    LEAD_ID_HEX_LEN,
};
pub use product::ProductLine;
pub use validation::{
    applicant_age, parse_flag, parse_whole_number, validate_contact_message, validate_lead,
    validate_step, AttributionDraft, ConsentDraft, ContactDraft, ContactMessageDraft,
    DetailsDraft, FieldError, LeadDraft, ValidatedContact, ValidatedLead, ValidationContext,
    ValidationErrors, ATTRIBUTION_MAX_LEN, MESSAGE_MAX_LEN, NOTES_MAX_LEN, SUBJECT_MAX_LEN,
};

pub const CRATE_NAME: &str = "leadline-model";
