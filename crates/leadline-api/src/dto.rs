// SPDX-License-Identifier: Apache-2.0

use leadline_model::{
    AttributionDraft, ConsentDraft, ContactDraft, ContactMessageDraft, DetailsDraft, LeadDraft,
};
use serde::{Deserialize, Serialize};

/// A form value as browsers and integrations actually send it: form
/// encoders turn numbers and checkboxes into strings, JSON clients do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarDto {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ScalarDto {
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

fn text(value: Option<ScalarDto>) -> Option<String> {
    value.map(ScalarDto::into_text)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactDto {
    #[serde(default)]
    pub first_name: Option<ScalarDto>,
    #[serde(default)]
    pub last_name: Option<ScalarDto>,
    #[serde(default)]
    pub email: Option<ScalarDto>,
    #[serde(default)]
    pub phone: Option<ScalarDto>,
    #[serde(default)]
    pub zip_code: Option<ScalarDto>,
    #[serde(default)]
    pub state: Option<ScalarDto>,
    #[serde(default)]
    pub date_of_birth: Option<ScalarDto>,
}

impl From<ContactDto> for ContactDraft {
    fn from(dto: ContactDto) -> Self {
        Self {
            first_name: text(dto.first_name),
            last_name: text(dto.last_name),
            email: text(dto.email),
            phone: text(dto.phone),
            zip_code: text(dto.zip_code),
            state: text(dto.state),
            date_of_birth: text(dto.date_of_birth),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailsDto {
    #[serde(default)]
    pub vehicle_year: Option<ScalarDto>,
    #[serde(default)]
    pub vehicle_make: Option<ScalarDto>,
    #[serde(default)]
    pub vehicle_model: Option<ScalarDto>,
    #[serde(default)]
    pub drivers: Option<ScalarDto>,
    #[serde(default)]
    pub current_insurer: Option<ScalarDto>,
    #[serde(default)]
    pub coverage_level: Option<ScalarDto>,
    #[serde(default)]
    pub property_type: Option<ScalarDto>,
    #[serde(default)]
    pub year_built: Option<ScalarDto>,
    #[serde(default)]
    pub square_feet: Option<ScalarDto>,
    #[serde(default)]
    pub estimated_value: Option<ScalarDto>,
    #[serde(default)]
    pub occupancy: Option<ScalarDto>,
    #[serde(default)]
    pub coverage_amount: Option<ScalarDto>,
    #[serde(default)]
    pub term: Option<ScalarDto>,
    #[serde(default)]
    pub tobacco_use: Option<ScalarDto>,
    #[serde(default)]
    pub household_size: Option<ScalarDto>,
    #[serde(default)]
    pub coverage_type: Option<ScalarDto>,
    #[serde(default)]
    pub annual_income: Option<ScalarDto>,
    #[serde(default)]
    pub pre_existing_conditions: Option<ScalarDto>,
    #[serde(default)]
    pub occupation: Option<ScalarDto>,
    #[serde(default)]
    pub benefit_period: Option<ScalarDto>,
    #[serde(default)]
    pub waiting_period_days: Option<ScalarDto>,
}

impl From<DetailsDto> for DetailsDraft {
    fn from(dto: DetailsDto) -> Self {
        Self {
            vehicle_year: text(dto.vehicle_year),
            vehicle_make: text(dto.vehicle_make),
            vehicle_model: text(dto.vehicle_model),
            drivers: text(dto.drivers),
            current_insurer: text(dto.current_insurer),
            coverage_level: text(dto.coverage_level),
            property_type: text(dto.property_type),
            year_built: text(dto.year_built),
            square_feet: text(dto.square_feet),
            estimated_value: text(dto.estimated_value),
            occupancy: text(dto.occupancy),
            coverage_amount: text(dto.coverage_amount),
            term: text(dto.term),
            tobacco_use: text(dto.tobacco_use),
            household_size: text(dto.household_size),
            coverage_type: text(dto.coverage_type),
            annual_income: text(dto.annual_income),
            pre_existing_conditions: text(dto.pre_existing_conditions),
            occupation: text(dto.occupation),
            benefit_period: text(dto.benefit_period),
            waiting_period_days: text(dto.waiting_period_days),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentDto {
    #[serde(default)]
    pub tcpa: Option<ScalarDto>,
    #[serde(default)]
    pub privacy_policy: Option<ScalarDto>,
}

impl From<ConsentDto> for ConsentDraft {
    fn from(dto: ConsentDto) -> Self {
        Self {
            tcpa: text(dto.tcpa),
            privacy_policy: text(dto.privacy_policy),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributionDto {
    #[serde(default)]
    pub landing_page: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

impl From<AttributionDto> for AttributionDraft {
    fn from(dto: AttributionDto) -> Self {
        Self {
            landing_page: dto.landing_page,
            utm_source: dto.utm_source,
            utm_medium: dto.utm_medium,
            utm_campaign: dto.utm_campaign,
            referrer: dto.referrer,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadSubmissionDto {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub contact: ContactDto,
    #[serde(default)]
    pub details: DetailsDto,
    #[serde(default)]
    pub consent: ConsentDto,
    #[serde(default)]
    pub attribution: AttributionDto,
    #[serde(default)]
    pub notes: Option<String>,
    /// Honeypot input hidden from humans.
    #[serde(default)]
    pub website: Option<String>,
}

impl From<LeadSubmissionDto> for LeadDraft {
    fn from(dto: LeadSubmissionDto) -> Self {
        Self {
            product: dto.product,
            contact: dto.contact.into(),
            details: dto.details.into(),
            consent: dto.consent.into(),
            attribution: dto.attribution.into(),
            notes: dto.notes,
            honeypot: dto.website,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactMessageDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<ScalarDto>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl From<ContactMessageDto> for ContactMessageDraft {
    fn from(dto: ContactMessageDto) -> Self {
        Self {
            name: dto.name,
            email: dto.email,
            phone: text(dto.phone),
            subject: dto.subject,
            message: dto.message,
            honeypot: dto.website,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepValidationRequestDto {
    pub step: String,
    #[serde(default)]
    pub lead: LeadSubmissionDto,
}
