// SPDX-License-Identifier: Apache-2.0

use leadline_model::{
    form_fields, FieldError, FieldSpec, FormStep, ProductLine, SubmissionKind, ValidationErrors,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ACCEPTED_STATUS: &str = "accepted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptModeDto {
    Live,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrmReceiptDto {
    pub mode: ReceiptModeDto,
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayReceiptDto {
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadAcceptedDto {
    pub lead_id: String,
    pub status: String,
    pub kind: SubmissionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductLine>,
    pub received_at_ms: u64,
    pub crm: CrmReceiptDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayReceiptDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepValidationDto {
    pub step: FormStep,
    pub valid: bool,
    pub field_errors: Vec<FieldError>,
}

impl StepValidationDto {
    #[must_use]
    pub fn from_result(step: FormStep, result: Result<(), ValidationErrors>) -> Self {
        match result {
            Ok(()) => Self {
                step,
                valid: true,
                field_errors: Vec::new(),
            },
            Err(errors) => Self {
                step,
                valid: false,
                field_errors: errors.into_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormStepDto {
    pub step: FormStep,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductEntryDto {
    pub id: ProductLine,
    pub name: &'static str,
    pub quote_path: String,
    pub requires_date_of_birth: bool,
    pub steps: Vec<FormStepDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCatalogDto {
    pub products: Vec<ProductEntryDto>,
}

impl ProductCatalogDto {
    #[must_use]
    pub fn build() -> Self {
        let products = ProductLine::ALL
            .into_iter()
            .map(|product| ProductEntryDto {
                id: product,
                name: product.display_name(),
                quote_path: format!("/v1/quotes/{product}"),
                requires_date_of_birth: product.requires_date_of_birth(),
                steps: FormStep::ALL
                    .into_iter()
                    .map(|step| FormStepDto {
                        step,
                        fields: form_fields(product, step),
                    })
                    .collect(),
            })
            .collect();
        Self { products }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionDto {
    pub service: String,
    pub version: String,
    pub api_version: String,
    pub crm_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingPlaceholderDto {
    pub plan: String,
    pub status: String,
    pub message: String,
}

impl Default for BillingPlaceholderDto {
    fn default() -> Self {
        Self {
            plan: "none".to_string(),
            status: "not_configured".to_string(),
            message: "billing is not enabled for this portal".to_string(),
        }
    }
}

/// What an agent sees on the portal landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortalSummaryDto {
    pub leads_by_product: BTreeMap<String, u64>,
    pub contact_messages: u64,
    pub mock_receipts: u64,
    pub crm_mode: String,
    pub billing: BillingPlaceholderDto,
}
