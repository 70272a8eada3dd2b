// SPDX-License-Identifier: Apache-2.0

use leadline_model::{ContactMessage, Lead, ProductDetails, Submission};
use serde::{Deserialize, Serialize};

pub const LEAD_STATUS_NEW: &str = "Open - Not Contacted";
pub const LEAD_SOURCE_QUOTE: &str = "Web Quote";
pub const LEAD_SOURCE_CONTACT: &str = "Web Contact";

/// The CRM's `Lead` object as the data API expects it. Standard fields are
/// PascalCase, org-specific custom fields end in `__c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CrmLeadRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub company: String,
    pub lead_source: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "External_Lead_Id__c")]
    pub external_lead_id: String,
    #[serde(rename = "Product_Line__c", default, skip_serializing_if = "Option::is_none")]
    pub product_line: Option<String>,
    #[serde(rename = "Birthdate__c", default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(rename = "TCPA_Consent__c")]
    pub tcpa_consent: bool,
    #[serde(rename = "UTM_Source__c", default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(rename = "UTM_Medium__c", default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(rename = "UTM_Campaign__c", default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(rename = "Landing_Page__c", default, skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
    #[serde(rename = "Referrer__c", default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(rename = "Notes__c", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(rename = "Vehicle_Year__c", default, skip_serializing_if = "Option::is_none")]
    pub vehicle_year: Option<u16>,
    #[serde(rename = "Vehicle_Make__c", default, skip_serializing_if = "Option::is_none")]
    pub vehicle_make: Option<String>,
    #[serde(rename = "Vehicle_Model__c", default, skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
    #[serde(rename = "Drivers__c", default, skip_serializing_if = "Option::is_none")]
    pub drivers: Option<u8>,
    #[serde(rename = "Current_Insurer__c", default, skip_serializing_if = "Option::is_none")]
    pub current_insurer: Option<String>,
    #[serde(rename = "Coverage_Level__c", default, skip_serializing_if = "Option::is_none")]
    pub coverage_level: Option<String>,
    #[serde(rename = "Property_Type__c", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(rename = "Year_Built__c", default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u16>,
    #[serde(rename = "Square_Feet__c", default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(rename = "Estimated_Value__c", default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<u64>,
    #[serde(rename = "Occupancy__c", default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<String>,
    #[serde(rename = "Coverage_Amount__c", default, skip_serializing_if = "Option::is_none")]
    pub coverage_amount: Option<u64>,
    #[serde(rename = "Term__c", default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(rename = "Tobacco_Use__c", default, skip_serializing_if = "Option::is_none")]
    pub tobacco_use: Option<bool>,
    #[serde(rename = "Household_Size__c", default, skip_serializing_if = "Option::is_none")]
    pub household_size: Option<u8>,
    #[serde(rename = "Health_Coverage_Type__c", default, skip_serializing_if = "Option::is_none")]
    pub health_coverage_type: Option<String>,
    #[serde(rename = "Annual_Income__c", default, skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<u64>,
    #[serde(
        rename = "Pre_Existing_Conditions__c",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_existing_conditions: Option<bool>,
    #[serde(rename = "Occupation__c", default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(rename = "Benefit_Period__c", default, skip_serializing_if = "Option::is_none")]
    pub benefit_period: Option<String>,
    #[serde(rename = "Waiting_Period_Days__c", default, skip_serializing_if = "Option::is_none")]
    pub waiting_period_days: Option<String>,
}

impl CrmLeadRecord {
    #[must_use]
    pub fn from_submission(submission: &Submission) -> Self {
        match submission {
            Submission::Quote(lead) => Self::from_lead(lead),
            Submission::Contact(message) => Self::from_contact(message),
        }
    }

    #[must_use]
    pub fn from_lead(lead: &Lead) -> Self {
        let contact = &lead.contact;
        let mut record = Self {
            first_name: Some(contact.first_name.to_string()),
            last_name: contact.last_name.to_string(),
            email: contact.email.to_string(),
            phone: Some(contact.phone.formatted()),
            postal_code: Some(contact.zip_code.to_string()),
            state: contact.state.as_ref().map(ToString::to_string),
            company: household(contact.last_name.as_str()),
            lead_source: LEAD_SOURCE_QUOTE.to_string(),
            status: LEAD_STATUS_NEW.to_string(),
            description: Some(lead.details.summary()),
            external_lead_id: lead.id.to_string(),
            product_line: Some(lead.product.display_name().to_string()),
            birthdate: contact.date_of_birth.map(|d| d.to_string()),
            tcpa_consent: lead.consent.tcpa,
            utm_source: lead.attribution.utm_source.clone(),
            utm_medium: lead.attribution.utm_medium.clone(),
            utm_campaign: lead.attribution.utm_campaign.clone(),
            landing_page: lead.attribution.landing_page.clone(),
            referrer: lead.attribution.referrer.clone(),
            notes: lead.notes.clone(),
            ..Self::default()
        };
        record.apply_details(&lead.details);
        record
    }

    #[must_use]
    pub fn from_contact(message: &ContactMessage) -> Self {
        let (first, last) = message.split_name();
        let description = match &message.subject {
            Some(subject) => format!("{subject}\n\n{}", message.message),
            None => message.message.clone(),
        };
        Self {
            first_name: first.map(str::to_string),
            last_name: last.to_string(),
            email: message.email.to_string(),
            phone: message.phone.as_ref().map(|p| p.formatted()),
            company: household(last),
            lead_source: LEAD_SOURCE_CONTACT.to_string(),
            status: LEAD_STATUS_NEW.to_string(),
            description: Some(description),
            external_lead_id: message.id.to_string(),
            ..Self::default()
        }
    }

    fn apply_details(&mut self, details: &ProductDetails) {
        match details {
            ProductDetails::Auto(d) => {
                self.vehicle_year = Some(d.vehicle_year);
                self.vehicle_make = Some(d.vehicle_make.clone());
                self.vehicle_model = Some(d.vehicle_model.clone());
                self.drivers = Some(d.drivers);
                self.current_insurer = d.current_insurer.clone();
                self.coverage_level = Some(d.coverage_level.as_str().to_string());
            }
            ProductDetails::Home(d) => {
                self.property_type = Some(d.property_type.as_str().to_string());
                self.year_built = Some(d.year_built);
                self.square_feet = Some(d.square_feet);
                self.estimated_value = d.estimated_value;
                self.occupancy = Some(d.occupancy.as_str().to_string());
            }
            ProductDetails::Life(d) => {
                self.coverage_amount = Some(d.coverage_amount);
                self.term = Some(d.term.as_str().to_string());
                self.tobacco_use = Some(d.tobacco_use);
            }
            ProductDetails::Health(d) => {
                self.household_size = Some(d.household_size);
                self.health_coverage_type = Some(d.coverage_type.as_str().to_string());
                self.annual_income = d.annual_income;
                self.pre_existing_conditions = Some(d.pre_existing_conditions);
            }
            ProductDetails::Disability(d) => {
                self.occupation = Some(d.occupation.clone());
                self.annual_income = Some(d.annual_income);
                self.benefit_period = Some(d.benefit_period.as_str().to_string());
                self.waiting_period_days = Some(d.waiting_period_days.as_str().to_string());
            }
        }
    }
}

/// The CRM requires a company on every lead; households stand in for
/// personal-lines prospects.
fn household(last_name: &str) -> String {
    format!("{last_name} Household")
}
