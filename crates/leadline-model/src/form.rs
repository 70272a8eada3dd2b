// SPDX-License-Identifier: Apache-2.0

use crate::details::{
    BenefitPeriod, CoverageLevel, HealthCoverageType, LifeTerm, Occupancy, PropertyType,
    WaitingPeriod,
};
use crate::product::ProductLine;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStep {
    Contact,
    Details,
    Consent,
}

impl FormStep {
    pub const ALL: [FormStep; 3] = [FormStep::Contact, FormStep::Details, FormStep::Consent];

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "contact" => Some(Self::Contact),
            "details" => Some(Self::Details),
            "consent" => Some(Self::Consent),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Details => "details",
            Self::Consent => "consent",
        }
    }

    /// Whether a dotted field path is checked on this step. `product` is
    /// checked on every step because the other rules depend on it.
    #[must_use]
    pub fn owns_field(self, field: &str) -> bool {
        if field == "product" {
            return true;
        }
        let prefixes: &[&str] = match self {
            Self::Contact => &["contact."],
            Self::Details => &["details."],
            Self::Consent => &["consent.", "attribution.", "notes"],
        };
        prefixes.iter().any(|p| field.starts_with(p))
    }

    #[must_use]
    pub fn fields(self, product: ProductLine) -> Vec<FieldSpec> {
        form_fields(product, self)
    }
}

impl Display for FormStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Number,
    Date,
    Choice,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "no_choices")]
    pub choices: &'static [&'static str],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_choices(choices: &&'static [&'static str]) -> bool {
    choices.is_empty()
}

const fn field(
    name: &'static str,
    label: &'static str,
    required: bool,
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        required,
        kind,
        choices: &[],
    }
}

const fn choice(
    name: &'static str,
    label: &'static str,
    choices: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        required: true,
        kind: FieldKind::Choice,
        choices,
    }
}

const AUTO_FIELDS: &[FieldSpec] = &[
    field("details.vehicle_year", "Vehicle year", true, FieldKind::Number),
    field("details.vehicle_make", "Vehicle make", true, FieldKind::Text),
    field("details.vehicle_model", "Vehicle model", true, FieldKind::Text),
    field("details.drivers", "Number of drivers", true, FieldKind::Number),
    field("details.current_insurer", "Current insurer", false, FieldKind::Text),
    choice("details.coverage_level", "Coverage level", CoverageLevel::CHOICES),
];

const HOME_FIELDS: &[FieldSpec] = &[
    choice("details.property_type", "Property type", PropertyType::CHOICES),
    field("details.year_built", "Year built", true, FieldKind::Number),
    field("details.square_feet", "Square feet", true, FieldKind::Number),
    field("details.estimated_value", "Estimated value", false, FieldKind::Number),
    choice("details.occupancy", "Occupancy", Occupancy::CHOICES),
];

const LIFE_FIELDS: &[FieldSpec] = &[
    field("details.coverage_amount", "Coverage amount", true, FieldKind::Number),
    choice("details.term", "Term", LifeTerm::CHOICES),
    field("details.tobacco_use", "Tobacco use", true, FieldKind::Boolean),
];

const HEALTH_FIELDS: &[FieldSpec] = &[
    field("details.household_size", "Household size", true, FieldKind::Number),
    choice("details.coverage_type", "Coverage type", HealthCoverageType::CHOICES),
    field("details.annual_income", "Annual household income", false, FieldKind::Number),
    field(
        "details.pre_existing_conditions",
        "Pre-existing conditions",
        false,
        FieldKind::Boolean,
    ),
];

const DISABILITY_FIELDS: &[FieldSpec] = &[
    field("details.occupation", "Occupation", true, FieldKind::Text),
    field("details.annual_income", "Annual income", true, FieldKind::Number),
    choice("details.benefit_period", "Benefit period", BenefitPeriod::CHOICES),
    choice(
        "details.waiting_period_days",
        "Waiting period (days)",
        WaitingPeriod::CHOICES,
    ),
];

#[must_use]
pub fn detail_fields(product: ProductLine) -> &'static [FieldSpec] {
    match product {
        ProductLine::Auto => AUTO_FIELDS,
        ProductLine::Home => HOME_FIELDS,
        ProductLine::Life => LIFE_FIELDS,
        ProductLine::Health => HEALTH_FIELDS,
        ProductLine::Disability => DISABILITY_FIELDS,
    }
}

#[must_use]
pub fn form_fields(product: ProductLine, step: FormStep) -> Vec<FieldSpec> {
    match step {
        FormStep::Contact => vec![
            field("contact.first_name", "First name", true, FieldKind::Text),
            field("contact.last_name", "Last name", true, FieldKind::Text),
            field("contact.email", "Email", true, FieldKind::Email),
            field("contact.phone", "Phone", true, FieldKind::Tel),
            field("contact.zip_code", "ZIP code", true, FieldKind::Text),
            field("contact.state", "State", false, FieldKind::Text),
            field(
                "contact.date_of_birth",
                "Date of birth",
                product.requires_date_of_birth(),
                FieldKind::Date,
            ),
        ],
        FormStep::Details => detail_fields(product).to_vec(),
        FormStep::Consent => vec![
            field("consent.tcpa", "Contact consent", true, FieldKind::Boolean),
            field(
                "consent.privacy_policy",
                "Privacy policy",
                true,
                FieldKind::Boolean,
            ),
            field("notes", "Anything else we should know?", false, FieldKind::Text),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_step_owns_product() {
        for step in FormStep::ALL {
            assert!(step.owns_field("product"));
        }
        assert!(FormStep::Contact.owns_field("contact.email"));
        assert!(!FormStep::Contact.owns_field("details.drivers"));
        assert!(FormStep::Consent.owns_field("attribution.utm_source"));
    }

    #[test]
    fn life_contact_step_requires_date_of_birth() {
        let dob = |product| {
            form_fields(product, FormStep::Contact)
                .into_iter()
                .find(|f| f.name == "contact.date_of_birth")
                .map(|f| f.required)
        };
        assert_eq!(dob(ProductLine::Life), Some(true));
        assert_eq!(dob(ProductLine::Auto), Some(false));
    }

    #[test]
    fn detail_fields_are_namespaced() {
        for product in ProductLine::ALL {
            for spec in detail_fields(product) {
                assert!(spec.name.starts_with("details."), "{}", spec.name);
                assert_eq!(spec.kind == FieldKind::Choice, !spec.choices.is_empty());
            }
        }
    }
}
