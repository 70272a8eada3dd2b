// SPDX-License-Identifier: Apache-2.0

use leadline_model::ProductLine;
use serde_json::{json, Value};

fn sample_details(product: ProductLine) -> Value {
    match product {
        ProductLine::Auto => json!({
            "vehicle_year": 2021,
            "vehicle_make": "Toyota",
            "vehicle_model": "Camry",
            "drivers": 2,
            "current_insurer": "Acme Mutual",
            "coverage_level": "standard"
        }),
        ProductLine::Home => json!({
            "property_type": "single_family",
            "year_built": 1995,
            "square_feet": 1800,
            "estimated_value": "$350,000",
            "occupancy": "owner"
        }),
        ProductLine::Life => json!({
            "coverage_amount": "500,000",
            "term": "20",
            "tobacco_use": false
        }),
        ProductLine::Health => json!({
            "household_size": 1,
            "coverage_type": "individual",
            "pre_existing_conditions": false
        }),
        ProductLine::Disability => json!({
            "occupation": "Electrician",
            "annual_income": 85000,
            "benefit_period": "long_term",
            "waiting_period_days": "90"
        }),
    }
}

/// A quote submission that passes validation for `product`.
#[must_use]
pub fn sample_lead_payload(product: ProductLine) -> Value {
    json!({
        "product": product.as_str(),
        "contact": {
            "first_name": "Jordan",
            "last_name": "Rivera",
            "email": "jordan.rivera@example.com",
            "phone": "(415) 555-0134",
            "zip_code": "94107",
            "state": "CA",
            "date_of_birth": "1985-03-14"
        },
        "details": sample_details(product),
        "consent": {"tcpa": true, "privacy_policy": true},
        "attribution": {
            "landing_page": format!("/{}-insurance", product.as_str()),
            "utm_source": "smoke"
        }
    })
}

#[must_use]
pub fn sample_contact_payload() -> Value {
    json!({
        "name": "Jordan Rivera",
        "email": "jordan.rivera@example.com",
        "phone": "415-555-0134",
        "subject": "Bundling question",
        "message": "Can I bundle my home and auto policies?"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_contact_payload, parse_lead_payload};
    use leadline_model::{validate_contact_message, validate_lead, ValidationContext};

    #[test]
    fn every_sample_validates() {
        let ctx = ValidationContext::now();
        for product in ProductLine::ALL {
            let bytes = serde_json::to_vec(&sample_lead_payload(product)).expect("json");
            let draft = parse_lead_payload(&bytes, None).expect("parse");
            if let Err(errors) = validate_lead(&draft, &ctx) {
                panic!("{product} sample invalid: {errors}");
            }
        }
        let bytes = serde_json::to_vec(&sample_contact_payload()).expect("json");
        let draft = parse_contact_payload(&bytes).expect("parse");
        assert!(validate_contact_message(&draft).is_ok());
    }
}
