#![allow(dead_code)]

use chrono::NaiveDate;
use leadline_model::{
    Attribution, AutoDetails, Consent, ContactInfo, ContactMessage, CoverageLevel,
    EmailAddress, Lead, LeadId, PersonName, PhoneNumber, ProductDetails, ProductLine,
    Submission, UsState, ZipCode,
};

pub fn auto_lead() -> Lead {
    Lead {
        id: LeadId::parse("lead-0123456789abcdef0123").expect("id"),
        received_at_ms: 1_760_000_000_000,
        product: ProductLine::Auto,
        contact: ContactInfo {
            first_name: PersonName::parse("Ana").expect("first"),
            last_name: PersonName::parse("Lopez").expect("last"),
            email: EmailAddress::parse("ana.lopez@example.org").expect("email"),
            phone: PhoneNumber::parse("512-555-0199").expect("phone"),
            zip_code: ZipCode::parse("73301").expect("zip"),
            state: Some(UsState::parse("TX").expect("state")),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 2),
        },
        details: ProductDetails::Auto(AutoDetails {
            vehicle_year: 2021,
            vehicle_make: "Toyota".to_string(),
            vehicle_model: "Camry".to_string(),
            drivers: 2,
            current_insurer: None,
            coverage_level: CoverageLevel::Standard,
        }),
        consent: Consent {
            tcpa: true,
            privacy_policy: true,
        },
        attribution: Attribution {
            utm_source: Some("google".to_string()),
            landing_page: Some("/auto-insurance".to_string()),
            ..Attribution::default()
        },
        notes: Some("Prefers evening calls".to_string()),
    }
}

pub fn quote() -> Submission {
    Submission::Quote(auto_lead())
}

pub fn contact() -> Submission {
    Submission::Contact(ContactMessage {
        id: LeadId::parse("contact-fedcba9876543210fedc").expect("id"),
        received_at_ms: 1_760_000_000_500,
        name: "Mary Ann Smith".to_string(),
        email: EmailAddress::parse("mary@example.com").expect("email"),
        phone: None,
        subject: Some("Policy question".to_string()),
        message: "Can I bundle home and auto?".to_string(),
    })
}
