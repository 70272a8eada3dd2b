// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use leadline_model::{
    validate_lead, validate_step, ConsentDraft, ContactDraft, DetailsDraft, FormStep, LeadDraft,
    ProductDetails, ProductLine, Submission, ValidationContext,
};

fn ctx() -> ValidationContext {
    ValidationContext::at(NaiveDate::from_ymd_opt(2026, 6, 15).expect("date"))
}

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

fn contact(dob: Option<&str>) -> ContactDraft {
    ContactDraft {
        first_name: s("Ana"),
        last_name: s("Lopez"),
        email: s("ana.lopez@example.org"),
        phone: s("512-555-0199"),
        zip_code: s("73301"),
        state: s("tx"),
        date_of_birth: dob.map(str::to_string),
    }
}

fn consent() -> ConsentDraft {
    ConsentDraft {
        tcpa: s("yes"),
        privacy_policy: s("yes"),
    }
}

fn life_draft(dob: Option<&str>) -> LeadDraft {
    LeadDraft {
        product: s("life"),
        contact: contact(dob),
        details: DetailsDraft {
            coverage_amount: s("$500,000"),
            term: s("20"),
            tobacco_use: s("no"),
            ..DetailsDraft::default()
        },
        consent: consent(),
        ..LeadDraft::default()
    }
}

fn health_draft(coverage_type: &str, household: &str, dob: Option<&str>) -> LeadDraft {
    LeadDraft {
        product: s("health"),
        contact: contact(dob),
        details: DetailsDraft {
            household_size: s(household),
            coverage_type: s(coverage_type),
            ..DetailsDraft::default()
        },
        consent: consent(),
        ..LeadDraft::default()
    }
}

#[test]
fn life_requires_date_of_birth() {
    let errors = validate_lead(&life_draft(None), &ctx()).expect_err("dob required");
    assert_eq!(errors.fields(), vec!["contact.date_of_birth"]);
}

#[test]
fn life_enforces_age_band() {
    assert!(validate_lead(&life_draft(Some("1980-01-01")), &ctx()).is_ok());
    let too_young = validate_lead(&life_draft(Some("2010-01-01")), &ctx()).expect_err("young");
    assert_eq!(too_young.fields(), vec!["contact.date_of_birth"]);
    let too_old = validate_lead(&life_draft(Some("1930-01-01")), &ctx()).expect_err("old");
    assert_eq!(too_old.fields(), vec!["contact.date_of_birth"]);
}

#[test]
fn date_of_birth_must_be_in_the_past_and_well_formed() {
    for dob in ["2027-01-01", "06/15/1980", "1980-02-30"] {
        let errors = validate_lead(&life_draft(Some(dob)), &ctx()).expect_err(dob);
        assert_eq!(errors.fields(), vec!["contact.date_of_birth"], "{dob}");
    }
}

#[test]
fn life_lead_normalizes_money_and_flags() {
    let lead = validate_lead(&life_draft(Some("1980-01-01")), &ctx()).expect("valid");
    match lead.details {
        ProductDetails::Life(details) => {
            assert_eq!(details.coverage_amount, 500_000);
            assert!(!details.tobacco_use);
        }
        other => panic!("unexpected details {other:?}"),
    }
    assert_eq!(
        lead.contact.state.as_ref().map(|s| s.as_str()),
        Some("TX")
    );
}

#[test]
fn family_health_needs_more_than_one_person() {
    let errors =
        validate_lead(&health_draft("family", "1", None), &ctx()).expect_err("household");
    assert_eq!(errors.fields(), vec!["details.household_size"]);
    assert!(validate_lead(&health_draft("family", "3", None), &ctx()).is_ok());
}

#[test]
fn medicare_supplement_checks_age_on_coverage_type() {
    let errors = validate_lead(&health_draft("medicare_supplement", "1", None), &ctx())
        .expect_err("dob needed");
    assert_eq!(errors.fields(), vec!["details.coverage_type"]);
    let errors = validate_lead(
        &health_draft("medicare_supplement", "1", Some("1990-01-01")),
        &ctx(),
    )
    .expect_err("too young");
    assert_eq!(errors.fields(), vec!["details.coverage_type"]);
    assert!(validate_lead(
        &health_draft("medicare-supplement", "1", Some("1955-03-02")),
        &ctx()
    )
    .is_ok());
}

#[test]
fn unknown_product_is_reported_on_product_field() {
    let mut draft = life_draft(Some("1980-01-01"));
    draft.product = s("pet");
    let errors = validate_lead(&draft, &ctx()).expect_err("product");
    assert_eq!(errors.fields(), vec!["product"]);
}

#[test]
fn empty_draft_reports_every_required_field() {
    let mut draft = LeadDraft {
        product: s("disability"),
        ..LeadDraft::default()
    };
    draft.consent.tcpa = s("false");
    let errors = validate_lead(&draft, &ctx()).expect_err("empty");
    let fields = errors.fields();
    for expected in [
        "consent.privacy_policy",
        "consent.tcpa",
        "contact.email",
        "contact.first_name",
        "contact.last_name",
        "contact.phone",
        "contact.zip_code",
        "details.annual_income",
        "details.benefit_period",
        "details.occupation",
        "details.waiting_period_days",
    ] {
        assert!(fields.contains(&expected), "missing {expected} in {fields:?}");
    }
    let mut sorted = fields.clone();
    sorted.sort_unstable();
    assert_eq!(fields, sorted);
}

#[test]
fn consent_step_covers_attribution_and_notes() {
    let mut draft = life_draft(Some("1980-01-01"));
    draft.attribution.utm_source = Some("x".repeat(201));
    draft.notes = Some("n".repeat(2001));
    assert!(validate_step(&draft, FormStep::Contact, &ctx()).is_ok());
    assert!(validate_step(&draft, FormStep::Details, &ctx()).is_ok());
    let errors = validate_step(&draft, FormStep::Consent, &ctx()).expect_err("consent step");
    assert_eq!(errors.fields(), vec!["attribution.utm_source", "notes"]);
}

#[test]
fn validated_lead_becomes_identified_submission() {
    let validated = validate_lead(&life_draft(Some("1980-01-01")), &ctx()).expect("valid");
    let lead = validated.clone().into_lead(1_750_000_000_000).expect("lead");
    let again = validated.into_lead(1_750_000_000_000).expect("lead");
    assert_eq!(lead.id, again.id);
    assert!(lead.id.as_str().starts_with("lead-"));
    assert_eq!(lead.product, ProductLine::Life);

    let submission = Submission::Quote(lead);
    let json = serde_json::to_value(&submission).expect("json");
    assert_eq!(json["kind"], "quote");
    assert_eq!(json["payload"]["details"]["line"], "life");
    let back: Submission = serde_json::from_value(json).expect("roundtrip");
    assert_eq!(back, submission);
}

#[test]
fn receive_time_changes_the_id() {
    let validated = validate_lead(&life_draft(Some("1980-01-01")), &ctx()).expect("valid");
    let a = validated.clone().into_lead(1).expect("lead");
    let b = validated.into_lead(2).expect("lead");
    assert_ne!(a.id, b.id);
}
