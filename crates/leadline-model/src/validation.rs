// SPDX-License-Identifier: Apache-2.0

use crate::contact::{
    ContactInfo, EmailAddress, PersonName, PhoneNumber, UsState, ValidationError, ZipCode,
};
use crate::details::{
    AutoDetails, BenefitPeriod, CoverageLevel, DisabilityDetails, HealthCoverageType,
    HealthDetails, HomeDetails, LifeDetails, LifeTerm, Occupancy, ProductDetails, PropertyType,
    WaitingPeriod,
};
use crate::form::{detail_fields, FormStep};
use crate::lead::{Attribution, Consent, ContactMessage, Lead, LeadId, SubmissionKind};
use crate::product::ProductLine;
use chrono::{Datelike, NaiveDate};
use leadline_core::canonical::stable_json_hash_hex;
use serde::Serialize;
use serde_json::json;
use std::fmt::{Display, Formatter};

pub const ATTRIBUTION_MAX_LEN: usize = 200;
pub const NOTES_MAX_LEN: usize = 2000;
pub const MESSAGE_MAX_LEN: usize = 5000;
pub const SUBJECT_MAX_LEN: usize = 120;
pub const CONTACT_NAME_MAX_LEN: usize = 100;
pub const MAX_APPLICANT_AGE: u32 = 120;

const MIN_VEHICLE_YEAR: u64 = 1981;
const MIN_YEAR_BUILT: u64 = 1800;
const MAX_INCOME: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Every field error found in one pass, sorted by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn new(mut errors: Vec<FieldError>) -> Self {
        errors.sort();
        errors.dedup();
        Self(errors)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        out.dedup();
        out
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    #[must_use]
    fn retain_step(self, step: FormStep) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|e| step.owns_field(&e.field))
                .collect(),
        )
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.reason))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub today: NaiveDate,
}

impl ValidationContext {
    #[must_use]
    pub fn now() -> Self {
        Self {
            today: chrono::Utc::now().date_naive(),
        }
    }

    #[must_use]
    pub const fn at(today: NaiveDate) -> Self {
        Self { today }
    }

    fn current_year(&self) -> u64 {
        u64::try_from(self.today.year()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub state: Option<String>,
    pub date_of_birth: Option<String>,
}

/// Union of every product's detail inputs as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsDraft {
    pub vehicle_year: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub drivers: Option<String>,
    pub current_insurer: Option<String>,
    pub coverage_level: Option<String>,
    pub property_type: Option<String>,
    pub year_built: Option<String>,
    pub square_feet: Option<String>,
    pub estimated_value: Option<String>,
    pub occupancy: Option<String>,
    pub coverage_amount: Option<String>,
    pub term: Option<String>,
    pub tobacco_use: Option<String>,
    pub household_size: Option<String>,
    pub coverage_type: Option<String>,
    pub annual_income: Option<String>,
    pub pre_existing_conditions: Option<String>,
    pub occupation: Option<String>,
    pub benefit_period: Option<String>,
    pub waiting_period_days: Option<String>,
}

impl DetailsDraft {
    fn provided(&self) -> Vec<&'static str> {
        let all: [(&'static str, &Option<String>); 21] = [
            ("details.vehicle_year", &self.vehicle_year),
            ("details.vehicle_make", &self.vehicle_make),
            ("details.vehicle_model", &self.vehicle_model),
            ("details.drivers", &self.drivers),
            ("details.current_insurer", &self.current_insurer),
            ("details.coverage_level", &self.coverage_level),
            ("details.property_type", &self.property_type),
            ("details.year_built", &self.year_built),
            ("details.square_feet", &self.square_feet),
            ("details.estimated_value", &self.estimated_value),
            ("details.occupancy", &self.occupancy),
            ("details.coverage_amount", &self.coverage_amount),
            ("details.term", &self.term),
            ("details.tobacco_use", &self.tobacco_use),
            ("details.household_size", &self.household_size),
            ("details.coverage_type", &self.coverage_type),
            ("details.annual_income", &self.annual_income),
            ("details.pre_existing_conditions", &self.pre_existing_conditions),
            ("details.occupation", &self.occupation),
            ("details.benefit_period", &self.benefit_period),
            ("details.waiting_period_days", &self.waiting_period_days),
        ];
        all.into_iter()
            .filter(|(_, v)| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentDraft {
    pub tcpa: Option<String>,
    pub privacy_policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributionDraft {
    pub landing_page: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub referrer: Option<String>,
}

/// Raw quote form input. Every value is kept as submitted text so that
/// validation can report every problem at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadDraft {
    pub product: Option<String>,
    pub contact: ContactDraft,
    pub details: DetailsDraft,
    pub consent: ConsentDraft,
    pub attribution: AttributionDraft,
    pub notes: Option<String>,
    /// Hidden `website` input; humans never fill it in.
    pub honeypot: Option<String>,
}

impl LeadDraft {
    #[must_use]
    pub fn is_honeypot_tripped(&self) -> bool {
        honeypot_tripped(self.honeypot.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMessageDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub honeypot: Option<String>,
}

impl ContactMessageDraft {
    #[must_use]
    pub fn is_honeypot_tripped(&self) -> bool {
        honeypot_tripped(self.honeypot.as_deref())
    }
}

fn honeypot_tripped(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedLead {
    pub product: ProductLine,
    pub contact: ContactInfo,
    pub details: ProductDetails,
    pub consent: Consent,
    pub attribution: Attribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ValidatedLead {
    /// Stamps the lead with its receive instant and derives its id from the
    /// stable hash of both.
    pub fn into_lead(self, received_at_ms: u64) -> Result<Lead, serde_json::Error> {
        let digest = stable_json_hash_hex(&json!({
            "kind": SubmissionKind::Quote.as_str(),
            "received_at_ms": received_at_ms,
            "lead": &self,
        }))?;
        Ok(Lead {
            id: LeadId::derive(SubmissionKind::Quote, &digest),
            received_at_ms,
            product: self.product,
            contact: self.contact,
            details: self.details,
            consent: self.consent,
            attribution: self.attribution,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedContact {
    pub name: String,
    pub email: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ValidatedContact {
    pub fn into_message(self, received_at_ms: u64) -> Result<ContactMessage, serde_json::Error> {
        let digest = stable_json_hash_hex(&json!({
            "kind": SubmissionKind::Contact.as_str(),
            "received_at_ms": received_at_ms,
            "message": &self,
        }))?;
        Ok(ContactMessage {
            id: LeadId::derive(SubmissionKind::Contact, &digest),
            received_at_ms,
            name: self.name,
            email: self.email,
            phone: self.phone,
            subject: self.subject,
            message: self.message,
        })
    }
}

/// Whole years between `dob` and `today`, not counting a birthday that has
/// not happened yet this year.
#[must_use]
pub fn applicant_age(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Accepts `12`, `12,000`, `$250,000` and `40.00`; rejects signs and real
/// fractions.
pub fn parse_whole_number(raw: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError("must be a whole number".to_string());
    let trimmed = raw.trim();
    let unprefixed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let cleaned: String = unprefixed.chars().filter(|c| *c != ',').collect();
    let integral = match cleaned.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.chars().all(|c| c == '0') => int,
        Some(_) => return Err(invalid()),
        None => cleaned.as_str(),
    };
    if integral.is_empty() || !integral.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    integral.parse::<u64>().map_err(|_| invalid())
}

pub fn parse_flag(raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ValidationError("must be yes or no".to_string())),
    }
}

struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    fn present(raw: Option<&String>) -> Option<&str> {
        raw.map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    fn required<'a>(&mut self, field: &str, raw: Option<&'a String>) -> Option<&'a str> {
        let value = Self::present(raw);
        if value.is_none() {
            self.push(field, "is required");
        }
        value
    }

    fn parsed<T>(
        &mut self,
        field: &str,
        raw: Option<&String>,
        parse: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Option<T> {
        let value = self.required(field, raw)?;
        parse(value).map_err(|e| self.push(field, e.0)).ok()
    }

    fn optional_parsed<T>(
        &mut self,
        field: &str,
        raw: Option<&String>,
        parse: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Option<Option<T>> {
        match Self::present(raw) {
            None => Some(None),
            Some(value) => parse(value).map(Some).map_err(|e| self.push(field, e.0)).ok(),
        }
    }

    fn choice<T>(
        &mut self,
        field: &str,
        raw: Option<&String>,
        parse: fn(&str) -> Option<T>,
        choices: &[&str],
    ) -> Option<T> {
        let value = self.required(field, raw)?;
        let parsed = parse(value);
        if parsed.is_none() {
            self.push(field, format!("must be one of: {}", choices.join(", ")));
        }
        parsed
    }

    fn number_in(&mut self, field: &str, raw: Option<&String>, min: u64, max: u64) -> Option<u64> {
        let n = self.parsed(field, raw, parse_whole_number)?;
        if n < min || n > max {
            self.push(field, format!("must be between {min} and {max}"));
            return None;
        }
        Some(n)
    }

    fn optional_number_in(
        &mut self,
        field: &str,
        raw: Option<&String>,
        min: u64,
        max: u64,
    ) -> Option<Option<u64>> {
        let n = self.optional_parsed(field, raw, parse_whole_number)?;
        match n {
            Some(v) if v < min || v > max => {
                self.push(field, format!("must be between {min} and {max}"));
                None
            }
            other => Some(other),
        }
    }

    fn text(&mut self, field: &str, raw: Option<&String>, max: usize) -> Option<String> {
        let value = self.required(field, raw)?;
        self.bounded(field, value, max)
    }

    fn optional_text(
        &mut self,
        field: &str,
        raw: Option<&String>,
        max: usize,
    ) -> Option<Option<String>> {
        match Self::present(raw) {
            None => Some(None),
            Some(value) => self.bounded(field, value, max).map(Some),
        }
    }

    fn bounded(&mut self, field: &str, value: &str, max: usize) -> Option<String> {
        if value.chars().count() > max {
            self.push(field, format!("must be at most {max} characters"));
            return None;
        }
        if value.chars().any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t') {
            self.push(field, "must not contain control characters");
            return None;
        }
        Some(value.to_string())
    }

    fn flag(&mut self, field: &str, raw: Option<&String>) -> Option<bool> {
        self.parsed(field, raw, parse_flag)
    }

    fn finish(self) -> ValidationErrors {
        ValidationErrors::new(self.errors)
    }
}

fn parse_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let dob = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError("must be a date in YYYY-MM-DD format".to_string()))?;
    if dob >= today {
        return Err(ValidationError("must be in the past".to_string()));
    }
    if applicant_age(dob, today) > MAX_APPLICANT_AGE {
        return Err(ValidationError(format!(
            "implies an age over {MAX_APPLICANT_AGE}"
        )));
    }
    Ok(dob)
}

fn check_contact(
    c: &mut Checker,
    draft: &ContactDraft,
    product: Option<ProductLine>,
    ctx: &ValidationContext,
) -> Option<ContactInfo> {
    let first_name = c.parsed("contact.first_name", draft.first_name.as_ref(), PersonName::parse);
    let last_name = c.parsed("contact.last_name", draft.last_name.as_ref(), PersonName::parse);
    let email = c.parsed("contact.email", draft.email.as_ref(), EmailAddress::parse);
    let phone = c.parsed("contact.phone", draft.phone.as_ref(), PhoneNumber::parse);
    let zip_code = c.parsed("contact.zip_code", draft.zip_code.as_ref(), ZipCode::parse);
    let state = c.optional_parsed("contact.state", draft.state.as_ref(), UsState::parse);
    let dob_required = product.is_some_and(ProductLine::requires_date_of_birth);
    let date_of_birth = if dob_required {
        c.parsed("contact.date_of_birth", draft.date_of_birth.as_ref(), |raw| {
            parse_date_of_birth(raw, ctx.today)
        })
        .map(Some)
    } else {
        c.optional_parsed("contact.date_of_birth", draft.date_of_birth.as_ref(), |raw| {
            parse_date_of_birth(raw, ctx.today)
        })
    };
    if product == Some(ProductLine::Life) {
        if let Some(Some(dob)) = date_of_birth {
            let age = applicant_age(dob, ctx.today);
            if !(18..=85).contains(&age) {
                c.push(
                    "contact.date_of_birth",
                    "life coverage is available for ages 18 to 85",
                );
                return None;
            }
        }
    }
    Some(ContactInfo {
        first_name: first_name?,
        last_name: last_name?,
        email: email?,
        phone: phone?,
        zip_code: zip_code?,
        state: state?,
        date_of_birth: date_of_birth?,
    })
}

fn check_details(
    c: &mut Checker,
    product: ProductLine,
    d: &DetailsDraft,
    dob: Option<NaiveDate>,
    ctx: &ValidationContext,
) -> Option<ProductDetails> {
    let allowed = detail_fields(product);
    for name in d.provided() {
        if !allowed.iter().any(|spec| spec.name == name) {
            c.push(name, format!("does not apply to {product} quotes"));
        }
    }
    let year = ctx.current_year();
    match product {
        ProductLine::Auto => {
            let vehicle_year = c.number_in(
                "details.vehicle_year",
                d.vehicle_year.as_ref(),
                MIN_VEHICLE_YEAR,
                year + 1,
            );
            let vehicle_make = c.text("details.vehicle_make", d.vehicle_make.as_ref(), 40);
            let vehicle_model = c.text("details.vehicle_model", d.vehicle_model.as_ref(), 40);
            let drivers = c.number_in("details.drivers", d.drivers.as_ref(), 1, 8);
            let current_insurer =
                c.optional_text("details.current_insurer", d.current_insurer.as_ref(), 80);
            let coverage_level = c.choice(
                "details.coverage_level",
                d.coverage_level.as_ref(),
                CoverageLevel::parse,
                CoverageLevel::CHOICES,
            );
            Some(ProductDetails::Auto(AutoDetails {
                vehicle_year: u16::try_from(vehicle_year?).ok()?,
                vehicle_make: vehicle_make?,
                vehicle_model: vehicle_model?,
                drivers: u8::try_from(drivers?).ok()?,
                current_insurer: current_insurer?,
                coverage_level: coverage_level?,
            }))
        }
        ProductLine::Home => {
            let property_type = c.choice(
                "details.property_type",
                d.property_type.as_ref(),
                PropertyType::parse,
                PropertyType::CHOICES,
            );
            let year_built =
                c.number_in("details.year_built", d.year_built.as_ref(), MIN_YEAR_BUILT, year);
            let square_feet =
                c.number_in("details.square_feet", d.square_feet.as_ref(), 200, 20_000);
            let estimated_value = c.optional_number_in(
                "details.estimated_value",
                d.estimated_value.as_ref(),
                10_000,
                u64::MAX,
            );
            let occupancy = c.choice(
                "details.occupancy",
                d.occupancy.as_ref(),
                Occupancy::parse,
                Occupancy::CHOICES,
            );
            Some(ProductDetails::Home(HomeDetails {
                property_type: property_type?,
                year_built: u16::try_from(year_built?).ok()?,
                square_feet: u32::try_from(square_feet?).ok()?,
                estimated_value: estimated_value?,
                occupancy: occupancy?,
            }))
        }
        ProductLine::Life => {
            let coverage_amount = c.number_in(
                "details.coverage_amount",
                d.coverage_amount.as_ref(),
                10_000,
                10_000_000,
            );
            let term = c.choice(
                "details.term",
                d.term.as_ref(),
                LifeTerm::parse,
                LifeTerm::CHOICES,
            );
            let tobacco_use = c.flag("details.tobacco_use", d.tobacco_use.as_ref());
            Some(ProductDetails::Life(LifeDetails {
                coverage_amount: coverage_amount?,
                term: term?,
                tobacco_use: tobacco_use?,
            }))
        }
        ProductLine::Health => {
            let household_size =
                c.number_in("details.household_size", d.household_size.as_ref(), 1, 12);
            let coverage_type = c.choice(
                "details.coverage_type",
                d.coverage_type.as_ref(),
                HealthCoverageType::parse,
                HealthCoverageType::CHOICES,
            );
            let annual_income = c.optional_number_in(
                "details.annual_income",
                d.annual_income.as_ref(),
                0,
                MAX_INCOME,
            );
            let pre_existing_conditions = c
                .optional_parsed(
                    "details.pre_existing_conditions",
                    d.pre_existing_conditions.as_ref(),
                    parse_flag,
                )
                .map(|v| v.unwrap_or(false));
            match (coverage_type, household_size) {
                (Some(HealthCoverageType::Family), Some(size)) if size < 2 => {
                    c.push(
                        "details.household_size",
                        "family coverage needs a household of at least 2",
                    );
                    return None;
                }
                (Some(HealthCoverageType::MedicareSupplement), _) => {
                    let eligible = dob.is_some_and(|dob| applicant_age(dob, ctx.today) >= 64);
                    if !eligible {
                        c.push(
                            "details.coverage_type",
                            "medicare supplement needs a date of birth showing age 64 or older",
                        );
                        return None;
                    }
                }
                _ => {}
            }
            Some(ProductDetails::Health(HealthDetails {
                household_size: u8::try_from(household_size?).ok()?,
                coverage_type: coverage_type?,
                annual_income: annual_income?,
                pre_existing_conditions: pre_existing_conditions?,
            }))
        }
        ProductLine::Disability => {
            let occupation = c.text("details.occupation", d.occupation.as_ref(), 80);
            let annual_income =
                c.number_in("details.annual_income", d.annual_income.as_ref(), 1, MAX_INCOME);
            let benefit_period = c.choice(
                "details.benefit_period",
                d.benefit_period.as_ref(),
                BenefitPeriod::parse,
                BenefitPeriod::CHOICES,
            );
            let waiting_period_days = c.choice(
                "details.waiting_period_days",
                d.waiting_period_days.as_ref(),
                WaitingPeriod::parse,
                WaitingPeriod::CHOICES,
            );
            Some(ProductDetails::Disability(DisabilityDetails {
                occupation: occupation?,
                annual_income: annual_income?,
                benefit_period: benefit_period?,
                waiting_period_days: waiting_period_days?,
            }))
        }
    }
}

fn check_consent(c: &mut Checker, draft: &ConsentDraft) -> Option<Consent> {
    let tcpa = c.flag("consent.tcpa", draft.tcpa.as_ref());
    let privacy_policy = c.flag("consent.privacy_policy", draft.privacy_policy.as_ref());
    if tcpa == Some(false) {
        c.push("consent.tcpa", "must be accepted before an agent can contact you");
    }
    if privacy_policy == Some(false) {
        c.push("consent.privacy_policy", "must be accepted");
    }
    match (tcpa?, privacy_policy?) {
        (true, true) => Some(Consent {
            tcpa: true,
            privacy_policy: true,
        }),
        _ => None,
    }
}

fn check_attribution(c: &mut Checker, draft: &AttributionDraft) -> Option<Attribution> {
    let mut field = |name: &str, raw: Option<&String>| {
        c.optional_text(name, raw, ATTRIBUTION_MAX_LEN)
    };
    let landing_page = field("attribution.landing_page", draft.landing_page.as_ref());
    let utm_source = field("attribution.utm_source", draft.utm_source.as_ref());
    let utm_medium = field("attribution.utm_medium", draft.utm_medium.as_ref());
    let utm_campaign = field("attribution.utm_campaign", draft.utm_campaign.as_ref());
    let referrer = field("attribution.referrer", draft.referrer.as_ref());
    Some(Attribution {
        landing_page: landing_page?,
        utm_source: utm_source?,
        utm_medium: utm_medium?,
        utm_campaign: utm_campaign?,
        referrer: referrer?,
    })
}

fn check_product(c: &mut Checker, raw: Option<&String>) -> Option<ProductLine> {
    let value = c.required("product", raw)?;
    let product = ProductLine::parse(value);
    if product.is_none() {
        c.push("product", format!("unsupported product line `{value}`"));
    }
    product
}

/// Validates a complete quote form and reports every failing field.
pub fn validate_lead(
    draft: &LeadDraft,
    ctx: &ValidationContext,
) -> Result<ValidatedLead, ValidationErrors> {
    let mut c = Checker::new();
    let product = check_product(&mut c, draft.product.as_ref());
    let contact = check_contact(&mut c, &draft.contact, product, ctx);
    let dob = match &contact {
        Some(info) => info.date_of_birth,
        // Fall back to the raw value so detail rules still see the birth
        // date when an unrelated contact field failed.
        None => draft
            .contact
            .date_of_birth
            .as_deref()
            .and_then(|raw| parse_date_of_birth(raw.trim(), ctx.today).ok()),
    };
    let details = product.and_then(|p| check_details(&mut c, p, &draft.details, dob, ctx));
    let consent = check_consent(&mut c, &draft.consent);
    let attribution = check_attribution(&mut c, &draft.attribution);
    let notes = c.optional_text("notes", draft.notes.as_ref(), NOTES_MAX_LEN);

    let errors = c.finish();
    let validated = (|| {
        Some(ValidatedLead {
            product: product?,
            contact: contact?,
            details: details?,
            consent: consent?,
            attribution: attribution?,
            notes: notes?,
        })
    })();
    match validated {
        Some(lead) if errors.is_empty() => Ok(lead),
        _ => Err(errors),
    }
}

/// Checks only the fields of one form step. The draft is expected to carry
/// everything entered on earlier steps.
pub fn validate_step(
    draft: &LeadDraft,
    step: FormStep,
    ctx: &ValidationContext,
) -> Result<(), ValidationErrors> {
    match validate_lead(draft, ctx) {
        Ok(_) => Ok(()),
        Err(errors) => {
            let scoped = errors.retain_step(step);
            if scoped.is_empty() {
                Ok(())
            } else {
                Err(scoped)
            }
        }
    }
}

pub fn validate_contact_message(
    draft: &ContactMessageDraft,
) -> Result<ValidatedContact, ValidationErrors> {
    let mut c = Checker::new();
    let name = c
        .text("name", draft.name.as_ref(), CONTACT_NAME_MAX_LEN)
        .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "));
    if name.as_deref().is_some_and(|n| !n.chars().any(char::is_alphabetic)) {
        c.push("name", "must contain a letter");
    }
    let email = c.parsed("email", draft.email.as_ref(), EmailAddress::parse);
    let phone = c.optional_parsed("phone", draft.phone.as_ref(), PhoneNumber::parse);
    let subject = c.optional_text("subject", draft.subject.as_ref(), SUBJECT_MAX_LEN);
    let message = c.text("message", draft.message.as_ref(), MESSAGE_MAX_LEN);

    let errors = c.finish();
    let validated = (|| {
        Some(ValidatedContact {
            name: name?,
            email: email?,
            phone: phone?,
            subject: subject?,
            message: message?,
        })
    })();
    match validated {
        Some(contact) if errors.is_empty() => Ok(contact),
        _ => Err(errors),
    }
}
