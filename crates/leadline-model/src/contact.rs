// SPDX-License-Identifier: Apache-2.0

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const NAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 254;

pub const US_STATE_CODES: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH", "NJ",
    "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA",
    "WI", "WV", "WY",
];

fn email_local_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+$").ok())
        .as_ref()
}

fn zip_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{5}(-\d{4})?$").ok())
        .as_ref()
}

macro_rules! impl_string_newtype {
    ($name:ident) => {
        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.split_whitespace().collect::<Vec<_>>().join(" ");
        if s.is_empty() {
            return Err(ValidationError("is required".to_string()));
        }
        if s.chars().count() > NAME_MAX_LEN {
            return Err(ValidationError(format!(
                "must be at most {NAME_MAX_LEN} characters"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '-' | '.'))
        {
            return Err(ValidationError(
                "may only contain letters, spaces, apostrophes, hyphens and periods".to_string(),
            ));
        }
        if !s.chars().any(char::is_alphabetic) {
            return Err(ValidationError("must contain a letter".to_string()));
        }
        Ok(Self(s))
    }
}

impl_string_newtype!(PersonName);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("is required".to_string()));
        }
        if s.len() > EMAIL_MAX_LEN {
            return Err(ValidationError(format!(
                "must be at most {EMAIL_MAX_LEN} characters"
            )));
        }
        let invalid = || ValidationError("must be a valid email address".to_string());
        let (local, domain) = s.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || !email_local_re().is_some_and(|re| re.is_match(local))
        {
            return Err(invalid());
        }
        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return Err(invalid());
        }
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 {
            return Err(invalid());
        }
        for label in &labels {
            if label.is_empty()
                || label.starts_with('-')
                || label.ends_with('-')
                || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(invalid());
            }
        }
        let tld = labels.last().copied().unwrap_or_default();
        if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, d)| d)
    }
}

impl_string_newtype!(EmailAddress);

/// North American number stored as ten digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("is required".to_string()));
        }
        let invalid = || ValidationError("must be a valid 10-digit US phone number".to_string());
        let (has_plus, rest) = match s.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if !rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '(' | ')' | '-' | '.' | ' '))
        {
            return Err(invalid());
        }
        let mut digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        if has_plus && !digits.starts_with('1') {
            return Err(invalid());
        }
        if digits.len() == 11 && digits.starts_with('1') {
            digits.remove(0);
        }
        if digits.len() != 10 {
            return Err(invalid());
        }
        let bytes = digits.as_bytes();
        if bytes[0] < b'2' || bytes[3] < b'2' {
            return Err(invalid());
        }
        Ok(Self(digits))
    }

    #[must_use]
    pub fn e164(&self) -> String {
        format!("+1{}", self.0)
    }

    /// `(415) 555-0134`
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("({}) {}-{}", &self.0[..3], &self.0[3..6], &self.0[6..])
    }
}

impl_string_newtype!(PhoneNumber);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("is required".to_string()));
        }
        if !zip_re().is_some_and(|re| re.is_match(s)) {
            return Err(ValidationError(
                "must be a 5-digit ZIP code (optionally ZIP+4)".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn zip5(&self) -> &str {
        &self.0[..5]
    }
}

impl_string_newtype!(ZipCode);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsState(String);

impl UsState {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim().to_ascii_uppercase();
        if US_STATE_CODES.binary_search(&s.as_str()).is_err() {
            return Err(ValidationError(
                "must be a two-letter US state code".to_string(),
            ));
        }
        Ok(Self(s))
    }
}

impl_string_newtype!(UsState);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactInfo {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub zip_code: ZipCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<UsState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<chrono::NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_are_sorted_for_binary_search() {
        let mut sorted = US_STATE_CODES;
        sorted.sort_unstable();
        assert_eq!(sorted, US_STATE_CODES);
    }

    #[test]
    fn phone_accepts_common_us_formats() {
        for raw in [
            "4155550134",
            "(415) 555-0134",
            "415.555.0134",
            "+1 415 555 0134",
            "1-415-555-0134",
        ] {
            let phone = PhoneNumber::parse(raw).expect(raw);
            assert_eq!(phone.as_str(), "4155550134");
            assert_eq!(phone.e164(), "+14155550134");
            assert_eq!(phone.formatted(), "(415) 555-0134");
        }
    }

    #[test]
    fn phone_rejects_invalid_area_codes_and_lengths() {
        for raw in ["0155550134", "4151550134", "415555013", "+44 20 7946 0958", "415-555-01a4"] {
            assert!(PhoneNumber::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn email_is_lowercased_and_checked() {
        let email = EmailAddress::parse(" Jane.Doe@Example.COM ").expect("email");
        assert_eq!(email.as_str(), "jane.doe@example.com");
        assert_eq!(email.domain(), "example.com");
        for raw in [
            "jane",
            "jane@",
            "@example.com",
            "jane@example",
            "jane..doe@example.com",
            "jane@-example.com",
            "jane@example.c0m",
        ] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn names_collapse_whitespace_and_reject_digits() {
        assert_eq!(
            PersonName::parse("  Mary   Ann ").expect("name").as_str(),
            "Mary Ann"
        );
        assert!(PersonName::parse("O'Neil-Smith").is_ok());
        assert!(PersonName::parse("R2D2").is_err());
        assert!(PersonName::parse("--").is_err());
        assert!(PersonName::parse(&"a".repeat(51)).is_err());
    }

    #[test]
    fn zip_and_state_parse() {
        assert_eq!(ZipCode::parse("94107-1234").expect("zip").zip5(), "94107");
        assert!(ZipCode::parse("9410").is_err());
        assert_eq!(UsState::parse("ca").expect("state").as_str(), "CA");
        assert!(UsState::parse("XX").is_err());
    }

    #[test]
    fn serde_revalidates_on_deserialize() {
        let err = serde_json::from_str::<PhoneNumber>("\"123\"");
        assert!(err.is_err());
        let ok: PhoneNumber = serde_json::from_str("\"4155550134\"").expect("phone");
        assert_eq!(ok.as_str(), "4155550134");
    }
}
