// SPDX-License-Identifier: Apache-2.0

use crate::contact::{ContactInfo, EmailAddress, PhoneNumber, ValidationError};
use crate::details::ProductDetails;
use crate::product::ProductLine;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const LEAD_ID_HEX_LEN: usize = 20;

/// `lead-<20 hex>` for quotes, `contact-<20 hex>` for contact messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeadId(String);

impl LeadId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let (prefix, hex) = input
            .split_once('-')
            .ok_or_else(|| ValidationError("lead id must be <kind>-<hex>".to_string()))?;
        if !matches!(prefix, "lead" | "contact") {
            return Err(ValidationError(format!("unknown lead id kind `{prefix}`")));
        }
        if hex.len() != LEAD_ID_HEX_LEN
            || !hex
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(ValidationError(format!(
                "lead id must end in {LEAD_ID_HEX_LEN} lowercase hex characters"
            )));
        }
        Ok(Self(input.to_string()))
    }

    pub(crate) fn derive(kind: SubmissionKind, digest_hex: &str) -> Self {
        let hex: String = digest_hex.chars().take(LEAD_ID_HEX_LEN).collect();
        Self(format!("{}-{hex}", kind.id_prefix()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LeadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<LeadId> for String {
    fn from(value: LeadId) -> Self {
        value.0
    }
}

impl TryFrom<String> for LeadId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Consent {
    pub tcpa: bool,
    pub privacy_policy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lead {
    pub id: LeadId,
    pub received_at_ms: u64,
    pub product: ProductLine,
    pub contact: ContactInfo,
    pub details: ProductDetails,
    pub consent: Consent,
    #[serde(default)]
    pub attribution: Attribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactMessage {
    pub id: LeadId,
    pub received_at_ms: u64,
    pub name: String,
    pub email: EmailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    /// Splits the single name field into CRM first/last name; a single word
    /// is treated as the last name.
    #[must_use]
    pub fn split_name(&self) -> (Option<&str>, &str) {
        match self.name.rsplit_once(' ') {
            Some((first, last)) => (Some(first), last),
            None => (None, self.name.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Quote,
    Contact,
}

impl SubmissionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Contact => "contact",
        }
    }

    const fn id_prefix(self) -> &'static str {
        match self {
            Self::Quote => "lead",
            Self::Contact => "contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Submission {
    Quote(Lead),
    Contact(ContactMessage),
}

impl Submission {
    #[must_use]
    pub fn id(&self) -> &LeadId {
        match self {
            Self::Quote(lead) => &lead.id,
            Self::Contact(msg) => &msg.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SubmissionKind {
        match self {
            Self::Quote(_) => SubmissionKind::Quote,
            Self::Contact(_) => SubmissionKind::Contact,
        }
    }

    #[must_use]
    pub fn received_at_ms(&self) -> u64 {
        match self {
            Self::Quote(lead) => lead.received_at_ms,
            Self::Contact(msg) => msg.received_at_ms,
        }
    }

    #[must_use]
    pub fn product(&self) -> Option<ProductLine> {
        match self {
            Self::Quote(lead) => Some(lead.product),
            Self::Contact(_) => None,
        }
    }

    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        match self {
            Self::Quote(lead) => &lead.contact.email,
            Self::Contact(msg) => &msg.email,
        }
    }
}
