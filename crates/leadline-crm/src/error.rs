// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CrmErrorCode {
    Auth,
    Network,
    Timeout,
    Rejected,
    Config,
    Internal,
}

impl CrmErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Rejected => "rejected",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmError {
    pub code: CrmErrorCode,
    pub message: String,
}

impl CrmError {
    #[must_use]
    pub fn new(code: CrmErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Failures where the CRM never judged the record: a mock receipt may
    /// stand in for it. A rejection is the CRM's answer and is never masked.
    #[must_use]
    pub const fn is_fallback_eligible(&self) -> bool {
        matches!(
            self.code,
            CrmErrorCode::Auth | CrmErrorCode::Network | CrmErrorCode::Timeout
        )
    }

    pub(crate) fn from_transport(context: &str, err: &reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            CrmErrorCode::Timeout
        } else {
            CrmErrorCode::Network
        };
        Self::new(code, format!("{context}: {err}"))
    }
}

impl Display for CrmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CrmError {}
