// SPDX-License-Identifier: Apache-2.0

use crate::error::CrmError;
use async_trait::async_trait;
use leadline_model::Submission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    Live,
    Mock,
}

impl SinkMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReceipt {
    pub mode: SinkMode,
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl SinkReceipt {
    #[must_use]
    pub fn live(record_id: impl Into<String>) -> Self {
        Self {
            mode: SinkMode::Live,
            record_id: record_id.into(),
            fallback_reason: None,
        }
    }
}

/// A destination for accepted submissions.
#[async_trait]
pub trait LeadSink: Send + Sync + 'static {
    fn sink_tag(&self) -> &'static str {
        "unknown"
    }

    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, CrmError>;
}
