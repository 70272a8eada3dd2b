// SPDX-License-Identifier: Apache-2.0

use crate::error::CrmError;
use crate::sink::{LeadSink, SinkMode, SinkReceipt};
use async_trait::async_trait;
use leadline_model::Submission;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Synthetic success used in local development and as the fallback when
/// the CRM cannot be reached.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSink;

impl MockSink {
    #[must_use]
    pub fn receipt(submission: &Submission, fallback_reason: Option<String>) -> SinkReceipt {
        SinkReceipt {
            mode: SinkMode::Mock,
            record_id: format!("mock-{}", submission.id()),
            fallback_reason,
        }
    }
}

#[async_trait]
impl LeadSink for MockSink {
    fn sink_tag(&self) -> &'static str {
        "mock"
    }

    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, CrmError> {
        Ok(Self::receipt(submission, None))
    }
}

/// In-memory sink for tests: records every submission and replays scripted
/// failures in order.
#[derive(Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<Submission>>,
    failures: Mutex<VecDeque<CrmError>>,
    always_fail: Mutex<Option<CrmError>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next(&self, err: CrmError) {
        self.failures.lock().await.push_back(err);
    }

    pub async fn fail_always(&self, err: CrmError) {
        *self.always_fail.lock().await = Some(err);
    }

    pub async fn recover(&self) {
        *self.always_fail.lock().await = None;
        self.failures.lock().await.clear();
    }

    pub async fn submitted(&self) -> Vec<Submission> {
        self.submitted.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.submitted.lock().await.len()
    }
}

#[async_trait]
impl LeadSink for RecordingSink {
    fn sink_tag(&self) -> &'static str {
        "recording"
    }

    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, CrmError> {
        self.submitted.lock().await.push(submission.clone());
        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }
        if let Some(err) = self.always_fail.lock().await.clone() {
            return Err(err);
        }
        Ok(SinkReceipt::live(format!("rec-{}", submission.id())))
    }
}
