// SPDX-License-Identifier: Apache-2.0

use crate::config::{CrmConfig, CrmMode};
use crate::error::{CrmError, CrmErrorCode};
use crate::mock::MockSink;
use crate::sink::{LeadSink, SinkReceipt};
use leadline_core::redact::mask_email;
use leadline_model::Submission;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const CIRCUIT_OPEN_REASON: &str = "crm circuit open";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub open_duration: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
        }
    }
}

impl From<&CrmConfig> for BreakerConfig {
    fn from(cfg: &CrmConfig) -> Self {
        Self {
            failure_threshold: cfg.breaker_failure_threshold,
            open_duration: cfg.breaker_open_duration,
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    open_until: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResult {
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Why a mock receipt stood in for the CRM; a bounded label for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackCause {
    CircuitOpen,
    Failure(CrmErrorCode),
}

impl FallbackCause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CircuitOpen => "circuit_open",
            Self::Failure(code) => code.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub crm: SinkReceipt,
    pub fallback: Option<FallbackCause>,
    pub relay: Option<RelayResult>,
}

/// Routes submissions to the CRM, substituting mock receipts according to
/// [`CrmMode`], then fans out to the relay.
pub struct LeadDispatcher {
    primary: Arc<dyn LeadSink>,
    mock: MockSink,
    relay: Option<Arc<dyn LeadSink>>,
    mode: CrmMode,
    breaker_cfg: BreakerConfig,
    breaker: Mutex<BreakerState>,
    crm_deadline: Option<Duration>,
}

impl LeadDispatcher {
    #[must_use]
    pub fn new(primary: Arc<dyn LeadSink>, mode: CrmMode, breaker_cfg: BreakerConfig) -> Self {
        Self {
            primary,
            mock: MockSink,
            relay: None,
            mode,
            breaker_cfg,
            breaker: Mutex::new(BreakerState::default()),
            crm_deadline: None,
        }
    }

    /// A dispatcher that never leaves the process.
    #[must_use]
    pub fn mock_only() -> Self {
        Self::new(Arc::new(MockSink), CrmMode::Mock, BreakerConfig::default())
    }

    #[must_use]
    pub fn with_relay(mut self, relay: Arc<dyn LeadSink>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Bounds each CRM call; an overrun counts as a `timeout` failure and
    /// takes the same fallback and breaker path as any other.
    #[must_use]
    pub fn with_crm_deadline(mut self, deadline: Duration) -> Self {
        self.crm_deadline = Some(deadline);
        self
    }

    #[must_use]
    pub const fn crm_deadline(&self) -> Option<Duration> {
        self.crm_deadline
    }

    #[must_use]
    pub const fn mode(&self) -> CrmMode {
        self.mode
    }

    #[must_use]
    pub fn primary_tag(&self) -> &'static str {
        self.primary.sink_tag()
    }

    #[must_use]
    pub fn has_relay(&self) -> bool {
        self.relay.is_some()
    }

    pub async fn breaker_open(&self) -> bool {
        let lock = self.breaker.lock().await;
        lock.open_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    async fn check_breaker(&self) -> bool {
        let mut lock = self.breaker.lock().await;
        if let Some(until) = lock.open_until {
            if Instant::now() < until {
                return false;
            }
            lock.open_until = None;
            info!("crm circuit half-open; probing");
        }
        true
    }

    async fn record_failure(&self) {
        let mut lock = self.breaker.lock().await;
        lock.failure_count += 1;
        if lock.failure_count >= self.breaker_cfg.failure_threshold {
            lock.open_until = Some(Instant::now() + self.breaker_cfg.open_duration);
            lock.failure_count = 0;
            warn!(
                open_ms = self.breaker_cfg.open_duration.as_millis() as u64,
                "crm circuit opened"
            );
        }
    }

    async fn reset_breaker(&self) {
        let mut lock = self.breaker.lock().await;
        lock.failure_count = 0;
        lock.open_until = None;
    }

    async fn submit_primary(&self, submission: &Submission) -> Result<SinkReceipt, CrmError> {
        let call = self.primary.submit(submission);
        let Some(limit) = self.crm_deadline else {
            return call.await;
        };
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(CrmError::new(
                CrmErrorCode::Timeout,
                format!("crm did not answer within {}ms", limit.as_millis()),
            ))
        })
    }

    async fn dispatch_crm(
        &self,
        submission: &Submission,
    ) -> Result<(SinkReceipt, Option<FallbackCause>), CrmError> {
        if self.mode == CrmMode::Mock {
            return Ok((self.mock.submit(submission).await?, None));
        }
        if !self.check_breaker().await {
            if self.mode == CrmMode::Live {
                return Err(CrmError::new(CrmErrorCode::Network, CIRCUIT_OPEN_REASON));
            }
            let receipt = MockSink::receipt(submission, Some(CIRCUIT_OPEN_REASON.to_string()));
            return Ok((receipt, Some(FallbackCause::CircuitOpen)));
        }
        match self.submit_primary(submission).await {
            Ok(receipt) => {
                self.reset_breaker().await;
                Ok((receipt, None))
            }
            Err(err) if err.is_fallback_eligible() => {
                self.record_failure().await;
                if self.mode == CrmMode::Live {
                    return Err(err);
                }
                warn!(
                    sink = self.primary.sink_tag(),
                    code = err.code.as_str(),
                    error = %err,
                    "crm unavailable; answering with mock receipt"
                );
                let receipt = MockSink::receipt(submission, Some(err.to_string()));
                Ok((receipt, Some(FallbackCause::Failure(err.code))))
            }
            Err(err) => Err(err),
        }
    }

    async fn dispatch_relay(&self, submission: &Submission) -> Option<RelayResult> {
        let relay = self.relay.as_ref()?;
        Some(match relay.submit(submission).await {
            Ok(_) => RelayResult {
                delivered: true,
                error: None,
            },
            Err(err) => {
                warn!(sink = relay.sink_tag(), error = %err, "relay delivery failed");
                RelayResult {
                    delivered: false,
                    error: Some(err.to_string()),
                }
            }
        })
    }

    pub async fn dispatch(&self, submission: &Submission) -> Result<DispatchOutcome, CrmError> {
        let (crm, fallback) = self.dispatch_crm(submission).await?;
        let relay = self.dispatch_relay(submission).await;
        info!(
            submission_id = %submission.id(),
            kind = submission.kind().as_str(),
            email = %mask_email(submission.email().as_str()),
            mode = crm.mode.as_str(),
            "submission dispatched"
        );
        Ok(DispatchOutcome {
            crm,
            fallback,
            relay,
        })
    }
}
