//! Final submission sink.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::SubmitError;
use crate::types::ContactDraft;

pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn issue() -> Self {
        Self {
            submission_id: Uuid::now_v7(),
            submitted_at: Utc::now(),
        }
    }
}

/// Accepts a completed draft. No retry contract: a failure is reported once
/// and the caller decides whether to resubmit.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, draft: &ContactDraft) -> Result<SubmissionReceipt, SubmitError>;
}

/// Stand-in sink: waits `delay`, then accepts. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct SimulatedSink {
    delay: Duration,
}

impl SimulatedSink {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedSink {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_DELAY)
    }
}

#[async_trait]
impl SubmissionSink for SimulatedSink {
    async fn submit(&self, draft: &ContactDraft) -> Result<SubmissionReceipt, SubmitError> {
        tokio::time::sleep(self.delay).await;
        let receipt = SubmissionReceipt::issue();
        tracing::info!(
            submission_id = %receipt.submission_id,
            email = %draft.email,
            "contact request accepted"
        );
        Ok(receipt)
    }
}
