//! Loading and saving grade ledgers against the grading service.
//!
//! Saving is two requests, not a transaction: the properties are written
//! first, then the submission is marked as manually graded. A failure of the
//! second step is reported as [`SyncError::StatusUpdate`] and leaves the saved
//! properties in place. Nothing is retried.

use thiserror::Error;

use crate::client::{ClientError, GradingClient};
use crate::models::{GradeLedger, ManualStatus, SessionContext, SubmissionKey};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("'{username}' is not allowed to grade lecture {lecture_id}")]
    PermissionDenied { username: String, lecture_id: u64 },

    #[error("failed to reach the grading service: {0}")]
    Fetch(#[source] ClientError),

    #[error("malformed grading properties: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("scores were saved but the submission could not be marked as graded: {0}")]
    StatusUpdate(#[source] ClientError),
}

impl SyncError {
    /// Whether the properties reached the service even though the call failed.
    pub fn properties_saved(&self) -> bool {
        matches!(self, Self::StatusUpdate(_))
    }
}

/// Loads and saves grade ledgers on behalf of one session.
#[derive(Debug, Clone)]
pub struct LedgerSync {
    client: GradingClient,
    context: SessionContext,
}

impl LedgerSync {
    pub fn new(client: GradingClient, context: SessionContext) -> Self {
        Self { client, context }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn client(&self) -> &GradingClient {
        &self.client
    }

    fn authorize(&self, key: &SubmissionKey) -> Result<(), SyncError> {
        if self.context.can_grade(key.lecture_id) {
            Ok(())
        } else {
            tracing::warn!(
                "{} denied grading access to lecture {}",
                self.context.username,
                key.lecture_id
            );
            Err(SyncError::PermissionDenied {
                username: self.context.username.clone(),
                lecture_id: key.lecture_id,
            })
        }
    }

    /// Fetch the properties payload of a submission and parse it.
    pub async fn load(&self, key: &SubmissionKey) -> Result<GradeLedger, SyncError> {
        self.authorize(key)?;

        let payload = self
            .client
            .get_properties(key)
            .await
            .map_err(SyncError::Fetch)?;
        let ledger = GradeLedger::from_json(&payload)?;

        tracing::info!(
            "Loaded grade ledger for submission {} ({} notebooks)",
            key,
            ledger.notebooks().count()
        );
        Ok(ledger)
    }

    /// Write the ledger back and mark the submission as manually graded.
    pub async fn save(&self, key: &SubmissionKey, ledger: &GradeLedger) -> Result<(), SyncError> {
        self.authorize(key)?;

        let payload = ledger.to_value()?;
        self.client
            .update_properties(key, &payload)
            .await
            .map_err(SyncError::Fetch)?;
        tracing::info!("Saved grade ledger for submission {}", key);

        if let Err(e) = self.mark_manually_graded(key).await {
            tracing::warn!(
                "Grades for submission {} saved, but status update failed: {}",
                key,
                e
            );
            return Err(SyncError::StatusUpdate(e));
        }
        Ok(())
    }

    async fn mark_manually_graded(&self, key: &SubmissionKey) -> Result<(), ClientError> {
        let mut submission = self.client.get_submission(key).await?;
        submission.manual_status = ManualStatus::ManuallyGraded;
        self.client.update_submission(key, &submission).await?;
        tracing::info!(
            "Submission {} marked {}",
            key,
            ManualStatus::ManuallyGraded.as_str()
        );
        Ok(())
    }
}
