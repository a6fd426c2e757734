//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::model::{QuestionId, SessionStateError};
use storage::repository::StorageError;

use crate::oracle::OracleError;

/// Errors emitted by `InterviewService`.
///
/// All variants are recoverable from the caller's perspective; none should
/// bring a process down. `Invariant` indicates a bug or a corrupted log and
/// is logged loudly before being surfaced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterviewError {
    #[error("session not found")]
    SessionNotFound,

    #[error("session is already completed")]
    SessionCompleted,

    #[error("session is still in progress")]
    SessionInProgress,

    #[error("submitted question {submitted} is not the current question {current}")]
    StaleQuestion {
        submitted: QuestionId,
        current: QuestionId,
    },

    #[error("question {0} already has a recorded answer")]
    AlreadyAnswered(QuestionId),

    #[error("no pending question; resume the session to continue")]
    NoCurrentQuestion,

    #[error("question generation failed")]
    OracleUnavailable(#[source] OracleError),

    #[error("answer scoring failed")]
    ScoringFailed(#[source] OracleError),

    #[error("interview invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Session(#[from] SessionStateError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl InterviewError {
    /// True for errors a client fixes by re-fetching the current question
    /// and retrying, as opposed to genuine failures.
    #[must_use]
    pub fn is_stale_client_state(&self) -> bool {
        matches!(
            self,
            InterviewError::StaleQuestion { .. } | InterviewError::AlreadyAnswered(_)
        )
    }
}
